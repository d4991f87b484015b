// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::scraping::scraper::ScrapeTimeouts;
use crate::engines::browser_pool::BrowserOptions;
use crate::workers::coordinator::CoordinatorConfig;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含浏览器池、抓取和日志配置。优先级从低到高：内置默认值、
/// `config/default`、`config/{APP_ENVIRONMENT}`（或显式指定的文件）、
/// `JOBCRAWL__` 前缀的环境变量（例如 `JOBCRAWL__BROWSER__HEADLESS=false`）。
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 浏览器池配置
    #[serde(default)]
    pub browser: BrowserOptions,
    /// 抓取配置
    pub scraping: ScrapingSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingSettings {
    /// 搜索页获取超时（秒）
    pub search_timeout_secs: u64,
    /// 详情页获取超时（秒）
    pub detail_timeout_secs: u64,
    /// 单个来源的整体超时（秒）
    pub source_timeout_secs: u64,
    /// 同时抓取的来源数
    pub max_concurrency: usize,
    /// 同一来源两次请求的最小间隔（毫秒），0 表示不限速
    pub min_request_interval_ms: u64,
    /// 默认每个来源最多返回的职位数
    pub default_max_jobs: usize,
}

impl ScrapingSettings {
    pub fn timeouts(&self) -> ScrapeTimeouts {
        ScrapeTimeouts {
            search: Duration::from_secs(self.search_timeout_secs),
            detail: Duration::from_secs(self.detail_timeout_secs),
        }
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_concurrency: self.max_concurrency,
            source_timeout: Duration::from_secs(self.source_timeout_secs),
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 默认过滤级别，`RUST_LOG` 存在时以其为准
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从 `config/` 目录和环境变量加载配置，文件不存在时使用默认值
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// 从指定文件加载配置，环境变量仍然可以覆盖文件中的值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Default scraping settings
            .set_default("scraping.search_timeout_secs", 120)?
            .set_default("scraping.detail_timeout_secs", 30)?
            .set_default("scraping.source_timeout_secs", 150)?
            .set_default("scraping.max_concurrency", 3)?
            .set_default("scraping.min_request_interval_ms", 3000)?
            .set_default("scraping.default_max_jobs", 50)?
            // Default logging settings
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")
    }

    fn environment() -> Environment {
        Environment::with_prefix("JOBCRAWL")
            .separator("__")
            .try_parsing(true)
    }
}
