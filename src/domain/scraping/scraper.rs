// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobSource};
use crate::domain::models::scrape::{ScrapeOptions, ScrapeResult};
use crate::engines::traits::BrowserError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 默认搜索结果页超时
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(120);
/// 默认详情页超时
pub const DEFAULT_DETAIL_TIMEOUT: Duration = Duration::from_secs(30);

/// 抓取器致命错误
///
/// 仅当整个页面无法获取或解析时返回；单张卡片的问题记录在
/// [`ScrapeResult::errors`] 中。
#[derive(Error, Debug)]
pub enum ScraperError {
    /// 页面获取失败（所有回退选择器均未命中）
    #[error("{job_source}: failed to fetch {url}: {cause}")]
    Fetch {
        job_source: JobSource,
        url: String,
        #[source]
        cause: BrowserError,
    },

    /// 超过截止时间
    #[error("{job_source}: fetching {url} timed out after {after:?}")]
    Timeout {
        job_source: JobSource,
        url: String,
        after: Duration,
    },

    /// 页面已获取但无法解析出有效内容
    #[error("{job_source}: could not parse {url}: {reason}")]
    Parse {
        job_source: JobSource,
        url: String,
        reason: String,
    },
}

impl ScraperError {
    /// 出错的来源
    pub fn job_source(&self) -> JobSource {
        match self {
            ScraperError::Fetch { job_source, .. }
            | ScraperError::Timeout { job_source, .. }
            | ScraperError::Parse { job_source, .. } => *job_source,
        }
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ScraperError::Timeout { .. }
                | ScraperError::Fetch {
                    cause: BrowserError::Timeout(_),
                    ..
                }
        )
    }
}

/// 按用途区分的超时配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeTimeouts {
    /// 搜索结果页（容忍较慢的反爬挑战页）
    pub search: Duration,
    /// 单个职位详情页
    pub detail: Duration,
}

impl Default for ScrapeTimeouts {
    fn default() -> Self {
        Self {
            search: DEFAULT_SEARCH_TIMEOUT,
            detail: DEFAULT_DETAIL_TIMEOUT,
        }
    }
}

/// 职位抓取器特质
///
/// 每个招聘网站实现一次，注册到 `ScraperRegistry` 后由编排层按来源调度。
#[async_trait]
pub trait JobScraper: Send + Sync {
    /// 可读的来源名称（日志 / 界面）
    fn name(&self) -> &'static str;

    /// 规范来源，作为注册表键并写入每个职位
    fn source(&self) -> JobSource;

    /// 关键词搜索并列出职位
    async fn scrape(
        &self,
        query: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResult, ScraperError>;

    /// 获取并解析单个职位详情页
    async fn scrape_job(&self, url: &str) -> Result<Job, ScraperError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let err = ScraperError::Fetch {
            job_source: JobSource::Dice,
            url: "https://www.dice.com/jobs".into(),
            cause: BrowserError::Timeout(Duration::from_secs(5)),
        };
        assert!(err.is_timeout());
        assert_eq!(err.job_source(), JobSource::Dice);

        let err = ScraperError::Parse {
            job_source: JobSource::Indeed,
            url: "u".into(),
            reason: "no title".into(),
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().starts_with("indeed:"));
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = ScrapeTimeouts::default();
        assert!(timeouts.search > timeouts.detail);
    }
}
