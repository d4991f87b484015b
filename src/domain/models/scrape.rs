// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 默认最大职位数
pub const DEFAULT_MAX_JOBS: usize = 50;

/// 默认发布时间窗口（7 天）
pub const DEFAULT_POSTED_WITHIN: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// 抓取选项
///
/// 描述一次关键词搜索的约束条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    /// 最多返回的职位数
    pub max_jobs: usize,
    /// 地点过滤
    pub location: Option<String>,
    /// 仅远程职位
    pub remote: bool,
    /// 最少工作年限
    pub experience_min: Option<u32>,
    /// 最多工作年限
    pub experience_max: Option<u32>,
    /// 发布时间窗口，`None` 表示不限
    pub posted_within: Option<Duration>,
    /// 是否包含已过期职位
    pub include_expired: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            max_jobs: DEFAULT_MAX_JOBS,
            location: None,
            remote: false,
            experience_min: None,
            experience_max: None,
            posted_within: Some(DEFAULT_POSTED_WITHIN),
            include_expired: false,
        }
    }
}

impl ScrapeOptions {
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.location = if location.trim().is_empty() {
            None
        } else {
            Some(location)
        };
        self
    }

    pub fn remote_only(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_posted_within(mut self, window: Option<Duration>) -> Self {
        self.posted_within = window;
        self
    }

    /// 非空的地点过滤值
    pub fn location_filter(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// 单张职位卡片的非致命解析错误
///
/// 记录在 [`ScrapeResult::errors`] 中，不会中断整次抓取
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardError {
    /// 卡片缺少标题
    #[error("card {index}: no title found")]
    MissingTitle { index: usize },

    /// 卡片链接无法解析
    #[error("card {index}: malformed url {href:?}")]
    InvalidUrl { index: usize, href: String },
}

/// 一次 `scrape` 调用的输出
///
/// 只要结果页被成功获取，结果总会返回；`errors` 非空并不代表失败
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// 解析出的职位
    pub jobs: Vec<Job>,
    /// 页面上看到的卡片总数
    pub total: usize,
    /// 实际产出的职位数
    pub scraped: usize,
    /// 非致命错误
    pub errors: Vec<CardError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScrapeResult {
    /// 以当前时间为起点创建空结果
    pub fn begin() -> Self {
        let now = Utc::now();
        Self {
            jobs: Vec::new(),
            total: 0,
            scraped: 0,
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// 追加一个职位
    pub fn push_job(&mut self, job: Job) {
        self.jobs.push(job);
        self.scraped += 1;
    }

    /// 记录非致命错误
    pub fn push_error(&mut self, error: CardError) {
        self.errors.push(error);
    }

    /// 标记结束时间
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// 抓取耗时
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
