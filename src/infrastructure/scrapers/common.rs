// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobSource};
use crate::domain::models::scrape::{CardError, ScrapeResult};
use crate::domain::scraping::scraper::ScraperError;
use crate::engines::traits::{BrowserError, FetchRequest, PageFetcher, ScrollPlan, WaitFor};
use crate::infrastructure::metrics;
use crate::infrastructure::scrapers::extract::{block_text, canonical_url, capture_id};
use crate::utils::normalize::{
    classify_location, clean_description, extract_requirements, parse_salary,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::ElementRef;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// 一次页面获取尝试：URL 加等待条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAttempt {
    pub url: String,
    pub wait: WaitFor,
}

impl PageAttempt {
    pub fn new(url: impl Into<String>, wait: WaitFor) -> Self {
        Self {
            url: url.into(),
            wait,
        }
    }

    /// 等待选择器可见
    pub fn selector(url: impl Into<String>, selector: &str) -> Self {
        Self::new(url, WaitFor::selector(selector))
    }
}

/// 按顺序尝试主选择器和回退选择器获取页面
///
/// 所有尝试共享同一个截止时间，每次尝试分到剩余预算的均等份额；
/// 整体再由 `tokio::time::timeout` 约束，超时返回 [`ScraperError::Timeout`]。
pub async fn fetch_with_fallback(
    fetcher: &dyn PageFetcher,
    job_source: JobSource,
    attempts: &[PageAttempt],
    scroll: Option<ScrollPlan>,
    budget: Duration,
) -> Result<String, ScraperError> {
    let primary_url = attempts
        .first()
        .map(|a| a.url.clone())
        .unwrap_or_default();

    let run = async {
        let deadline = Instant::now() + budget;
        let mut last_error: Option<BrowserError> = None;

        for (index, attempt) in attempts.iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let share = remaining / (attempts.len() - index) as u32;

            let request = FetchRequest {
                url: attempt.url.clone(),
                wait: attempt.wait.clone(),
                timeout: share,
                scroll,
            };

            debug!(
                source = %job_source,
                attempt = index + 1,
                url = %attempt.url,
                wait = ?attempt.wait,
                "Fetching page"
            );

            match fetcher.fetch(&request).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    if index + 1 < attempts.len() {
                        warn!(
                            source = %job_source,
                            url = %attempt.url,
                            "Primary wait failed, trying fallback: {}",
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(ScraperError::Fetch {
            job_source,
            url: primary_url.clone(),
            cause: last_error.unwrap_or(BrowserError::Timeout(budget)),
        })
    };

    tokio::time::timeout(budget, run)
        .await
        .map_err(|_| ScraperError::Timeout {
            job_source,
            url: primary_url.clone(),
            after: budget,
        })?
}

/// 逐张解析卡片并在达到上限时停止
///
/// `total` 记录页面上看到的卡片数；单张卡片失败只记入 `errors`
pub fn collect_cards<T, F>(
    result: &mut ScrapeResult,
    job_source: JobSource,
    cards: Vec<T>,
    max_jobs: usize,
    mut parse: F,
) where
    F: FnMut(usize, T) -> Result<Job, CardError>,
{
    result.total += cards.len();

    for (index, card) in cards.into_iter().enumerate() {
        if result.scraped >= max_jobs {
            debug!(source = %job_source, max_jobs, "Reached max jobs, stopping");
            break;
        }
        match parse(index, card) {
            Ok(job) => result.push_job(job),
            Err(e) => {
                debug!(source = %job_source, "Skipping card: {}", e);
                result.push_error(e);
            }
        }
    }
}

/// 解析卡片标题，缺失时返回 [`CardError::MissingTitle`]
pub fn require_job(
    job_source: JobSource,
    index: usize,
    title: Option<String>,
) -> Result<Job, CardError> {
    title
        .and_then(|t| Job::new(job_source, t))
        .ok_or(CardError::MissingTitle { index })
}

/// 设置职位链接和外部 ID
///
/// 链接缺失时保持空字符串；链接无法解析时返回 [`CardError::InvalidUrl`]
pub fn set_url(
    job: &mut Job,
    index: usize,
    base: &Url,
    href: Option<String>,
    strip_query: bool,
    id_pattern: &Regex,
) -> Result<(), CardError> {
    let Some(href) = href else {
        return Ok(());
    };
    job.url = canonical_url(base, &href, strip_query)
        .map_err(|_| CardError::InvalidUrl { index, href })?;
    job.external_id = capture_id(id_pattern, &job.url);
    Ok(())
}

/// 设置地点文本及其分类
pub fn set_location(job: &mut Job, location: Option<String>) {
    if let Some(location) = location {
        job.location_type = classify_location(&location);
        job.location = location;
    }
}

/// 设置薪资文本及解析结果
pub fn set_salary(job: &mut Job, text: Option<String>) {
    if let Some(text) = text {
        job.salary = parse_salary(&text);
        job.salary_text = Some(text);
    }
}

/// 从描述元素中设置描述和要求列表
pub fn set_description(job: &mut Job, element: Option<ElementRef<'_>>) {
    if let Some(element) = element {
        let raw = block_text(element);
        job.requirements = extract_requirements(&raw);
        job.description = clean_description(&raw);
    }
}

/// 合并显式技能列表和从描述中提取的要求
pub fn merge_requirements(job: &mut Job, skills: Vec<String>) {
    let mut merged = skills;
    for req in std::mem::take(&mut job.requirements) {
        if !merged.iter().any(|s| s.eq_ignore_ascii_case(&req)) {
            merged.push(req);
        }
    }
    merged.truncate(crate::utils::normalize::text::MAX_REQUIREMENTS);
    job.requirements = merged;
}

/// 结束一次搜索：记录结束时间、日志和指标
pub fn finish_scrape(
    job_source: JobSource,
    mut result: ScrapeResult,
    started_at: DateTime<Utc>,
) -> ScrapeResult {
    result.started_at = started_at;
    let result = result.finish();
    info!(
        source = %job_source,
        total = result.total,
        scraped = result.scraped,
        errors = result.errors.len(),
        duration = ?result.duration(),
        "Scrape completed"
    );
    metrics::record_scrape(job_source, &result);
    result
}
