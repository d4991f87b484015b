// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobSource};
use crate::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use crate::domain::models::task::{DomainError, ScrapeTask};
use crate::infrastructure::metrics;
use crate::infrastructure::scrapers::ScraperRegistry;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

type SourceLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// 协调器配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// 同时抓取的来源数上限
    pub max_concurrency: usize,
    /// 单个来源的整体超时
    pub source_timeout: Duration,
    /// 同一来源两次请求之间的最小间隔，为零时不限速
    pub min_request_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            source_timeout: Duration::from_secs(150),
            min_request_interval: Duration::from_secs(3),
        }
    }
}

/// 单个来源的抓取结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Completed {
        total: usize,
        scraped: usize,
        errors: Vec<CardError>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    Failed {
        error: String,
    },
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: JobSource,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// 一次多来源抓取的汇总
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub task: ScrapeTask,
    /// 按链接去重后的职位
    pub jobs: Vec<Job>,
    /// 各来源结果，顺序与任务中的来源一致
    pub sources: Vec<SourceReport>,
}

impl ScrapeReport {
    pub fn failed_sources(&self) -> Vec<JobSource> {
        self.sources
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.source)
            .collect()
    }
}

/// 多来源抓取协调器
///
/// 按任务中的来源并发调用已注册的抓取器，每个来源单独超时和限速，
/// 汇总职位并推进任务状态。不做持久化也不重试。
pub struct ScrapeCoordinator {
    registry: Arc<ScraperRegistry>,
    limiters: HashMap<JobSource, Arc<SourceLimiter>>,
    config: CoordinatorConfig,
}

impl ScrapeCoordinator {
    pub fn new(registry: Arc<ScraperRegistry>, config: CoordinatorConfig) -> Self {
        let limiters: HashMap<JobSource, Arc<SourceLimiter>> =
            Quota::with_period(config.min_request_interval)
                .map(|quota| {
                    registry
                        .sources()
                        .into_iter()
                        .map(|source| (source, Arc::new(RateLimiter::direct(quota))))
                        .collect()
                })
                .unwrap_or_default();

        Self {
            registry,
            limiters,
            config,
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    /// 执行抓取任务
    ///
    /// 至少一个来源成功时任务完成，失败来源列在报告中；全部失败时任务失败
    pub async fn run(
        &self,
        task: ScrapeTask,
        options: &ScrapeOptions,
    ) -> Result<ScrapeReport, DomainError> {
        let task = task.start()?;
        let mut options = options.clone();
        if options.location.is_none() {
            options.location = task.location.clone();
        }

        info!(
            task_id = %task.id,
            keywords = %task.keywords,
            sources = ?task.sources,
            "Starting scrape task"
        );

        let query = task.keywords.as_str();
        let options = &options;
        let mut outcomes: Vec<(JobSource, Result<ScrapeResult, String>)> =
            stream::iter(task.sources.iter().copied())
                .map(|source| async move {
                    (source, self.run_source(source, query, options).await)
                })
                .buffer_unordered(self.config.max_concurrency.max(1))
                .collect()
                .await;

        let order: HashMap<JobSource, usize> = task
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| (*source, i))
            .collect();
        outcomes.sort_by_key(|(source, _)| order.get(source).copied().unwrap_or(usize::MAX));

        let mut jobs = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut sources = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for (source, outcome) in outcomes {
            let outcome = match outcome {
                Ok(result) => {
                    for job in result.jobs {
                        if job.url.is_empty() || seen_urls.insert(job.url.clone()) {
                            jobs.push(job);
                        }
                    }
                    SourceOutcome::Completed {
                        total: result.total,
                        scraped: result.scraped,
                        errors: result.errors,
                        started_at: result.started_at,
                        finished_at: result.finished_at,
                    }
                }
                Err(error) => {
                    failures.push(format!("{source}: {error}"));
                    SourceOutcome::Failed { error }
                }
            };
            sources.push(SourceReport { source, outcome });
        }

        let task = if failures.len() == sources.len() {
            error!(task_id = %task.id, "All sources failed");
            task.fail(failures.join("; "))?
        } else {
            if !failures.is_empty() {
                warn!(task_id = %task.id, failed = failures.len(), "Some sources failed");
            }
            task.complete(jobs.len())?
        };

        info!(
            task_id = %task.id,
            status = %task.status,
            jobs = jobs.len(),
            "Scrape task finished"
        );

        Ok(ScrapeReport {
            task,
            jobs,
            sources,
        })
    }

    async fn run_source(
        &self,
        source: JobSource,
        query: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResult, String> {
        let Some(scraper) = self.registry.get(source) else {
            warn!(source = %source, "No scraper registered");
            metrics::record_source_failure(source);
            return Err(format!("no scraper registered for {source}"));
        };

        if let Some(limiter) = self.limiters.get(&source) {
            limiter.until_ready().await;
        }

        let outcome = match tokio::time::timeout(
            self.config.source_timeout,
            scraper.scrape(query, options),
        )
        .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.config.source_timeout)),
        };

        if let Err(e) = &outcome {
            warn!(source = %source, "Source failed: {}", e);
            metrics::record_source_failure(source);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scraping::scraper::ScrapeTimeouts;
    use crate::engines::traits::{BrowserError, FetchRequest, PageFetcher};
    use async_trait::async_trait;

    struct NoFetch;

    #[async_trait]
    impl PageFetcher for NoFetch {
        async fn fetch(&self, _request: &FetchRequest) -> Result<String, BrowserError> {
            Err(BrowserError::PoolClosed)
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    fn registry() -> Arc<ScraperRegistry> {
        Arc::new(ScraperRegistry::with_default_scrapers(
            Arc::new(NoFetch),
            ScrapeTimeouts::default(),
        ))
    }

    #[test]
    fn test_zero_interval_builds_no_limiters() {
        let config = CoordinatorConfig {
            min_request_interval: Duration::ZERO,
            ..Default::default()
        };
        let coordinator = ScrapeCoordinator::new(registry(), config);
        assert!(coordinator.limiters.is_empty());
    }

    #[test]
    fn test_one_limiter_per_registered_source() {
        let registry = registry();
        let coordinator = ScrapeCoordinator::new(registry.clone(), CoordinatorConfig::default());
        assert_eq!(coordinator.limiters.len(), registry.len());
        assert!(registry
            .sources()
            .iter()
            .all(|source| coordinator.limiters.contains_key(source)));
        assert!(!coordinator.limiters.contains_key(&JobSource::BuiltIn));
    }

    #[test]
    fn test_limiter_admits_one_request_per_interval() {
        let coordinator = ScrapeCoordinator::new(registry(), CoordinatorConfig::default());
        let limiter = &coordinator.limiters[&JobSource::Indeed];
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
