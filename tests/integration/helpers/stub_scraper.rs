// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use jobcrawl::domain::models::job::{Job, JobSource};
use jobcrawl::domain::models::scrape::{ScrapeOptions, ScrapeResult};
use jobcrawl::domain::scraping::scraper::{JobScraper, ScraperError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// 返回固定结果的抓取器，用于驱动协调器
pub struct StubScraper {
    source: JobSource,
    urls: Option<Vec<String>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl StubScraper {
    /// 成功返回给定链接对应的职位
    pub fn returning(source: JobSource, urls: &[&str]) -> Self {
        Self {
            source,
            urls: Some(urls.iter().map(|u| u.to_string()).collect()),
            delay: Duration::ZERO,
            calls: Arc::default(),
        }
    }

    /// 总是返回致命错误
    pub fn failing(source: JobSource) -> Self {
        Self {
            source,
            urls: None,
            delay: Duration::ZERO,
            calls: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 每次 `scrape` 开始的时刻，注册前取出句柄
    pub fn calls(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl JobScraper for StubScraper {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn source(&self) -> JobSource {
        self.source
    }

    async fn scrape(
        &self,
        query: &str,
        _options: &ScrapeOptions,
    ) -> Result<ScrapeResult, ScraperError> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let Some(urls) = &self.urls else {
            return Err(ScraperError::Parse {
                job_source: self.source,
                url: format!("https://{}.example/search", self.source),
                reason: "results list missing".to_string(),
            });
        };

        let mut result = ScrapeResult::begin();
        result.total = urls.len();
        for url in urls {
            let mut job = Job::new(self.source, format!("{query} engineer")).unwrap();
            job.url = url.clone();
            result.push_job(job);
        }
        Ok(result.finish())
    }

    async fn scrape_job(&self, url: &str) -> Result<Job, ScraperError> {
        Err(ScraperError::Parse {
            job_source: self.source,
            url: url.to_string(),
            reason: "not supported".to_string(),
        })
    }
}
