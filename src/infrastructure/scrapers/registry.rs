// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobSource;
use crate::domain::scraping::scraper::{JobScraper, ScrapeTimeouts};
use crate::engines::traits::PageFetcher;
use crate::infrastructure::scrapers::{
    DiceScraper, IndeedScraper, LinkedInScraper, WellfoundScraper, YCombinatorScraper,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 抓取器注册表
///
/// 按来源查找抓取器。启动时填充，之后只读，通过 `Arc` 在调用方之间共享，
/// 读取不需要加锁。
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: BTreeMap<JobSource, Arc<dyn JobScraper>>,
}

impl ScraperRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册所有已实现的来源，共享同一个页面获取器
    pub fn with_default_scrapers(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(IndeedScraper::new(fetcher.clone(), timeouts)));
        registry.register(Arc::new(LinkedInScraper::new(fetcher.clone(), timeouts)));
        registry.register(Arc::new(DiceScraper::new(fetcher.clone(), timeouts)));
        registry.register(Arc::new(WellfoundScraper::new(fetcher.clone(), timeouts)));
        registry.register(Arc::new(YCombinatorScraper::new(fetcher, timeouts)));
        registry
    }

    /// 注册抓取器，同一来源重复注册时替换旧的
    pub fn register(&mut self, scraper: Arc<dyn JobScraper>) {
        let source = scraper.source();
        if self.scrapers.insert(source, scraper).is_some() {
            warn!(source = %source, "Replacing previously registered scraper");
        } else {
            debug!(source = %source, "Registered scraper");
        }
    }

    /// 按来源查找，未注册时返回 `None`
    pub fn get(&self, source: JobSource) -> Option<Arc<dyn JobScraper>> {
        self.scrapers.get(&source).cloned()
    }

    /// 所有抓取器，按来源排序
    pub fn all(&self) -> Vec<Arc<dyn JobScraper>> {
        self.scrapers.values().cloned().collect()
    }

    pub fn sources(&self) -> Vec<JobSource> {
        self.scrapers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}

impl std::fmt::Debug for ScraperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}
