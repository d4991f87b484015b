// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Company, CompanySize, Job, JobSource, LocationType};
use crate::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use crate::domain::scraping::scraper::{JobScraper, ScrapeTimeouts, ScraperError};
use crate::engines::traits::{PageFetcher, ScrollPlan};
use crate::infrastructure::scrapers::common::{
    collect_cards, fetch_with_fallback, finish_scrape, require_job, set_description,
    set_location, set_salary, set_url, PageAttempt,
};
use crate::infrastructure::scrapers::extract::{canonical_url, capture_id, SelectorChain};
use crate::utils::normalize::{collapse_whitespace, company_size_from_stage};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::form_urlencoded;
use url::Url;

const SOURCE: JobSource = JobSource::YCombinator;
const SEARCH_URL: &str = "https://www.workatastartup.com/jobs";

const RESULTS_WAIT: &str =
    "[class*='JobListing'], [class*='job-card'], .job-listing, [data-testid='job-card']";
const RESULTS_FALLBACK_WAIT: &str = "a[href*='/jobs/']";
const DETAIL_WAIT: &str = "[class*='JobDetail'], [class*='job-detail']";
const DETAIL_FALLBACK_WAIT: &str = "main";

/// 列表懒加载：滚动 5 次，每次间隔 500ms
const LIST_SCROLL: ScrollPlan = ScrollPlan {
    times: 5,
    delay: Duration::from_millis(500),
};

static BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://www.workatastartup.com").unwrap());
static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/jobs/(\d+)").unwrap());

struct YCombinatorSelectors {
    cards: SelectorChain,
    link: SelectorChain,
    title: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    remote_badge: SelectorChain,
    salary: SelectorChain,
    stage: SelectorChain,
    logo: SelectorChain,
    snippet: SelectorChain,
    detail_title: SelectorChain,
    detail_company: SelectorChain,
    detail_description: SelectorChain,
    batch: SelectorChain,
    website: SelectorChain,
    industry: SelectorChain,
}

impl YCombinatorSelectors {
    fn new() -> Self {
        Self {
            cards: SelectorChain::new("ycombinator.cards", &[RESULTS_WAIT, RESULTS_FALLBACK_WAIT]),
            link: SelectorChain::new(
                "ycombinator.link",
                &["a[href*='/jobs/']", "a[href*='/company/']"],
            ),
            title: SelectorChain::new(
                "ycombinator.title",
                &["h2", "h3", "[class*='title']", "[class*='Title']", ".job-title", "a"],
            ),
            company: SelectorChain::new(
                "ycombinator.company",
                &[
                    "[class*='company']",
                    "[class*='Company']",
                    "[data-testid='company-name']",
                ],
            ),
            location: SelectorChain::new(
                "ycombinator.location",
                &["[class*='location']", "[class*='Location']"],
            ),
            remote_badge: SelectorChain::new(
                "ycombinator.remote_badge",
                &["[class*='remote']", "[class*='Remote']"],
            ),
            salary: SelectorChain::new(
                "ycombinator.salary",
                &["[class*='salary']", "[class*='Salary']", "[class*='compensation']"],
            ),
            stage: SelectorChain::new(
                "ycombinator.stage",
                &["[class*='stage']", "[class*='Stage']", "[class*='batch']"],
            ),
            logo: SelectorChain::new(
                "ycombinator.logo",
                &["img[src*='logo']", "img[class*='logo']"],
            ),
            snippet: SelectorChain::new(
                "ycombinator.snippet",
                &["[class*='description']", "[class*='Description']", "p"],
            ),
            detail_title: SelectorChain::new(
                "ycombinator.detail_title",
                &["h1", "[class*='title']", "[class*='Title']"],
            ),
            detail_company: SelectorChain::new(
                "ycombinator.detail_company",
                &[
                    "[class*='company-name']",
                    "[class*='CompanyName']",
                    "a[href*='/company/']",
                ],
            ),
            detail_description: SelectorChain::new(
                "ycombinator.detail_description",
                &[
                    "[class*='description']",
                    "[class*='Description']",
                    "[class*='job-content']",
                    "article",
                ],
            ),
            batch: SelectorChain::new(
                "ycombinator.batch",
                &["[class*='batch']", "[class*='Batch']"],
            ),
            website: SelectorChain::new(
                "ycombinator.website",
                &[
                    "a[href*='://'][class*='website']",
                    "a[href*='://']:not([href*='workatastartup'])",
                ],
            ),
            industry: SelectorChain::new(
                "ycombinator.industry",
                &["[class*='industry']", "[class*='Industry']", "[class*='sector']"],
            ),
        }
    }
}

/// Y Combinator（Work at a Startup）抓取器
///
/// 列表是懒加载的，获取时需要先滚动页面。
pub struct YCombinatorScraper {
    fetcher: Arc<dyn PageFetcher>,
    timeouts: ScrapeTimeouts,
    selectors: YCombinatorSelectors,
}

impl YCombinatorScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        Self {
            fetcher,
            timeouts,
            selectors: YCombinatorSelectors::new(),
        }
    }

    /// 构建搜索 URL
    ///
    /// 地点为 "remote" 时与 `remote` 选项等价
    pub fn build_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("query", query);

        let location = options.location_filter();
        let remote = options.remote || location.is_some_and(|l| l.eq_ignore_ascii_case("remote"));
        if remote {
            params.append_pair("remote", "true");
        } else if let Some(location) = location {
            params.append_pair("location", location);
        }
        format!("{SEARCH_URL}?{}", params.finish())
    }

    /// 解析搜索结果页
    ///
    /// 同一职位可能以多张卡片出现，按链接去重后再计数
    pub fn parse_results(&self, html: &str, options: &ScrapeOptions) -> ScrapeResult {
        let document = Html::parse_document(html);
        let mut result = ScrapeResult::begin();

        let mut seen = HashSet::new();
        let cards: Vec<(Option<String>, ElementRef<'_>)> = self
            .selectors
            .cards
            .select_outermost(document.root_element())
            .into_iter()
            .map(|card| (self.card_href(card), card))
            .filter(|(href, _)| href.as_ref().map_or(true, |h| seen.insert(h.clone())))
            .collect();
        debug!(count = cards.len(), "Found Y Combinator job cards");

        collect_cards(
            &mut result,
            SOURCE,
            cards,
            options.max_jobs,
            |index, (href, card)| self.parse_card(index, href, card),
        );
        result
    }

    /// 卡片本身可能就是链接
    fn card_href(&self, card: ElementRef<'_>) -> Option<String> {
        if card.value().name() == "a" {
            card.value()
                .attr("href")
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
        } else {
            self.selectors.link.first_attr(card, "href")
        }
    }

    fn parse_card(
        &self,
        index: usize,
        href: Option<String>,
        card: ElementRef<'_>,
    ) -> Result<Job, CardError> {
        let sel = &self.selectors;
        let title = sel.title.first_text(card).or_else(|| {
            // 卡片本身是链接时标题就是链接文本
            (card.value().name() == "a")
                .then(|| collapse_whitespace(&card.text().collect::<String>()))
                .filter(|t| !t.is_empty())
        });
        let mut job = require_job(SOURCE, index, title)?;

        set_url(&mut job, index, &BASE_URL, href, true, &JOB_ID)?;

        let mut company = Company::named(sel.company.first_text(card).unwrap_or_default());
        company.size = sel
            .stage
            .first_text(card)
            .and_then(|stage| company_size_from_stage(&stage))
            .or(Some(CompanySize::Startup));
        company.logo_url = sel
            .logo
            .first_attr(card, "src")
            .and_then(|src| canonical_url(&BASE_URL, &src, false).ok());
        job.company = company;

        set_location(&mut job, sel.location.first_text(card));
        apply_remote_badge(&mut job, sel.remote_badge.first(card).is_some());
        set_salary(&mut job, sel.salary.first_text(card));
        if let Some(snippet) = sel.snippet.first_text(card) {
            job.description = snippet;
        }

        Ok(job)
    }

    /// 解析职位详情页
    pub fn parse_job_details(&self, html: &str, url: &str) -> Result<Job, ScraperError> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let sel = &self.selectors;

        let mut job = sel
            .detail_title
            .first_text(root)
            .and_then(|title| Job::new(SOURCE, title))
            .ok_or_else(|| ScraperError::Parse {
                job_source: SOURCE,
                url: url.to_string(),
                reason: "no job title on detail page".to_string(),
            })?;

        job.url = url.to_string();
        job.external_id = capture_id(&JOB_ID, url);

        let mut company = Company::named(sel.detail_company.first_text(root).unwrap_or_default());
        company.size = Some(CompanySize::Startup);
        company.logo_url = sel
            .logo
            .first_attr(root, "src")
            .and_then(|src| canonical_url(&BASE_URL, &src, false).ok());
        company.website = sel.website.first_attr(root, "href");
        company.industry = sel.industry.first_text(root);
        job.company = company;

        set_location(&mut job, sel.location.first_text(root));
        apply_remote_badge(&mut job, sel.remote_badge.first(root).is_some());
        set_salary(&mut job, sel.salary.first_text(root));
        set_description(&mut job, sel.detail_description.first(root));
        if let Some(batch) = sel.batch.first_text(root) {
            job.metadata.insert("batch".to_string(), batch);
        }

        Ok(job)
    }
}

/// 远程标记只在地点未表明远程或混合时生效
fn apply_remote_badge(job: &mut Job, has_badge: bool) {
    if has_badge && job.location_type == LocationType::Onsite {
        job.location_type = LocationType::Remote;
    }
}

#[async_trait]
impl JobScraper for YCombinatorScraper {
    fn name(&self) -> &'static str {
        "Y Combinator"
    }

    fn source(&self) -> JobSource {
        SOURCE
    }

    async fn scrape(
        &self,
        query: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResult, ScraperError> {
        let started_at = Utc::now();
        let url = self.build_search_url(query, options);
        info!(query, url = %url, max_jobs = options.max_jobs, "Starting Y Combinator scrape");

        let attempts = [
            PageAttempt::selector(url.as_str(), RESULTS_WAIT),
            PageAttempt::selector(url.as_str(), RESULTS_FALLBACK_WAIT),
        ];
        let html = fetch_with_fallback(
            self.fetcher.as_ref(),
            SOURCE,
            &attempts,
            Some(LIST_SCROLL),
            self.timeouts.search,
        )
        .await?;

        let result = self.parse_results(&html, options);
        Ok(finish_scrape(SOURCE, result, started_at))
    }

    async fn scrape_job(&self, url: &str) -> Result<Job, ScraperError> {
        let attempts = [
            PageAttempt::selector(url, DETAIL_WAIT),
            PageAttempt::selector(url, DETAIL_FALLBACK_WAIT),
        ];
        let html = fetch_with_fallback(
            self.fetcher.as_ref(),
            SOURCE,
            &attempts,
            None,
            self.timeouts.detail,
        )
        .await?;
        self.parse_job_details(&html, url)
    }
}
