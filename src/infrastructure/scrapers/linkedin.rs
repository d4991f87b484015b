// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Company, Job, JobSource};
use crate::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use crate::domain::scraping::scraper::{JobScraper, ScrapeTimeouts, ScraperError};
use crate::engines::traits::PageFetcher;
use crate::infrastructure::scrapers::common::{
    collect_cards, fetch_with_fallback, finish_scrape, require_job, set_description,
    set_location, set_salary, set_url, PageAttempt,
};
use crate::infrastructure::scrapers::extract::{capture_id, SelectorChain};
use crate::utils::normalize::dates::days;
use crate::utils::normalize::{employment_type, parse_posted_date, posted_within_bucket};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::form_urlencoded;
use url::Url;

const SOURCE: JobSource = JobSource::LinkedIn;
const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search";
const GUEST_SEARCH_URL: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

const RESULTS_WAIT: &str = ".jobs-search__results-list";
const GUEST_RESULTS_WAIT: &str = ".base-search-card";
const DETAIL_WAIT: &str = ".job-view-layout";
const DETAIL_FALLBACK_WAIT: &str = ".top-card-layout";

/// `f_TPR` 支持的时间窗口
const POSTED_BUCKETS: [(Duration, &str); 3] = [
    (days(1), "r86400"),
    (days(7), "r604800"),
    (days(30), "r2592000"),
];

static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://www.linkedin.com").unwrap());
static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/view/(?:[^/?]*-)?(\d+)").unwrap());

struct LinkedInSelectors {
    cards: SelectorChain,
    title: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    link: SelectorChain,
    posted: SelectorChain,
    salary: SelectorChain,
    detail_title: SelectorChain,
    detail_company: SelectorChain,
    detail_location: SelectorChain,
    detail_description: SelectorChain,
    detail_insights: SelectorChain,
    detail_posted: SelectorChain,
}

impl LinkedInSelectors {
    fn new() -> Self {
        Self {
            cards: SelectorChain::new(
                "linkedin.cards",
                &[".jobs-search__results-list li", ".job-search-card", ".base-search-card"],
            ),
            title: SelectorChain::new(
                "linkedin.title",
                &[".base-search-card__title", ".job-search-card__title"],
            ),
            company: SelectorChain::new(
                "linkedin.company",
                &[
                    ".base-search-card__subtitle",
                    ".job-search-card__company-name",
                    ".hidden-nested-link",
                ],
            ),
            location: SelectorChain::new(
                "linkedin.location",
                &[".job-search-card__location", ".base-search-card__metadata span"],
            ),
            link: SelectorChain::new(
                "linkedin.link",
                &["a.base-card__full-link", "a.job-search-card__link", "a[href*='/jobs/view/']"],
            ),
            posted: SelectorChain::new(
                "linkedin.posted",
                &["time", ".job-search-card__listdate", ".job-search-card__listdate--new"],
            ),
            salary: SelectorChain::new(
                "linkedin.salary",
                &[".job-search-card__salary-info", ".base-search-card__salary-info"],
            ),
            detail_title: SelectorChain::new(
                "linkedin.detail_title",
                &[
                    ".job-details-jobs-unified-top-card__job-title",
                    "h1.jobs-unified-top-card__job-title",
                    "h1.top-card-layout__title",
                    "h1",
                ],
            ),
            detail_company: SelectorChain::new(
                "linkedin.detail_company",
                &[
                    ".job-details-jobs-unified-top-card__company-name",
                    ".jobs-unified-top-card__company-name",
                    ".topcard__org-name-link",
                ],
            ),
            detail_location: SelectorChain::new(
                "linkedin.detail_location",
                &[
                    ".job-details-jobs-unified-top-card__bullet",
                    ".jobs-unified-top-card__bullet",
                    ".topcard__flavor--bullet",
                ],
            ),
            detail_description: SelectorChain::new(
                "linkedin.detail_description",
                &[".jobs-description__content", ".description__text", ".show-more-less-html__markup"],
            ),
            detail_insights: SelectorChain::new(
                "linkedin.detail_insights",
                &[
                    ".job-details-jobs-unified-top-card__job-insight",
                    ".description__job-criteria-text",
                ],
            ),
            detail_posted: SelectorChain::new(
                "linkedin.detail_posted",
                &[".posted-time-ago__text", ".jobs-unified-top-card__posted-date"],
            ),
        }
    }
}

/// LinkedIn 抓取器
pub struct LinkedInScraper {
    fetcher: Arc<dyn PageFetcher>,
    timeouts: ScrapeTimeouts,
    selectors: LinkedInSelectors,
}

impl LinkedInScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        Self {
            fetcher,
            timeouts,
            selectors: LinkedInSelectors::new(),
        }
    }

    /// 构建搜索 URL
    pub fn build_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params
            .append_pair("keywords", query)
            .append_pair("position", "1")
            .append_pair("pageNum", "0");
        if let Some(location) = options.location_filter() {
            params.append_pair("location", location);
        }
        if options.remote {
            params.append_pair("f_WT", "2");
        }
        if let Some(tpr) = options
            .posted_within
            .and_then(|window| posted_within_bucket(window, &POSTED_BUCKETS))
        {
            params.append_pair("f_TPR", tpr);
        }
        format!("{SEARCH_URL}?{}", params.finish())
    }

    /// 构建游客接口搜索 URL，作为主页面失败时的回退
    pub fn build_guest_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("keywords", query).append_pair("start", "0");
        if let Some(location) = options.location_filter() {
            params.append_pair("location", location);
        }
        format!("{GUEST_SEARCH_URL}?{}", params.finish())
    }

    /// 解析搜索结果页
    pub fn parse_results(&self, html: &str, options: &ScrapeOptions) -> ScrapeResult {
        let document = Html::parse_document(html);
        let mut result = ScrapeResult::begin();

        let cards = self.selectors.cards.select_outermost(document.root_element());
        debug!(count = cards.len(), "Found LinkedIn job cards");

        collect_cards(&mut result, SOURCE, cards, options.max_jobs, |index, card| {
            self.parse_card(index, card)
        });
        result
    }

    fn parse_card(&self, index: usize, card: ElementRef<'_>) -> Result<Job, CardError> {
        let sel = &self.selectors;
        let mut job = require_job(SOURCE, index, sel.title.first_text(card))?;

        set_url(
            &mut job,
            index,
            &BASE_URL,
            sel.link.first_attr(card, "href"),
            true,
            &JOB_ID,
        )?;
        if job.external_id.is_none() {
            job.external_id = card
                .value()
                .attr("data-entity-urn")
                .and_then(|urn| urn.rsplit(':').next())
                .filter(|id| id.chars().all(|c| c.is_ascii_digit()) && !id.is_empty())
                .map(str::to_string);
        }

        if let Some(company) = sel.company.first_text(card) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.location.first_text(card));
        set_salary(&mut job, sel.salary.first_text(card));
        job.posted_at = self.posted_at(card);

        Ok(job)
    }

    /// 优先使用 `<time datetime>`，否则解析相对时间文本
    fn posted_at(&self, card: ElementRef<'_>) -> Option<DateTime<Utc>> {
        let sel = &self.selectors;
        sel.posted
            .first_attr(card, "datetime")
            .and_then(|dt| parse_posted_date(&dt))
            .or_else(|| {
                sel.posted
                    .first_text(card)
                    .and_then(|text| parse_posted_date(&text))
            })
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

        job.url = url.split('?').next().unwrap_or(url).to_string();
        job.external_id = capture_id(&JOB_ID, url);
        if let Some(company) = sel.detail_company.first_text(root) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.detail_location.first_text(root));
        set_description(&mut job, sel.detail_description.first(root));
        job.employment_type = sel
            .detail_insights
            .all_texts(root)
            .iter()
            .find_map(|text| employment_type(text));
        job.posted_at = sel
            .detail_posted
            .first_text(root)
            .and_then(|text| parse_posted_date(&text));

        Ok(job)
    }
}

#[async_trait]
impl JobScraper for LinkedInScraper {
    fn name(&self) -> &'static str {
        "LinkedIn"
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
        info!(query, url = %url, max_jobs = options.max_jobs, "Starting LinkedIn scrape");

        let attempts = [
            PageAttempt::selector(url.as_str(), RESULTS_WAIT),
            PageAttempt::selector(self.build_guest_search_url(query, options), GUEST_RESULTS_WAIT),
        ];
        let html = fetch_with_fallback(
            self.fetcher.as_ref(),
            SOURCE,
            &attempts,
            None,
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
