// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Company, Job, JobSource};
use crate::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use crate::domain::scraping::scraper::{JobScraper, ScrapeTimeouts, ScraperError};
use crate::engines::traits::PageFetcher;
use crate::infrastructure::scrapers::common::{
    collect_cards, fetch_with_fallback, finish_scrape, merge_requirements, require_job,
    set_description, set_location, set_salary, set_url, PageAttempt,
};
use crate::infrastructure::scrapers::extract::{capture_id, SelectorChain};
use crate::utils::normalize::dates::days;
use crate::utils::normalize::{employment_type, parse_posted_date, posted_within_bucket};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::form_urlencoded;
use url::Url;

const SOURCE: JobSource = JobSource::Dice;
const SEARCH_URL: &str = "https://www.dice.com/jobs";

const RESULTS_WAIT: &str = "[data-cy='search-card']";
const RESULTS_FALLBACK_WAIT: &str = "dhi-search-card";
const DETAIL_WAIT: &str = "[data-cy='jobDescription']";
const DETAIL_FALLBACK_WAIT: &str = ".job-description";

/// `filters.postedDate` 支持的时间窗口
const POSTED_BUCKETS: [(Duration, &str); 3] =
    [(days(1), "ONE"), (days(3), "THREE"), (days(7), "SEVEN")];

static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://www.dice.com").unwrap());
static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/job-detail/([a-f0-9-]+)").unwrap());

struct DiceSelectors {
    cards: SelectorChain,
    title_link: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    posted: SelectorChain,
    employment: SelectorChain,
    salary: SelectorChain,
    detail_title: SelectorChain,
    detail_company: SelectorChain,
    detail_location: SelectorChain,
    detail_description: SelectorChain,
    detail_skills: SelectorChain,
    detail_employment: SelectorChain,
    detail_salary: SelectorChain,
}

impl DiceSelectors {
    fn new() -> Self {
        Self {
            cards: SelectorChain::new(
                "dice.cards",
                &["[data-cy='search-card']", "dhi-search-card", ".search-card"],
            ),
            title_link: SelectorChain::new(
                "dice.title_link",
                &["[data-cy='card-title-link']", ".card-title-link", "a[href*='/job-detail/']"],
            ),
            company: SelectorChain::new(
                "dice.company",
                &["[data-cy='search-result-company-name']", ".card-company"],
            ),
            location: SelectorChain::new(
                "dice.location",
                &["[data-cy='search-result-location']", ".card-location"],
            ),
            posted: SelectorChain::new(
                "dice.posted",
                &["[data-cy='card-posted-date']", ".posted-date"],
            ),
            employment: SelectorChain::new(
                "dice.employment",
                &["[data-cy='search-result-employment-type']", ".card-position-type"],
            ),
            salary: SelectorChain::new(
                "dice.salary",
                &["[data-cy='search-result-salary']", ".card-salary"],
            ),
            detail_title: SelectorChain::new(
                "dice.detail_title",
                &["[data-cy='jobTitle']", "h1.job-title", "h1"],
            ),
            detail_company: SelectorChain::new(
                "dice.detail_company",
                &["[data-cy='companyNameLink']", ".company-name"],
            ),
            detail_location: SelectorChain::new(
                "dice.detail_location",
                &["[data-cy='locationDetails']", ".job-location"],
            ),
            detail_description: SelectorChain::new(
                "dice.detail_description",
                &["[data-cy='jobDescription']", ".job-description"],
            ),
            detail_skills: SelectorChain::new(
                "dice.detail_skills",
                &["[data-cy='skillsList'] li", ".skill-badge"],
            ),
            detail_employment: SelectorChain::new(
                "dice.detail_employment",
                &["[data-cy='employmentDetails']", ".employment-type"],
            ),
            detail_salary: SelectorChain::new(
                "dice.detail_salary",
                &["[data-cy='payDetails']", ".job-salary"],
            ),
        }
    }
}

/// Dice 抓取器（技术岗位）
pub struct DiceScraper {
    fetcher: Arc<dyn PageFetcher>,
    timeouts: ScrapeTimeouts,
    selectors: DiceSelectors,
}

impl DiceScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        Self {
            fetcher,
            timeouts,
            selectors: DiceSelectors::new(),
        }
    }

    /// 构建搜索 URL
    pub fn build_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params
            .append_pair("q", query)
            .append_pair("countryCode", "US")
            .append_pair("radius", "30")
            .append_pair("radiusUnit", "mi")
            .append_pair("page", "1")
            .append_pair("pageSize", &options.max_jobs.to_string());
        if let Some(location) = options.location_filter() {
            params.append_pair("location", location);
        }
        if options.remote {
            params.append_pair("filters.isRemote", "true");
        }
        if let Some(posted) = options
            .posted_within
            .and_then(|window| posted_within_bucket(window, &POSTED_BUCKETS))
        {
            params.append_pair("filters.postedDate", posted);
        }
        format!("{SEARCH_URL}?{}", params.finish())
    }

    /// 解析搜索结果页
    pub fn parse_results(&self, html: &str, options: &ScrapeOptions) -> ScrapeResult {
        let document = Html::parse_document(html);
        let mut result = ScrapeResult::begin();

        let cards = self.selectors.cards.select_outermost(document.root_element());
        debug!(count = cards.len(), "Found Dice job cards");

        collect_cards(&mut result, SOURCE, cards, options.max_jobs, |index, card| {
            self.parse_card(index, card)
        });
        result
    }

    fn parse_card(&self, index: usize, card: ElementRef<'_>) -> Result<Job, CardError> {
        let sel = &self.selectors;
        let mut job = require_job(SOURCE, index, sel.title_link.first_text(card))?;

        set_url(
            &mut job,
            index,
            &BASE_URL,
            sel.title_link.first_attr(card, "href"),
            false,
            &JOB_ID,
        )?;
        if let Some(company) = sel.company.first_text(card) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.location.first_text(card));
        set_salary(&mut job, sel.salary.first_text(card));
        job.posted_at = sel
            .posted
            .first_text(card)
            .and_then(|text| parse_posted_date(&text));
        job.employment_type = sel
            .employment
            .first_text(card)
            .and_then(|text| employment_type(&text));

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
        if let Some(company) = sel.detail_company.first_text(root) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.detail_location.first_text(root));
        set_salary(&mut job, sel.detail_salary.first_text(root));
        set_description(&mut job, sel.detail_description.first(root));
        merge_requirements(&mut job, sel.detail_skills.all_texts(root));
        job.employment_type = sel
            .detail_employment
            .first_text(root)
            .and_then(|text| employment_type(&text));

        Ok(job)
    }
}

#[async_trait]
impl JobScraper for DiceScraper {
    fn name(&self) -> &'static str {
        "Dice"
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
        info!(query, url = %url, max_jobs = options.max_jobs, "Starting Dice scrape");

        let attempts = [
            PageAttempt::selector(url.as_str(), RESULTS_WAIT),
            PageAttempt::selector(url.as_str(), RESULTS_FALLBACK_WAIT),
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
