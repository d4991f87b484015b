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
use crate::utils::normalize::{
    clean_description, employment_type, parse_posted_date, posted_within_bucket,
};
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

const SOURCE: JobSource = JobSource::Indeed;
const SEARCH_URL: &str = "https://www.indeed.com/jobs";
const REMOTE_FILTER: &str = "032b3046-06a3-4876-8dfd-474eb5e7ed11";

const RESULTS_WAIT: &str = ".jobsearch-ResultsList";
const RESULTS_FALLBACK_WAIT: &str = "#mosaic-provider-jobcards";
const DETAIL_WAIT: &str = ".jobsearch-JobComponent";
const DETAIL_FALLBACK_WAIT: &str = "#jobDescriptionText";

/// `fromage` 支持的天数
const POSTED_BUCKETS: [(Duration, u32); 4] = [(days(1), 1), (days(3), 3), (days(7), 7), (days(14), 14)];

static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://www.indeed.com").unwrap());
static JOB_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"jk=([a-f0-9]+)").unwrap());

struct IndeedSelectors {
    cards: SelectorChain,
    title: SelectorChain,
    title_link: SelectorChain,
    company: SelectorChain,
    location: SelectorChain,
    salary: SelectorChain,
    snippet: SelectorChain,
    date: SelectorChain,
    detail_title: SelectorChain,
    detail_company: SelectorChain,
    detail_location: SelectorChain,
    detail_salary: SelectorChain,
    detail_job_type: SelectorChain,
    detail_description: SelectorChain,
}

impl IndeedSelectors {
    fn new() -> Self {
        Self {
            cards: SelectorChain::new(
                "indeed.cards",
                &[".job_seen_beacon", ".jobsearch-SerpJobCard", ".result"],
            ),
            title: SelectorChain::new(
                "indeed.title",
                &["h2.jobTitle a", "a.jcs-JobTitle", "[data-testid='jobTitle']", "h2.jobTitle"],
            ),
            title_link: SelectorChain::new(
                "indeed.title_link",
                &["h2.jobTitle a", "a.jcs-JobTitle", "a[data-jk]"],
            ),
            company: SelectorChain::new(
                "indeed.company",
                &[".companyName", "[data-testid='company-name']"],
            ),
            location: SelectorChain::new(
                "indeed.location",
                &[".companyLocation", "[data-testid='text-location']"],
            ),
            salary: SelectorChain::new(
                "indeed.salary",
                &[
                    ".salary-snippet-container",
                    ".salaryOnly",
                    "[data-testid='attribute_snippet_testid']",
                ],
            ),
            snippet: SelectorChain::new(
                "indeed.snippet",
                &[".job-snippet", "[data-testid='jobDescriptionSnippet']"],
            ),
            date: SelectorChain::new(
                "indeed.date",
                &[".date", "[data-testid='myJobsStateDate']"],
            ),
            detail_title: SelectorChain::new(
                "indeed.detail_title",
                &[
                    ".jobsearch-JobInfoHeader-title",
                    "h1[data-testid='jobsearch-JobInfoHeader-title']",
                    "h1",
                ],
            ),
            detail_company: SelectorChain::new(
                "indeed.detail_company",
                &[
                    "[data-company-name='true']",
                    "[data-testid='inlineHeader-companyName']",
                    ".jobsearch-InlineCompanyRating div",
                ],
            ),
            detail_location: SelectorChain::new(
                "indeed.detail_location",
                &[
                    "[data-testid='inlineHeader-companyLocation']",
                    "[data-testid='job-location']",
                    ".jobsearch-JobInfoHeader-subtitle > div:last-child",
                ],
            ),
            detail_salary: SelectorChain::new(
                "indeed.detail_salary",
                &["#salaryInfoAndJobType span", "#salaryInfoAndJobType"],
            ),
            detail_job_type: SelectorChain::new(
                "indeed.detail_job_type",
                &["#salaryInfoAndJobType span:last-child", "[data-testid='jobsearch-JobType']"],
            ),
            detail_description: SelectorChain::new(
                "indeed.detail_description",
                &["#jobDescriptionText", ".jobsearch-jobDescriptionText"],
            ),
        }
    }
}

/// Indeed 抓取器
pub struct IndeedScraper {
    fetcher: Arc<dyn PageFetcher>,
    timeouts: ScrapeTimeouts,
    selectors: IndeedSelectors,
}

impl IndeedScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        Self {
            fetcher,
            timeouts,
            selectors: IndeedSelectors::new(),
        }
    }

    /// 构建搜索 URL
    pub fn build_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("q", query);
        if let Some(location) = options.location_filter() {
            params.append_pair("l", location);
        }
        if options.remote {
            params.append_pair("remotejob", REMOTE_FILTER);
        }
        if let Some(fromage) = options
            .posted_within
            .and_then(|window| posted_within_bucket(window, &POSTED_BUCKETS))
        {
            params.append_pair("fromage", &fromage.to_string());
        }
        format!("{SEARCH_URL}?{}", params.finish())
    }

    /// 解析搜索结果页
    pub fn parse_results(&self, html: &str, options: &ScrapeOptions) -> ScrapeResult {
        let document = Html::parse_document(html);
        let mut result = ScrapeResult::begin();

        let cards = self.selectors.cards.select_outermost(document.root_element());
        debug!(count = cards.len(), "Found Indeed job cards");

        collect_cards(&mut result, SOURCE, cards, options.max_jobs, |index, card| {
            self.parse_card(index, card)
        });
        result
    }

    fn parse_card(&self, index: usize, card: ElementRef<'_>) -> Result<Job, CardError> {
        let sel = &self.selectors;
        let mut job = require_job(SOURCE, index, sel.title.first_text(card))?;

        let job_key = card
            .value()
            .attr("data-jk")
            .map(str::to_string)
            .or_else(|| sel.title_link.first_attr(card, "data-jk"));
        match job_key {
            Some(jk) => {
                job.url = format!("{}viewjob?jk={}", BASE_URL.as_str(), jk);
                job.external_id = Some(jk);
            }
            None => set_url(
                &mut job,
                index,
                &BASE_URL,
                sel.title_link.first_attr(card, "href"),
                false,
                &JOB_KEY,
            )?,
        }

        if let Some(company) = sel.company.first_text(card) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.location.first_text(card));
        set_salary(&mut job, sel.salary.first_text(card));
        if let Some(snippet) = sel.snippet.first_text(card) {
            job.description = clean_description(&snippet);
        }
        job.posted_at = sel
            .date
            .first_text(card)
            .and_then(|text| parse_posted_date(&text));

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
        job.external_id = capture_id(&JOB_KEY, url);
        if let Some(company) = sel.detail_company.first_text(root) {
            job.company = Company::named(company);
        }
        set_location(&mut job, sel.detail_location.first_text(root));
        set_salary(
            &mut job,
            sel.detail_salary
                .all_texts(root)
                .into_iter()
                .find(|text| text.contains('$')),
        );
        job.employment_type = sel
            .detail_job_type
            .first_text(root)
            .and_then(|text| employment_type(&text));
        set_description(&mut job, sel.detail_description.first(root));

        Ok(job)
    }
}

#[async_trait]
impl JobScraper for IndeedScraper {
    fn name(&self) -> &'static str {
        "Indeed"
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
        info!(query, url = %url, max_jobs = options.max_jobs, "Starting Indeed scrape");

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
