// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Company, CompanySize, Job, JobSource};
use crate::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use crate::domain::scraping::scraper::{JobScraper, ScrapeTimeouts, ScraperError};
use crate::engines::traits::PageFetcher;
use crate::infrastructure::scrapers::common::{
    collect_cards, fetch_with_fallback, finish_scrape, merge_requirements, require_job,
    set_description, set_location, set_salary, set_url, PageAttempt,
};
use crate::infrastructure::scrapers::extract::{
    canonical_url, capture_id, element_text, SelectorChain,
};
use crate::utils::normalize::classify_company_size;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, info};
use url::form_urlencoded;
use url::Url;

const SOURCE: JobSource = JobSource::Wellfound;
const ROLE_URL: &str = "https://wellfound.com/role";

const RESULTS_WAIT: &str = "[data-test='StartupResult']";
const RESULTS_FALLBACK_WAIT: &str = "[class*='styles_component__']";
const DETAIL_WAIT: &str = "[data-test='JobDescription']";
const DETAIL_FALLBACK_WAIT: &str = "[class*='styles_description__']";

/// 公司卡片下没有具体职位时使用的占位标题
const OPEN_POSITIONS: &str = "Open Positions";
const DEFAULT_ROLE: &str = "software-engineer";

/// 查询关键词到角色 slug 的映射，匹配最长的关键词
const ROLE_SLUGS: [(&str, &str); 18] = [
    ("software engineer", "software-engineer"),
    ("frontend", "frontend-engineer"),
    ("front end", "frontend-engineer"),
    ("backend", "backend-engineer"),
    ("back end", "backend-engineer"),
    ("full stack", "full-stack-engineer"),
    ("fullstack", "full-stack-engineer"),
    ("devops", "devops-engineer"),
    ("data scientist", "data-scientist"),
    ("data engineer", "data-engineer"),
    ("machine learning", "machine-learning-engineer"),
    ("ml engineer", "machine-learning-engineer"),
    ("product manager", "product-manager"),
    ("designer", "designer"),
    ("ux", "ux-designer"),
    ("mobile", "mobile-developer"),
    ("ios", "ios-developer"),
    ("android", "android-developer"),
];

static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://wellfound.com").unwrap());
static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/jobs/(\d+)").unwrap());

/// 查询对应的角色 slug
///
/// 多个关键词同时出现时取最长的那个，例如 "ux designer" 命中 `designer`
/// 而不是 `ux`；都不命中时回退到 `software-engineer`。
pub fn role_slug(query: &str) -> &'static str {
    let query = query.to_lowercase();
    ROLE_SLUGS
        .iter()
        .filter(|(keyword, _)| query.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, slug)| *slug)
        .unwrap_or(DEFAULT_ROLE)
}

struct WellfoundSelectors {
    companies: SelectorChain,
    company_name: SelectorChain,
    company_link: SelectorChain,
    company_size: SelectorChain,
    listings: SelectorChain,
    listing_title: SelectorChain,
    listing_link: SelectorChain,
    listing_location: SelectorChain,
    listing_salary: SelectorChain,
    listing_equity: SelectorChain,
    detail_title: SelectorChain,
    detail_company: SelectorChain,
    detail_location: SelectorChain,
    detail_salary: SelectorChain,
    detail_description: SelectorChain,
    detail_skills: SelectorChain,
}

impl WellfoundSelectors {
    fn new() -> Self {
        Self {
            companies: SelectorChain::new(
                "wellfound.companies",
                &["[data-test='StartupResult']", "[class*='styles_component__']"],
            ),
            company_name: SelectorChain::new(
                "wellfound.company_name",
                &[
                    "[data-test='StartupName']",
                    "[class*='styles_startupName__']",
                    "h2",
                ],
            ),
            company_link: SelectorChain::new("wellfound.company_link", &["a[href*='/company/']"]),
            company_size: SelectorChain::new(
                "wellfound.company_size",
                &["[data-test='StartupSize']", "[class*='styles_startupSize__']"],
            ),
            listings: SelectorChain::new(
                "wellfound.listings",
                &[
                    "[data-test='JobListing']",
                    "[class*='styles_jobListing__']",
                    "a[href*='/jobs/']",
                ],
            ),
            listing_title: SelectorChain::new(
                "wellfound.listing_title",
                &["[data-test='JobTitle']", "[class*='styles_jobTitle__']"],
            ),
            listing_link: SelectorChain::new("wellfound.listing_link", &["a[href*='/jobs/']", "a"]),
            listing_location: SelectorChain::new(
                "wellfound.listing_location",
                &["[data-test='JobLocation']", "[class*='styles_location__']"],
            ),
            listing_salary: SelectorChain::new(
                "wellfound.listing_salary",
                &["[data-test='JobSalary']", "[class*='styles_salary__']"],
            ),
            listing_equity: SelectorChain::new(
                "wellfound.listing_equity",
                &["[data-test='JobEquity']", "[class*='styles_equity__']"],
            ),
            detail_title: SelectorChain::new(
                "wellfound.detail_title",
                &["h1", "[class*='styles_title__']"],
            ),
            detail_company: SelectorChain::new(
                "wellfound.detail_company",
                &["[data-test='CompanyName']", "[class*='styles_companyName__']"],
            ),
            detail_location: SelectorChain::new(
                "wellfound.detail_location",
                &["[data-test='Location']", "[class*='styles_location__']"],
            ),
            detail_salary: SelectorChain::new(
                "wellfound.detail_salary",
                &["[data-test='Compensation']", "[class*='styles_compensation__']"],
            ),
            detail_description: SelectorChain::new(
                "wellfound.detail_description",
                &["[data-test='JobDescription']", "[class*='styles_description__']"],
            ),
            detail_skills: SelectorChain::new(
                "wellfound.detail_skills",
                &["[data-test='Skill']", "[class*='styles_skill__']"],
            ),
        }
    }
}

/// 公司卡片中的一个条目
enum Listing<'a> {
    /// 具体职位
    Role(ElementRef<'a>),
    /// 公司卡片没有列出职位，整张卡片作为一个占位职位
    CompanyOnly(ElementRef<'a>),
}

/// Wellfound 抓取器
///
/// 搜索结果按公司分组，一张公司卡片下可能有多个职位。
pub struct WellfoundScraper {
    fetcher: Arc<dyn PageFetcher>,
    timeouts: ScrapeTimeouts,
    selectors: WellfoundSelectors,
}

impl WellfoundScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, timeouts: ScrapeTimeouts) -> Self {
        Self {
            fetcher,
            timeouts,
            selectors: WellfoundSelectors::new(),
        }
    }

    /// 构建搜索 URL
    ///
    /// 有地点时走 `/role/l/{slug}`，否则走 `/role/{slug}`
    pub fn build_search_url(&self, query: &str, options: &ScrapeOptions) -> String {
        let slug = role_slug(query);
        let location = options.location_filter();

        let mut params = form_urlencoded::Serializer::new(String::new());
        if options.remote {
            params.append_pair("remote", "true");
        }
        if let Some(location) = location {
            params.append_pair("locations[]", location);
        }
        let query_string = params.finish();

        let path = match location {
            Some(_) => format!("{ROLE_URL}/l/{slug}"),
            None => format!("{ROLE_URL}/{slug}"),
        };
        if query_string.is_empty() {
            path
        } else {
            format!("{path}?{query_string}")
        }
    }

    /// 解析搜索结果页
    ///
    /// 先把公司卡片展开为职位条目，再按条目计数和截断
    pub fn parse_results(&self, html: &str, options: &ScrapeOptions) -> ScrapeResult {
        let document = Html::parse_document(html);
        let mut result = ScrapeResult::begin();

        let companies = self.selectors.companies.select_outermost(document.root_element());
        debug!(count = companies.len(), "Found Wellfound company cards");

        let entries: Vec<(Company, Listing<'_>)> = companies
            .into_iter()
            .flat_map(|card| {
                let company = self.parse_company(card);
                let listings = self.selectors.listings.select_outermost(card);
                if listings.is_empty() {
                    vec![(company, Listing::CompanyOnly(card))]
                } else {
                    listings
                        .into_iter()
                        .map(|listing| (company.clone(), Listing::Role(listing)))
                        .collect()
                }
            })
            .collect();

        collect_cards(
            &mut result,
            SOURCE,
            entries,
            options.max_jobs,
            |index, (company, listing)| match listing {
                Listing::Role(element) => self.parse_listing(index, company, element),
                Listing::CompanyOnly(card) => self.parse_company_only(index, company, card),
            },
        );
        result
    }

    fn parse_company(&self, card: ElementRef<'_>) -> Company {
        let sel = &self.selectors;
        let mut company = Company::named(sel.company_name.first_text(card).unwrap_or_default());
        company.profile_url = sel
            .company_link
            .first_attr(card, "href")
            .and_then(|href| canonical_url(&BASE_URL, &href, true).ok());
        company.size = classify_company_size(
            &sel.company_size.first_text(card).unwrap_or_default(),
            Some(CompanySize::Startup),
        );
        company
    }

    fn parse_listing(
        &self,
        index: usize,
        company: Company,
        listing: ElementRef<'_>,
    ) -> Result<Job, CardError> {
        let sel = &self.selectors;

        // 没有独立标题元素时，条目本身就是标题链接
        let title = sel
            .listing_title
            .first_text(listing)
            .or_else(|| Some(element_text(listing)).filter(|t| !t.is_empty()));
        let mut job = require_job(SOURCE, index, title)?;

        let href = listing
            .value()
            .attr("href")
            .map(str::to_string)
            .or_else(|| sel.listing_link.first_attr(listing, "href"));
        set_url(&mut job, index, &BASE_URL, href, true, &JOB_ID)?;

        job.company = company;
        set_location(&mut job, sel.listing_location.first_text(listing));
        set_salary(&mut job, sel.listing_salary.first_text(listing));
        if let Some(equity) = sel.listing_equity.first_text(listing) {
            job.metadata.insert("equity".to_string(), equity);
        }

        Ok(job)
    }

    fn parse_company_only(
        &self,
        index: usize,
        company: Company,
        card: ElementRef<'_>,
    ) -> Result<Job, CardError> {
        if company.name.is_empty() {
            return Err(CardError::MissingTitle { index });
        }
        let mut job = require_job(SOURCE, index, Some(OPEN_POSITIONS.to_string()))?;
        set_url(
            &mut job,
            index,
            &BASE_URL,
            self.selectors.listing_link.first_attr(card, "href"),
            true,
            &JOB_ID,
        )?;
        job.company = company;
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
            job.company.size = Some(CompanySize::Startup);
        }
        set_location(&mut job, sel.detail_location.first_text(root));
        set_salary(&mut job, sel.detail_salary.first_text(root));
        set_description(&mut job, sel.detail_description.first(root));
        merge_requirements(&mut job, sel.detail_skills.all_texts(root));

        Ok(job)
    }
}

#[async_trait]
impl JobScraper for WellfoundScraper {
    fn name(&self) -> &'static str {
        "Wellfound"
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
        info!(query, url = %url, max_jobs = options.max_jobs, "Starting Wellfound scrape");

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
