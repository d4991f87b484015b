// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{FakeFetcher, FakeResponse};
use jobcrawl::domain::models::job::{JobSource, LocationType};
use jobcrawl::domain::models::scrape::{CardError, ScrapeOptions};
use jobcrawl::domain::scraping::scraper::{JobScraper, ScrapeTimeouts, ScraperError};
use jobcrawl::engines::traits::{BrowserError, ScrollPlan, WaitFor};
use jobcrawl::infrastructure::scrapers::{
    DiceScraper, IndeedScraper, LinkedInScraper, ScraperRegistry, YCombinatorScraper,
};
use std::sync::Arc;
use std::time::Duration;

fn indeed_card(jk: &str, title: &str) -> String {
    format!(
        r#"<div class="job_seen_beacon" data-jk="{jk}">
             <h2 class="jobTitle"><a href="/rc/clk?jk={jk}">{title}</a></h2>
             <span class="companyName">Acme</span>
             <div class="companyLocation">Austin, TX</div>
           </div>"#
    )
}

fn indeed_page() -> String {
    format!(
        r#"<html><body><div id="mosaic-provider-jobcards" class="jobsearch-ResultsList">
             {}{}
             <div class="job_seen_beacon" data-jk="abc3"><span class="companyName">Ghost</span></div>
             {}
           </div></body></html>"#,
        indeed_card("abc1", "Rust Engineer"),
        indeed_card("abc2", "Go Engineer"),
        indeed_card("abc4", "Site Reliability Engineer"),
    )
}

fn dice_page(cards: usize) -> String {
    let cards: String = (0..cards)
        .map(|i| {
            format!(
                r#"<div data-cy="search-card">
                     <a data-cy="card-title-link" href="/job-detail/{i:04x}-aa">Engineer {i}</a>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

#[tokio::test(start_paused = true)]
async fn test_search_keeps_good_cards_and_records_bad_ones() {
    let fetcher = Arc::new(FakeFetcher::new().route("indeed.com/jobs", FakeResponse::Html(indeed_page())));
    let scraper = IndeedScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let result = scraper
        .scrape("rust", &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(result.total, 4);
    assert_eq!(result.scraped, 3);
    assert_eq!(result.errors, vec![CardError::MissingTitle { index: 2 }]);
    let urls: Vec<_> = result.jobs.iter().map(|j| j.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.indeed.com/viewjob?jk=abc1",
            "https://www.indeed.com/viewjob?jk=abc2",
            "https://www.indeed.com/viewjob?jk=abc4",
        ]
    );
    assert!(result.jobs.iter().all(|j| j.source == JobSource::Indeed));
    assert!(result.jobs.iter().all(|j| j.location_type == LocationType::Onsite));
    assert!(result.finished_at >= result.started_at);

    // 只发出主请求，两次尝试平分 120 秒预算
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.starts_with("https://www.indeed.com/jobs?q=rust"));
    assert_eq!(requests[0].wait, WaitFor::selector(".jobsearch-ResultsList"));
    assert_eq!(requests[0].timeout, Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_selector_is_tried() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route_wait("indeed.com/jobs", ".jobsearch-ResultsList", FakeResponse::Fail)
            .route("indeed.com/jobs", FakeResponse::Html(indeed_page())),
    );
    let scraper = IndeedScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let result = scraper
        .scrape("rust", &ScrapeOptions::default())
        .await
        .unwrap();
    assert_eq!(result.scraped, 3);

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].wait, WaitFor::selector("#mosaic-provider-jobcards"));
    assert_eq!(requests[1].timeout, Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn test_linkedin_falls_back_to_guest_search() {
    let guest = r#"
        <li><div class="base-search-card">
          <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/platform-engineer-at-initech-4000000001?trk=x"></a>
          <h3 class="base-search-card__title">Platform Engineer</h3>
          <h4 class="base-search-card__subtitle">Initech</h4>
          <span class="job-search-card__location">Remote</span>
        </div></li>"#;
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route("linkedin.com/jobs/search", FakeResponse::Fail)
            .route("jobs-guest", FakeResponse::Html(guest.to_string())),
    );
    let scraper = LinkedInScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let result = scraper
        .scrape("platform", &ScrapeOptions::default())
        .await
        .unwrap();
    assert_eq!(result.scraped, 1);
    assert_eq!(result.jobs[0].external_id.as_deref(), Some("4000000001"));
    assert_eq!(result.jobs[0].location_type, LocationType::Remote);

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].url.contains("/jobs-guest/"));
    assert_eq!(requests[1].wait, WaitFor::selector(".base-search-card"));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_page_times_out() {
    let fetcher = Arc::new(FakeFetcher::new().route("indeed.com", FakeResponse::Hang));
    let timeouts = ScrapeTimeouts {
        search: Duration::from_secs(5),
        detail: Duration::from_secs(5),
    };
    let scraper = IndeedScraper::new(fetcher, timeouts);

    let err = scraper
        .scrape("rust", &ScrapeOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.job_source(), JobSource::Indeed);
    match err {
        ScraperError::Timeout { url, after, .. } => {
            assert!(url.starts_with("https://www.indeed.com/jobs"));
            assert_eq!(after, Duration::from_secs(5));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_all_attempts_failing_is_fatal() {
    let fetcher = Arc::new(FakeFetcher::new().route("dice.com", FakeResponse::Fail));
    let scraper = DiceScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let err = scraper
        .scrape("python", &ScrapeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::Fetch {
            job_source: JobSource::Dice,
            cause: BrowserError::Timeout(_),
            ..
        }
    ));
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_max_jobs_caps_results() {
    let fetcher = Arc::new(FakeFetcher::new().route("dice.com/jobs", FakeResponse::Html(dice_page(10))));
    let scraper = DiceScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let options = ScrapeOptions::default().with_max_jobs(4);
    let result = scraper.scrape("python", &options).await.unwrap();
    assert_eq!(result.total, 10);
    assert_eq!(result.scraped, 4);
    assert_eq!(result.jobs.len(), 4);
    assert!(fetcher.requests()[0].url.contains("pageSize=4"));
}

#[tokio::test(start_paused = true)]
async fn test_job_detail_uses_detail_budget() {
    let detail = r#"
        <h1 data-cy="jobTitle">Staff Engineer</h1>
        <a data-cy="companyNameLink">Hooli</a>
        <div data-cy="jobDescription"><p>Docker everywhere.</p></div>"#;
    let fetcher = Arc::new(FakeFetcher::new().route("job-detail", FakeResponse::Html(detail.to_string())));
    let scraper = DiceScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let job = scraper
        .scrape_job("https://www.dice.com/job-detail/beef-01")
        .await
        .unwrap();
    assert_eq!(job.title, "Staff Engineer");
    assert_eq!(job.url, "https://www.dice.com/job-detail/beef-01");
    assert_eq!(job.requirements, vec!["Docker"]);

    let requests = fetcher.requests();
    assert_eq!(requests[0].wait, WaitFor::selector("[data-cy='jobDescription']"));
    assert_eq!(requests[0].timeout, Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_lazy_list_is_scrolled() {
    let page = r#"<div class="job-card"><a href="/jobs/7"><h3>Founding Engineer</h3></a></div>"#;
    let fetcher = Arc::new(FakeFetcher::new().route("workatastartup.com", FakeResponse::Html(page.to_string())));
    let scraper = YCombinatorScraper::new(fetcher.clone(), ScrapeTimeouts::default());

    let result = scraper
        .scrape("founding", &ScrapeOptions::default())
        .await
        .unwrap();
    assert_eq!(result.scraped, 1);
    assert_eq!(
        fetcher.requests()[0].scroll,
        Some(ScrollPlan {
            times: 5,
            delay: Duration::from_millis(500)
        })
    );
}

#[test]
fn test_registry_lookup() {
    let registry = ScraperRegistry::with_default_scrapers(Arc::new(FakeFetcher::new()), ScrapeTimeouts::default());
    assert_eq!(registry.len(), JobSource::ALL.len() - 1);
    assert!(registry.get(JobSource::BuiltIn).is_none());

    let scraper = registry.get(JobSource::Wellfound).unwrap();
    assert_eq!(scraper.source(), JobSource::Wellfound);
    assert!(registry
        .all()
        .iter()
        .all(|s| registry.get(s.source()).is_some()));
}
