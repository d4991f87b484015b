// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{FakeFetcher, FakeResponse, StubScraper};
use jobcrawl::domain::models::job::JobSource;
use jobcrawl::domain::models::scrape::ScrapeOptions;
use jobcrawl::domain::models::task::{ScrapeStatus, ScrapeTask};
use jobcrawl::domain::scraping::scraper::ScrapeTimeouts;
use jobcrawl::infrastructure::scrapers::ScraperRegistry;
use jobcrawl::workers::{CoordinatorConfig, ScrapeCoordinator, SourceOutcome};
use std::sync::Arc;
use std::time::Duration;

fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        max_concurrency: 2,
        source_timeout: Duration::from_secs(10),
        min_request_interval: Duration::ZERO,
    }
}

fn coordinator(scrapers: Vec<StubScraper>) -> ScrapeCoordinator {
    coordinator_with(scrapers, config())
}

fn coordinator_with(scrapers: Vec<StubScraper>, config: CoordinatorConfig) -> ScrapeCoordinator {
    let mut registry = ScraperRegistry::new();
    for scraper in scrapers {
        registry.register(Arc::new(scraper));
    }
    ScrapeCoordinator::new(Arc::new(registry), config)
}

#[tokio::test]
async fn test_partial_failure_completes_task() {
    let coordinator = coordinator(vec![
        StubScraper::returning(JobSource::Indeed, &["https://a.example/1", "https://a.example/2"]),
        StubScraper::failing(JobSource::Dice),
        StubScraper::returning(JobSource::LinkedIn, &["https://b.example/1"]),
    ]);
    let task = ScrapeTask::new(
        "rust",
        None,
        vec![JobSource::Indeed, JobSource::Dice, JobSource::LinkedIn],
    )
    .unwrap();

    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.task.status, ScrapeStatus::Completed);
    assert_eq!(report.task.jobs_found, 3);
    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.failed_sources(), vec![JobSource::Dice]);

    // 报告顺序与请求的来源顺序一致
    let order: Vec<_> = report.sources.iter().map(|r| r.source).collect();
    assert_eq!(order, vec![JobSource::Indeed, JobSource::Dice, JobSource::LinkedIn]);
    match &report.sources[1].outcome {
        SourceOutcome::Failed { error } => assert!(error.contains("results list missing")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(
        report.sources[0].outcome,
        SourceOutcome::Completed { scraped: 2, .. }
    ));
}

#[tokio::test]
async fn test_all_sources_failing_fails_task() {
    let coordinator = coordinator(vec![
        StubScraper::failing(JobSource::Indeed),
        StubScraper::failing(JobSource::Dice),
    ]);
    let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed, JobSource::Dice]).unwrap();

    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.task.status, ScrapeStatus::Failed);
    assert!(report.jobs.is_empty());
    let error = report.task.error.unwrap();
    assert!(error.contains("indeed"));
    assert!(error.contains("dice"));
}

#[tokio::test]
async fn test_unregistered_source_is_reported() {
    let coordinator = coordinator(vec![StubScraper::returning(
        JobSource::Indeed,
        &["https://a.example/1"],
    )]);
    let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed, JobSource::BuiltIn]).unwrap();

    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.task.status, ScrapeStatus::Completed);
    assert_eq!(report.failed_sources(), vec![JobSource::BuiltIn]);
    match &report.sources[1].outcome {
        SourceOutcome::Failed { error } => assert!(error.contains("no scraper registered")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_jobs_deduplicated_by_url() {
    let coordinator = coordinator(vec![
        StubScraper::returning(JobSource::Indeed, &["https://same.example/1", ""]),
        StubScraper::returning(JobSource::Dice, &["https://same.example/1", ""]),
    ]);
    let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed, JobSource::Dice]).unwrap();

    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    // 空链接不参与去重
    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.jobs[0].source, JobSource::Indeed);
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_is_cut_off() {
    let coordinator = coordinator(vec![
        StubScraper::returning(JobSource::Indeed, &["https://a.example/1"])
            .with_delay(Duration::from_secs(60)),
        StubScraper::returning(JobSource::Dice, &["https://b.example/1"]),
    ]);
    let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed, JobSource::Dice]).unwrap();

    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.task.status, ScrapeStatus::Completed);
    assert_eq!(report.failed_sources(), vec![JobSource::Indeed]);
    match &report.sources[0].outcome {
        SourceOutcome::Failed { error } => assert!(error.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_report_serializes_outcomes() {
    let coordinator = coordinator(vec![StubScraper::failing(JobSource::Dice)]);
    let task = ScrapeTask::new("rust", None, vec![JobSource::Dice]).unwrap();
    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["task"]["status"], "failed");
    assert_eq!(json["sources"][0]["source"], "dice");
    assert_eq!(json["sources"][0]["status"], "failed");
}

#[tokio::test(start_paused = true)]
async fn test_real_scrapers_behind_coordinator() {
    let page = r#"
        <div class="job_seen_beacon" data-jk="k1">
          <h2 class="jobTitle"><a href="/rc/clk?jk=k1">Rust Engineer</a></h2>
        </div>"#;
    let fetcher = Arc::new(FakeFetcher::new().route("indeed.com", FakeResponse::Html(page.to_string())));
    let registry = ScraperRegistry::with_default_scrapers(fetcher, ScrapeTimeouts::default());
    let coordinator = ScrapeCoordinator::new(Arc::new(registry), config());

    let task = ScrapeTask::new(
        "rust",
        Some("Austin".to_string()),
        vec![JobSource::Indeed, JobSource::Dice],
    )
    .unwrap();
    let report = coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.task.status, ScrapeStatus::Completed);
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].url, "https://www.indeed.com/viewjob?jk=k1");
    assert_eq!(report.failed_sources(), vec![JobSource::Dice]);
}

#[tokio::test]
async fn test_same_source_requests_are_spaced() {
    let interval = Duration::from_millis(200);
    let scraper = StubScraper::returning(JobSource::Indeed, &["https://a.example/1"]);
    let calls = scraper.calls();
    let coordinator = coordinator_with(
        vec![scraper],
        CoordinatorConfig {
            min_request_interval: interval,
            ..config()
        },
    );

    for _ in 0..2 {
        let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed]).unwrap();
        let report = coordinator
            .run(task, &ScrapeOptions::default())
            .await
            .unwrap();
        assert_eq!(report.task.status, ScrapeStatus::Completed);
    }

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    // 限速器与 Instant 的时钟来源不同，留出少量误差
    assert!(calls[1] - calls[0] >= interval - Duration::from_millis(10));
}

#[tokio::test]
async fn test_different_sources_are_not_spaced_against_each_other() {
    let indeed = StubScraper::returning(JobSource::Indeed, &["https://a.example/1"]);
    let dice = StubScraper::returning(JobSource::Dice, &["https://b.example/1"]);
    let (indeed_calls, dice_calls) = (indeed.calls(), dice.calls());
    let coordinator = coordinator_with(
        vec![indeed, dice],
        CoordinatorConfig {
            min_request_interval: Duration::from_secs(5),
            ..config()
        },
    );

    let task = ScrapeTask::new("rust", None, vec![JobSource::Indeed, JobSource::Dice]).unwrap();
    let started = std::time::Instant::now();
    coordinator
        .run(task, &ScrapeOptions::default())
        .await
        .unwrap();

    // 每个来源的第一次请求不需要等待
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(indeed_calls.lock().unwrap().len(), 1);
    assert_eq!(dice_calls.lock().unwrap().len(), 1);
}
