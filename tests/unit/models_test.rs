// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use jobcrawl::domain::models::job::{Company, Job, JobSource, LocationType};
use jobcrawl::domain::models::scrape::{CardError, ScrapeOptions, ScrapeResult};
use std::time::Duration;

#[test]
fn test_job_source_names_round_trip_through_cli_parsing() {
    for source in JobSource::ALL {
        assert_eq!(source.as_str().parse::<JobSource>(), Ok(source));
    }
    assert_eq!("AngelList".parse::<JobSource>(), Ok(JobSource::Wellfound));
    assert_eq!(" yc ".parse::<JobSource>(), Ok(JobSource::YCombinator));
    assert!("monster".parse::<JobSource>().is_err());
}

#[test]
fn test_job_json_shape() {
    let mut job = Job::new(JobSource::LinkedIn, "  Rust Engineer ").unwrap();
    job.company = Company::named("Acme");
    job.location_type = LocationType::Hybrid;
    job.metadata.insert("equity".into(), "0.5%".into());

    let json = serde_json::to_value(&job).unwrap();
    assert_eq!(json["title"], "Rust Engineer");
    assert_eq!(json["source"], "linkedin");
    assert_eq!(json["location_type"], "hybrid");
    assert_eq!(json["company"]["name"], "Acme");
    assert_eq!(json["metadata"]["equity"], "0.5%");
    assert_eq!(json["is_active"], true);
}

#[test]
fn test_card_errors_are_tagged() {
    let json = serde_json::to_value(CardError::InvalidUrl {
        index: 4,
        href: "::".into(),
    })
    .unwrap();
    assert_eq!(json["kind"], "invalid_url");
    assert_eq!(json["index"], 4);
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: ScrapeOptions = serde_json::from_str(r#"{"max_jobs": 10, "remote": true}"#).unwrap();
    assert_eq!(options.max_jobs, 10);
    assert!(options.remote);
    assert_eq!(options.posted_within, Some(Duration::from_secs(7 * 24 * 60 * 60)));
    assert_eq!(options.location_filter(), None);

    let options = ScrapeOptions::default().with_location("   ");
    assert_eq!(options.location, None);
}

#[test]
fn test_empty_result_is_valid() {
    let result = ScrapeResult::begin().finish();
    assert!(result.jobs.is_empty());
    assert_eq!(result.total, 0);
    assert_eq!(result.scraped, 0);
    assert!(result.finished_at >= result.started_at);
}
