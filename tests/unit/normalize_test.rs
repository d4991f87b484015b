// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, TimeZone, Utc};
use jobcrawl::domain::models::job::{CompanySize, LocationType};
use jobcrawl::utils::normalize::dates::days;
use jobcrawl::utils::normalize::{
    classify_company_size, classify_location, parse_posted_date_at, parse_salary,
    posted_within_bucket,
};

#[test]
fn test_salary_formats_seen_on_job_boards() {
    let s = parse_salary("$100K – $150K").unwrap();
    assert_eq!((s.min, s.max), (100_000, Some(150_000)));
    assert_eq!(s.currency, "USD");

    let s = parse_salary("From $95,000 a year").unwrap();
    assert_eq!((s.min, s.max), (95_000, None));

    let s = parse_salary("£50,000 - £60,000").unwrap();
    assert_eq!(s.currency, "GBP");

    let s = parse_salary("$40 - $50 per hour").unwrap();
    assert_eq!((s.min, s.max), (83_200, Some(104_000)));

    assert!(parse_salary("Competitive").is_none());
    assert!(parse_salary("").is_none());
}

#[test]
fn test_posted_dates_relative_to_clock() {
    let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
    assert_eq!(parse_posted_date_at("Just posted", now), Some(now));
    assert_eq!(parse_posted_date_at("Posted 3 days ago", now), Some(now - Duration::days(3)));
    assert_eq!(parse_posted_date_at("30+ days ago", now), Some(now - Duration::days(30)));
    assert_eq!(parse_posted_date_at("2 weeks ago", now), Some(now - Duration::weeks(2)));
    assert_eq!(
        parse_posted_date_at("March 1, 2025", now),
        Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(parse_posted_date_at("sometime", now), None);
}

#[test]
fn test_posted_within_buckets() {
    let buckets = [(days(1), "day"), (days(7), "week")];
    assert_eq!(posted_within_bucket(days(1), &buckets), Some("day"));
    assert_eq!(posted_within_bucket(days(2), &buckets), Some("week"));
    assert_eq!(posted_within_bucket(days(30), &buckets), None);
}

#[test]
fn test_location_and_size_classification() {
    assert_eq!(classify_location("Remote - US"), LocationType::Remote);
    assert_eq!(classify_location("Hybrid remote in Denver"), LocationType::Remote);
    assert_eq!(classify_location("Denver, CO (Hybrid)"), LocationType::Hybrid);
    assert_eq!(classify_location("Denver, CO"), LocationType::Onsite);

    assert_eq!(
        classify_company_size("501-1,000 employees", None),
        Some(CompanySize::Large)
    );
    assert_eq!(
        classify_company_size("", Some(CompanySize::Startup)),
        Some(CompanySize::Startup)
    );
}
