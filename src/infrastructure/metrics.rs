// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobSource;
use crate::domain::models::scrape::ScrapeResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};

pub const JOBS_SCRAPED_TOTAL: &str = "jobcrawl_jobs_scraped_total";
pub const CARD_ERRORS_TOTAL: &str = "jobcrawl_card_errors_total";
pub const SOURCE_FAILURES_TOTAL: &str = "jobcrawl_source_failures_total";
pub const SCRAPE_DURATION_SECONDS: &str = "jobcrawl_scrape_duration_seconds";

/// 注册指标描述
///
/// 只有宿主进程安装了 recorder 时指标才会被导出
pub fn describe_metrics() {
    describe_counter!(JOBS_SCRAPED_TOTAL, "Total number of jobs emitted by scrapers");
    describe_counter!(
        CARD_ERRORS_TOTAL,
        "Total number of job cards skipped because they could not be parsed"
    );
    describe_counter!(
        SOURCE_FAILURES_TOTAL,
        "Total number of fatal scrape failures per source"
    );
    describe_histogram!(
        SCRAPE_DURATION_SECONDS,
        "Duration of a single-source search scrape in seconds"
    );
}

/// 记录一次成功抓取
pub fn record_scrape(source: JobSource, result: &ScrapeResult) {
    counter!(JOBS_SCRAPED_TOTAL, "source" => source.as_str()).increment(result.scraped as u64);
    counter!(CARD_ERRORS_TOTAL, "source" => source.as_str()).increment(result.errors.len() as u64);
    histogram!(SCRAPE_DURATION_SECONDS, "source" => source.as_str())
        .record(result.duration().as_secs_f64());
}

/// 记录一次来源失败
pub fn record_source_failure(source: JobSource) {
    counter!(SOURCE_FAILURES_TOTAL, "source" => source.as_str()).increment(1);
}
