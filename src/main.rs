// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jobcrawl::config::settings::Settings;
use jobcrawl::domain::models::job::JobSource;
use jobcrawl::domain::models::scrape::ScrapeOptions;
use jobcrawl::domain::models::task::ScrapeTask;
use jobcrawl::engines::browser_pool::BrowserPool;
use jobcrawl::infrastructure::metrics;
use jobcrawl::infrastructure::scrapers::ScraperRegistry;
use jobcrawl::utils::normalize::dates::days;
use jobcrawl::utils::telemetry;
use jobcrawl::workers::ScrapeCoordinator;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "jobcrawl")]
#[command(about = "Scrape job listings from multiple job boards with a headless browser")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one or more job boards
    Search {
        /// Search keywords
        #[arg(short, long)]
        query: String,

        /// Job boards to search (repeatable); all registered boards when omitted
        #[arg(short, long = "source", value_parser = parse_source)]
        sources: Vec<JobSource>,

        /// Maximum jobs per board
        #[arg(short, long)]
        max_jobs: Option<usize>,

        /// Location filter
        #[arg(short, long)]
        location: Option<String>,

        /// Remote jobs only
        #[arg(long)]
        remote: bool,

        /// Only jobs posted within this many days (0 disables the filter)
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u64).range(0..=365))]
        posted_within_days: u64,
    },

    /// Fetch a single job detail page
    Job {
        /// Job board the URL belongs to
        #[arg(short, long, value_parser = parse_source)]
        source: JobSource,

        /// Job detail URL
        #[arg(short, long)]
        url: String,
    },

    /// List registered job boards
    Sources,
}

fn parse_source(value: &str) -> Result<JobSource, String> {
    value.parse()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 主函数
///
/// 加载配置、初始化日志，按子命令执行抓取并把结果以 JSON 输出到 stdout
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Settings::new().context("failed to load config")?,
    };

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging)?;
    metrics::describe_metrics();
    info!("Starting jobcrawl...");

    // 3. Wire the browser pool into the scrapers
    let pool = Arc::new(BrowserPool::new(settings.browser.clone()));
    let registry = Arc::new(ScraperRegistry::with_default_scrapers(
        pool.clone(),
        settings.scraping.timeouts(),
    ));

    let outcome = run(cli.command, &settings, registry).await;
    pool.shutdown();
    outcome
}

async fn run(command: Commands, settings: &Settings, registry: Arc<ScraperRegistry>) -> Result<()> {
    match command {
        Commands::Search {
            query,
            sources,
            max_jobs,
            location,
            remote,
            posted_within_days,
        } => {
            let sources = if sources.is_empty() {
                registry.sources()
            } else {
                sources
            };
            let options = ScrapeOptions::default()
                .with_max_jobs(max_jobs.unwrap_or(settings.scraping.default_max_jobs))
                .with_location(location.clone().unwrap_or_default())
                .remote_only(remote)
                .with_posted_within((posted_within_days > 0).then(|| days(posted_within_days)));

            let task = ScrapeTask::new(query, location, sources)?;
            let coordinator = ScrapeCoordinator::new(registry, settings.scraping.coordinator());
            let report = coordinator.run(task, &options).await?;
            print_json(&report)
        }
        Commands::Job { source, url } => {
            let scraper = registry
                .get(source)
                .ok_or_else(|| anyhow!("no scraper registered for {source}"))?;
            let job = scraper.scrape_job(&url).await?;
            print_json(&job)
        }
        Commands::Sources => {
            let sources: Vec<_> = registry
                .all()
                .iter()
                .map(|scraper| {
                    serde_json::json!({
                        "source": scraper.source(),
                        "name": scraper.name(),
                    })
                })
                .collect();
            print_json(&sources)
        }
    }
}
