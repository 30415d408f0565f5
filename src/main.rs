// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and turn them into a RunConfig
// 2. Set up logging (file by default, stderr on request)
// 3. Do the CSRF handshake (fatal if it fails)
// 4. Dispatch to the crawl or search pipeline
// 5. Print a summary and exit (0 = run completed, 1 = run aborted)
//
// Failures inside single packages never reach this file: they are logged
// and the crawl goes on. Only handshake, top-level listing and (for search)
// the search itself can abort a run.
// =============================================================================

mod adt;
mod cli;
mod config;
mod crawl;
mod error;
mod logging;
mod sink;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use adt::{Credentials, NodeFetcher, ReqwestTransport, Transport};
use cli::Cli;
use config::{CrawlConfig, Job, RunConfig, SearchConfig};
use crawl::{CrawlReport, FanOutScheduler, SearchReport, TreeWalker};
use sink::CsvSink;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("Run aborted: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let config = RunConfig::from_cli(Cli::parse());
    logging::init(&config.log)?;

    let base = config.transport.base_url.clone();
    let transport: Arc<dyn Transport> = Arc::new(
        ReqwestTransport::new(config.transport.timeout).context("cannot build HTTP client")?,
    );

    println!("🔐 Requesting CSRF token from {}", base);
    let credentials = adt::fetch_credentials(transport.as_ref(), &base)
        .await
        .context("cannot start an ADT session")?;
    let credentials = Arc::new(credentials);

    match config.job {
        Job::Crawl(settings) => {
            handle_crawl(transport, credentials, &base, &settings, config.json).await
        }
        Job::Search(settings) => {
            handle_search(transport, credentials, &base, &settings, config.json).await
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    base: &url::Url,
    config: &CrawlConfig,
    json: bool,
) -> Result<()> {
    println!(
        "🌳 Crawling package tree with {} worker(s) into {}",
        config.workers,
        config.output.display()
    );

    let fetcher = NodeFetcher::new(transport, credentials, base.clone(), config.rate_limit_delay)
        .with_attempts(config.attempts);
    let walker = Arc::new(TreeWalker::new(fetcher, config.max_depth));
    let sink = Arc::new(CsvSink::new(&config.output));

    let report = FanOutScheduler::new(walker, sink, config.workers)
        .with_name_filter(config.name_filter.clone())
        .run()
        .await
        .context("crawl aborted")?;

    info!("All top-level packages have been processed");
    print_summary(&report, &crawl_rows(&report), json)
}

// Handles the 'search' subcommand
async fn handle_search(
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    base: &url::Url,
    config: &SearchConfig,
    json: bool,
) -> Result<()> {
    println!(
        "🔍 Searching '{}' and matching against package {}",
        config.query, config.package
    );

    let report = crawl::run_search(transport, credentials, base.clone(), config)
        .await
        .context("search aborted")?;

    print_summary(&report, &search_rows(&report), json)
}

fn crawl_rows(report: &CrawlReport) -> Vec<(&'static str, String)> {
    vec![
        ("Top-level packages", report.top_level_packages.to_string()),
        ("Packages written", report.packages_written.to_string()),
        ("Packages without rows", report.packages_empty.to_string()),
        ("Packages failed", report.packages_failed.to_string()),
        ("Rows written", report.records_written.to_string()),
        ("Rows filtered out", report.records_filtered.to_string()),
        ("Output", report.output.display().to_string()),
    ]
}

fn search_rows(report: &SearchReport) -> Vec<(&'static str, String)> {
    vec![
        ("Objects found", report.objects_found.to_string()),
        ("Package nodes", report.nodes_found.to_string()),
        ("Rows written", report.rows_written.to_string()),
        ("Output", report.output.display().to_string()),
    ]
}

// Prints the summary either as JSON or as a two-column table
fn print_summary<T: Serialize>(
    report: &T,
    rows: &[(&'static str, String)],
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary:");
    println!("{}", "=".repeat(60));
    for (label, value) in rows {
        println!("   {:<24} {}", label, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_crawl_rows_cover_every_counter() {
        let report = CrawlReport {
            top_level_packages: 3,
            packages_written: 1,
            packages_empty: 1,
            packages_failed: 1,
            records_written: 7,
            records_filtered: 2,
            output: PathBuf::from("abap_packages.csv"),
        };
        let rows = crawl_rows(&report);
        assert_eq!(rows.len(), 7);
        assert!(rows.contains(&("Rows filtered out", "2".to_string())));
        assert!(rows.contains(&("Rows written", "7".to_string())));
        assert!(rows.contains(&("Output", "abap_packages.csv".to_string())));
    }

    #[test]
    fn test_report_json_field_names() {
        let report = SearchReport {
            objects_found: 2,
            nodes_found: 5,
            rows_written: 1,
            output: PathBuf::from("abap_objects.csv"),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["rows_written"], 1);
        assert_eq!(value["output"], "abap_objects.csv");
    }
}
