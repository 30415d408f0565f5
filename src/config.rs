// src/config.rs
// =============================================================================
// Plain configuration values for each part of the run.
//
// cli.rs owns parsing; this file turns the parsed arguments into structs the
// rest of the crate can use without knowing about clap. Defaults live here
// so the CLI and the tests agree on them.
// =============================================================================

use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::cli::{Cli, Commands};

pub const DEFAULT_BASE_URL: &str = "http://TUM_I01_ADT.dest";
pub const DEFAULT_LOG_FILE: &str = "scraper.log";
pub const DEFAULT_CRAWL_OUTPUT: &str = "abap_packages.csv";
pub const DEFAULT_SEARCH_OUTPUT: &str = "abap_objects.csv";
pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 10;
pub const DEFAULT_ATTEMPTS: u32 = 1;
pub const DEFAULT_SEARCH_QUERY: &str = "ZD256*";
pub const DEFAULT_SEARCH_PACKAGE: &str = "ZD256_DEMO";

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub output: PathBuf,
    pub workers: usize,
    pub max_depth: usize,
    pub rate_limit_delay: Duration,
    pub attempts: u32,
    // None writes every record
    pub name_filter: Option<Regex>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_CRAWL_OUTPUT),
            workers: DEFAULT_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
            rate_limit_delay: Duration::from_secs(DEFAULT_RATE_LIMIT_DELAY_SECS),
            attempts: DEFAULT_ATTEMPTS,
            name_filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub query: String,
    pub package: String,
    pub output: PathBuf,
    pub rate_limit_delay: Duration,
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Which pipeline to run, with its settings.
#[derive(Debug, Clone)]
pub enum Job {
    Crawl(CrawlConfig),
    Search(SearchConfig),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub transport: TransportConfig,
    pub log: LogTarget,
    pub json: bool,
    pub job: Job,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let log = if cli.log_stderr {
            LogTarget::Stderr
        } else {
            LogTarget::File(cli.log_file)
        };

        let job = match cli.command {
            Commands::Crawl {
                output,
                workers,
                max_depth,
                rate_limit_delay,
                retries,
                name_filter,
            } => Job::Crawl(CrawlConfig {
                output,
                workers,
                max_depth,
                rate_limit_delay: Duration::from_secs(rate_limit_delay),
                attempts: retries,
                name_filter,
            }),
            Commands::Search {
                query,
                package,
                output,
            } => Job::Search(SearchConfig {
                query,
                package,
                output,
                rate_limit_delay: Duration::from_secs(DEFAULT_RATE_LIMIT_DELAY_SECS),
            }),
        };

        Self {
            transport: TransportConfig {
                base_url: cli.base_url,
                timeout: cli.timeout.map(Duration::from_secs),
            },
            log,
            json: cli.json,
            job,
        }
    }
}
