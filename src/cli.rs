// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: walk the whole package tree concurrently and append every
//   subtree to a CSV file as soon as it is done
// - search: run one generic object search, read one package listing, and
//   write the rows that match by name
//
// Options shared by both (base URL, logging, output format) are marked
// `global = true`, so they may appear before or after the subcommand.
// =============================================================================

use clap::builder::TypedValueParser;
use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::PathBuf;
use url::Url;

use crate::config::{
    DEFAULT_ATTEMPTS, DEFAULT_BASE_URL, DEFAULT_CRAWL_OUTPUT, DEFAULT_LOG_FILE,
    DEFAULT_MAX_DEPTH, DEFAULT_RATE_LIMIT_DELAY_SECS, DEFAULT_SEARCH_OUTPUT, DEFAULT_SEARCH_PACKAGE,
    DEFAULT_SEARCH_QUERY, DEFAULT_WORKERS,
};

#[derive(Parser, Debug)]
#[command(
    name = "adt-harvester",
    version,
    about = "Crawl the ABAP repository tree over ADT and flatten it into CSV",
    long_about = "adt-harvester logs on to an ABAP system's ADT service, walks the package \
                  hierarchy and writes every object it finds to a CSV file. Failed packages \
                  are logged and skipped; the rest of the tree is still written."
)]
pub struct Cli {
    /// Base URL of the ADT service (scheme, host and port)
    #[arg(long, global = true, env = "ADT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// File that receives the run log
    #[arg(long, global = true, env = "ADT_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// Print the run summary as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk every top-level package and append its subtree to a CSV file
    ///
    /// Example: adt-harvester crawl --workers 8 --output packages.csv
    Crawl {
        /// CSV file to append to (created with a header if missing)
        #[arg(long, default_value = DEFAULT_CRAWL_OUTPUT)]
        output: PathBuf,

        /// Number of top-level packages walked at the same time
        #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
        workers: usize,

        /// Deepest level below a top-level package that is still expanded
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Seconds to back off after HTTP 429 without a Retry-After header
        #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_DELAY_SECS)]
        rate_limit_delay: u64,

        /// Attempts per listing request when the connection fails (1 = no retry)
        #[arg(long, default_value_t = DEFAULT_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
        retries: u32,

        /// Only write records whose OBJECT_NAME matches this regex (e.g. '^Z|/ISV')
        #[arg(long)]
        name_filter: Option<Regex>,
    },

    /// Search objects by name pattern and join them with one package listing
    ///
    /// Example: adt-harvester search --query 'ZD256*' --package ZD256_DEMO
    Search {
        /// Name pattern passed to SEARCH_GENERIC (wildcards allowed)
        #[arg(long, default_value = DEFAULT_SEARCH_QUERY)]
        query: String,

        /// Package whose direct children are matched against the results
        #[arg(long, default_value = DEFAULT_SEARCH_PACKAGE)]
        package: String,

        /// CSV file to write (replaced if it exists)
        #[arg(long, default_value = DEFAULT_SEARCH_OUTPUT)]
        output: PathBuf,
    },
}
