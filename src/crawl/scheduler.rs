// src/crawl/scheduler.rs
// =============================================================================
// Fan-out over the top-level packages.
//
// How it works:
// 1. List the top level (one fetch with an empty parent name). If that
//    listing fails, the run cannot continue and the error is returned.
// 2. Start one TreeWalker task per top-level package, at most `workers`
//    at a time.
// 3. As each task finishes (completion order, not submission order), drop
//    the records the optional name filter rejects and append the rest to
//    the sink.
//
// Each walk runs in its own tokio task. If a walk panics, the JoinError is
// logged with the package name and the other walks carry on. The only thing
// the tasks share is read-only (walker, fetcher, credentials); the sink is
// written from this loop alone and locks internally as well. The file write
// itself runs on tokio's blocking pool so it never stalls the runtime.
//
// Rust concepts:
// - buffer_unordered(N): poll up to N futures at once, yield results as
//   they complete
// - tokio::spawn + JoinHandle: a panic inside the task becomes an Err on
//   the handle instead of unwinding through the scheduler
// =============================================================================

use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::walker::TreeWalker;
use crate::adt::NodeRecord;
use crate::error::{AdtError, SinkError};
use crate::sink::CsvSink;

/// What happened during a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub top_level_packages: usize,
    pub packages_written: usize,
    pub packages_empty: usize,
    pub packages_failed: usize,
    pub records_written: usize,
    pub records_filtered: usize,
    pub output: PathBuf,
}

pub struct FanOutScheduler {
    walker: Arc<TreeWalker>,
    sink: Arc<CsvSink>,
    workers: usize,
    name_filter: Option<Regex>,
}

impl FanOutScheduler {
    pub fn new(walker: Arc<TreeWalker>, sink: Arc<CsvSink>, workers: usize) -> Self {
        Self {
            walker,
            sink,
            workers: workers.max(1),
            name_filter: None,
        }
    }

    /// Only records whose OBJECT_NAME matches `filter` are written. The walk
    /// itself still expands every package.
    pub fn with_name_filter(mut self, filter: Option<Regex>) -> Self {
        self.name_filter = filter;
        self
    }

    pub async fn run(&self) -> Result<CrawlReport, AdtError> {
        let top_level = self
            .walker
            .fetcher()
            .try_fetch("")
            .await
            .map_err(AdtError::TopLevelListing)?;

        let packages: Vec<String> = top_level.into_iter().map(|r| r.object_name).collect();
        info!(
            "Found {} top-level packages, walking with {} workers",
            packages.len(),
            self.workers
        );

        let mut report = CrawlReport {
            top_level_packages: packages.len(),
            output: self.sink.path().to_path_buf(),
            ..CrawlReport::default()
        };

        let mut completed = stream::iter(packages)
            .map(|package| {
                let walker = Arc::clone(&self.walker);
                async move {
                    let task = tokio::spawn({
                        let package = package.clone();
                        async move {
                            let started = Instant::now();
                            let records = walker.walk(&package).await;
                            info!(
                                "Finished processing package: {} in {} ms",
                                package,
                                started.elapsed().as_millis()
                            );
                            records
                        }
                    });
                    (package, task.await)
                }
            })
            .buffer_unordered(self.workers);

        while let Some((package, outcome)) = completed.next().await {
            let mut records = match outcome {
                Ok(records) => records,
                Err(e) => {
                    error!("Error fetching details for package {}: {}", package, e);
                    report.packages_failed += 1;
                    continue;
                }
            };

            if let Some(filter) = &self.name_filter {
                let before = records.len();
                records.retain(|r| filter.is_match(&r.object_name));
                report.records_filtered += before - records.len();
            }

            if records.is_empty() {
                report.packages_empty += 1;
                continue;
            }

            match self.append(records).await {
                Ok(written) => {
                    report.packages_written += 1;
                    report.records_written += written;
                    info!("Fetched and saved details for package: {}", package);
                }
                Err(e) => {
                    warn!("Could not save records for package {}: {}", package, e);
                    report.packages_failed += 1;
                }
            }
        }

        info!(
            "Crawl finished: {} rows from {} packages",
            report.records_written, report.packages_written
        );
        Ok(report)
    }

    async fn append(&self, records: Vec<NodeRecord>) -> Result<usize, SinkError> {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || sink.append(&records))
            .await
            .map_err(|e| SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn a task inside buffer_unordered instead of awaiting the walk
//    directly?
//    - buffer_unordered alone would run all walks on this one task
//    - A panic in any of them would then unwind through the scheduler
//    - tokio::spawn catches the panic and reports it as a JoinError
//
// 2. When does the spawn actually happen?
//    - `.map()` only builds an async block; nothing runs yet
//    - buffer_unordered polls at most `workers` of those blocks at a time,
//      and the spawn is the first thing each block does when polled
//
// 3. Why is the sink written from this loop?
//    - Results arrive here one by one, so appends are already sequential
//    - CsvSink locks anyway, so other callers stay safe too
//    - spawn_blocking moves the std::fs work off the async worker threads;
//      the loop still awaits it, so the order of appends does not change
// -----------------------------------------------------------------------------
