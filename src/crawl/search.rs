// src/crawl/search.rs
// =============================================================================
// The single-pass variant: no recursion, no fan-out.
//
// 1. SEARCH_GENERIC for a name pattern -> object references
// 2. One listing of a named package -> node records
// 3. Inner join on name, write the result in one go (replacing the file)
//
// Unlike the tree crawl there is nothing to isolate a failure to, so a
// failed search or listing ends the run.
// =============================================================================

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::adt::{join_by_name, search_objects, Credentials, NodeFetcher, Transport};
use crate::config::SearchConfig;
use crate::error::AdtError;
use crate::sink::CsvSink;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub objects_found: usize,
    pub nodes_found: usize,
    pub rows_written: usize,
    pub output: PathBuf,
}

pub async fn run_search(
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    base: Url,
    config: &SearchConfig,
) -> Result<SearchReport, AdtError> {
    let objects = search_objects(transport.as_ref(), &credentials, &base, &config.query)
        .await
        .map_err(AdtError::Search)?;

    let fetcher = NodeFetcher::new(transport, credentials, base, config.rate_limit_delay);
    let nodes = fetcher
        .try_fetch(&config.package)
        .await
        .map_err(|source| AdtError::PackageListing {
            package: config.package.clone(),
            source,
        })?;
    info!("Found {} package details", nodes.len());

    let rows = join_by_name(&objects, &nodes);
    let sink = CsvSink::new(&config.output);
    let rows_written = sink.write_all(&rows)?;
    info!(
        "Saved {} combined rows to {}",
        rows_written,
        config.output.display()
    );

    Ok(SearchReport {
        objects_found: objects.len(),
        nodes_found: nodes.len(),
        rows_written,
        output: config.output.clone(),
    })
}
