// src/crawl/mod.rs
// =============================================================================
// This module turns ADT listings into rows.
//
// Features:
// - Depth-first walk of one package subtree (walker)
// - Concurrent walks over all top-level packages, each subtree appended to
//   the CSV as soon as it finishes (scheduler)
// - The single-pass search + join variant (search)
//
// Rust concepts:
// - Async programming: many walks in flight at once
// - Arc: read-only state shared by every walk
// =============================================================================

mod scheduler;
mod search;
mod walker;

pub use scheduler::{CrawlReport, FanOutScheduler};
pub use search::{run_search, SearchReport};
pub use walker::TreeWalker;
