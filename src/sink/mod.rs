// src/sink/mod.rs
// =============================================================================
// Persistent output for crawled records.
//
// Only CSV is supported. The sink is shared by the whole run (behind an Arc)
// and does its own locking, so callers never coordinate writes themselves.
// =============================================================================

mod csv_file;

pub use csv_file::CsvSink;
