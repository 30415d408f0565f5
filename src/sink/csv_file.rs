// src/sink/csv_file.rs
// =============================================================================
// Append-only CSV output.
//
// First write to a missing (or zero-length) file: header row + rows.
// Every later write: rows only. The header comes from the serde field names
// of the record type, so every row written through one sink has the same
// columns as long as callers stick to one record type.
//
// Writes are serialized with a Mutex around the whole
// check-exists / open / write / flush sequence. Without it, two subtrees
// finishing at the same moment could both decide the file is new and both
// write a header, or interleave their rows.
//
// Rust concepts:
// - Generics with trait bounds: `append<T: Serialize>` works for any row type
// - Mutex<()>: a lock that guards an external resource (the file), not data
// =============================================================================

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::SinkError;

pub struct CsvSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Appends `records`, writing the header first if the file is new.
    //
    // Returns: number of rows written. An empty slice writes nothing and
    // does not create the file.
    pub fn append<T: Serialize>(&self, records: &[T]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        // A poisoned lock only means another append panicked mid-write;
        // the file itself is still usable.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write_rows(file, records, needs_header)?;

        debug!(
            rows = records.len(),
            header = needs_header,
            "appended to {}",
            self.path.display()
        );
        Ok(records.len())
    }

    // Replaces the file with header + `records`. Used by the single-pass
    // search, which always produces its output in one go.
    //
    // An empty slice leaves any existing file untouched.
    pub fn write_all<T: Serialize>(&self, records: &[T]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = File::create(&self.path)?;
        write_rows(file, records, true)?;
        Ok(records.len())
    }
}

fn write_rows<W: Write, T: Serialize>(
    writer: W,
    records: &[T],
    with_header: bool,
) -> Result<(), SinkError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
