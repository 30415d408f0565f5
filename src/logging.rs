// src/logging.rs
// =============================================================================
// Process-wide logging setup.
//
// Log lines carry timestamp, level and message. RUST_LOG overrides the
// default `info` filter (e.g. RUST_LOG=debug to see response bodies of
// unparsable listings). The log file is appended to, never truncated, so
// several runs can share one file.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::LogTarget;

pub fn init(target: &LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
    };

    installed.map_err(|e| anyhow!("cannot install logger: {}", e))
}
