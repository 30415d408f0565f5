// src/error.rs
// =============================================================================
// Typed errors for every layer below the CLI.
//
// Layers:
// - TransportError: the request never produced a response
// - ParseError: a response body could not be turned into records
// - FetchError: one node listing failed (any of the above, or a bad status)
// - SinkError: writing rows to the CSV file failed
// - AdtError: conditions that abort the whole run
//
// main.rs wraps these in anyhow with context; everything in between returns
// the specific type so callers can decide what is fatal and what is isolated.
// =============================================================================

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// The transport could not deliver a request or read its response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    // Only the scripted test transport fails without a reqwest error
    #[cfg(test)]
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Why a single node listing produced no records.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("rate limited, backed off for {}s", .delay.as_secs())]
    RateLimited { delay: Duration },
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Run-fatal errors. Anything that reaches main as an `AdtError` ends the run.
#[derive(Error, Debug)]
pub enum AdtError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("CSRF handshake failed: {0}")]
    Handshake(#[source] TransportError),
    #[error("CSRF handshake returned HTTP {0}")]
    HandshakeStatus(StatusCode),
    #[error("CSRF handshake response carried no X-CSRF-Token header")]
    MissingToken,
    #[error("could not list top-level packages: {0}")]
    TopLevelListing(#[source] FetchError),
    #[error("object search failed: {0}")]
    Search(#[source] FetchError),
    #[error("could not read structure of package {package}: {source}")]
    PackageListing {
        package: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}
