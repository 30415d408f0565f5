// src/adt/fetch.rs
// =============================================================================
// The node fetcher: one authenticated POST per package name.
//
// How a response is classified:
// - 2xx with a blank body   -> no records (nothing to parse)
// - 2xx with XML            -> parsed records
// - 2xx with broken XML     -> parse error (logged, no records)
// - 429 Too Many Requests   -> sleep for Retry-After seconds (or the
//                              configured default), then no records.
//                              The same request is NOT retried.
// - any other status        -> logged, no records
// - transport failure       -> retried up to `attempts` times in total,
//                              then logged, no records
//
// Only transport failures are retried. A status the server chose to send
// (429 included) is an answer, not a lost request.
//
// `try_fetch` returns the typed failure so the scheduler can treat a broken
// top-level listing as fatal. `fetch` collapses every failure into an empty
// list, which is what the tree walker wants: one bad package never takes its
// siblings down with it.
// =============================================================================

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::endpoints;
use super::nodes::{parse_node_structure, NodeRecord};
use super::session::Credentials;
use super::transport::{AdtRequest, AdtResponse, Transport};
use crate::error::FetchError;

pub const SESSION_TYPE_HEADER: &str = "X-SAP-ADT-SessionType";

/// Cheap to clone: all fields are shared handles or small values.
#[derive(Clone)]
pub struct NodeFetcher {
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    base: Url,
    rate_limit_delay: Duration,
    attempts: u32,
}

impl NodeFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<Credentials>,
        base: Url,
        rate_limit_delay: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            base,
            rate_limit_delay,
            attempts: 1,
        }
    }

    /// Sends each request up to `attempts` times while the transport fails.
    /// Values below 1 are treated as 1.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Fetches the children of `package`. Never fails: every error is logged
    /// and turns into an empty list.
    pub async fn fetch(&self, package: &str) -> Vec<NodeRecord> {
        match self.try_fetch(package).await {
            Ok(records) => records,
            Err(FetchError::Parse(e)) => {
                error!("Error parsing XML for package {}: {}", package, e);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to retrieve package structure for {}: {}", package, e);
                Vec::new()
            }
        }
    }

    // Fetches the children of `package`, reporting why nothing came back.
    // An empty package name lists the top level.
    #[instrument(skip(self))]
    pub async fn try_fetch(&self, package: &str) -> Result<Vec<NodeRecord>, FetchError> {
        info!("Fetching details for package: {}", package);

        let url = endpoints::node_structure_url(&self.base, package)?;
        let request = self
            .credentials
            .authorize(AdtRequest::post(url))
            .header(SESSION_TYPE_HEADER, "Stateless");

        let response = self.send_with_retry(package, request).await?;
        self.classify(response).await
    }

    async fn send_with_retry(
        &self,
        package: &str,
        request: AdtRequest,
    ) -> Result<AdtResponse, FetchError> {
        let mut attempt = 1;
        loop {
            match self.transport.send(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "Retrying {} after error (attempt {}/{}): {}",
                        package, attempt, self.attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn classify(&self, response: AdtResponse) -> Result<Vec<NodeRecord>, FetchError> {
        if response.status == StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after(&response).unwrap_or(self.rate_limit_delay);
            warn!("Rate limited (HTTP 429), backing off for {}s", delay.as_secs());
            tokio::time::sleep(delay).await;
            return Err(FetchError::RateLimited { delay });
        }

        if !response.status.is_success() {
            return Err(FetchError::Status(response.status));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            debug!("empty body, nothing to parse");
            return Ok(Vec::new());
        }

        parse_node_structure(&response.body).map_err(|e| {
            debug!(
                "Response content: {}",
                String::from_utf8_lossy(&response.body)
            );
            FetchError::Parse(e)
        })
    }
}

// Reads Retry-After as a number of seconds. The HTTP-date form is not
// supported and falls back to the default delay.
fn retry_after(response: &AdtResponse) -> Option<Duration> {
    response
        .header("Retry-After")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
