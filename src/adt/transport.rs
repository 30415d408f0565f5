// src/adt/transport.rs
// =============================================================================
// The HTTP seam between the crawler and the network.
//
// Everything above this file talks to a `Transport`: "send this request,
// give me status + headers + body". The real implementation wraps a
// reqwest Client; tests plug in a scripted transport instead, so the
// handshake, fetcher, walker and scheduler can all be tested offline.
//
// Rust concepts:
// - Traits: an interface the rest of the crate depends on
// - async-trait: lets a trait have async methods and still be used as
//   `Arc<dyn Transport>`
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

/// One outgoing request: method, absolute URL and extra headers.
#[derive(Debug, Clone)]
pub struct AdtRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
}

impl AdtRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
        }
    }

    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// What came back: status, headers and the full body.
#[derive(Debug, Clone)]
pub struct AdtResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl AdtResponse {
    /// Returns a header value as text, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    // Collects the `name=value` part of every Set-Cookie header.
    // Attributes like Path or HttpOnly only matter to browsers.
    pub fn session_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: AdtRequest) -> Result<AdtResponse, TransportError>;
}

/// Production transport backed by a shared reqwest client.
///
/// Cookies are not stored in the client; they travel with each request as
/// part of the credentials, so every worker sends exactly what the
/// handshake returned.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    // Builds the client. `timeout` of None keeps reqwest's default
    // (no overall request timeout).
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: AdtRequest) -> Result<AdtResponse, TransportError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(AdtResponse {
            status,
            headers,
            body,
        })
    }
}

// -----------------------------------------------------------------------------
// Scripted transport for tests
// -----------------------------------------------------------------------------

#[cfg(test)]
pub mod mock {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// What the mock does when a URL is requested.
    #[derive(Clone)]
    pub enum Reply {
        Respond(AdtResponse),
        // Responds after sleeping on the tokio clock
        Delayed(Duration, AdtResponse),
        Fail(String),
        Panic,
    }

    #[derive(Default)]
    pub struct MockTransport {
        routes: Mutex<HashMap<String, VecDeque<Reply>>>,
        calls: Mutex<Vec<AdtRequest>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, url: &Url, reply: Reply) -> Self {
            self.route_sequence(url, vec![reply])
        }

        // Replies are used in order; the last one repeats forever.
        pub fn route_sequence(self, url: &Url, replies: Vec<Reply>) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), replies.into());
            self
        }

        pub fn calls(&self) -> Vec<AdtRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, url: &Url) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.url == *url)
                .count()
        }

        /// Highest number of requests that were being answered at once.
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: AdtRequest) -> Result<AdtResponse, TransportError> {
            let key = request.url.to_string();
            self.calls.lock().unwrap().push(request);
            let reply = self.routes.lock().unwrap().get_mut(&key).and_then(|replies| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            });
            match reply {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::Delayed(delay, response)) => {
                    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(response)
                }
                Some(Reply::Fail(msg)) => Err(TransportError::Unavailable(msg)),
                Some(Reply::Panic) => panic!("scripted panic for {}", key),
                None => Ok(status(StatusCode::NOT_FOUND)),
            }
        }
    }

    pub fn status(status: StatusCode) -> AdtResponse {
        AdtResponse {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn xml(body: &str) -> Reply {
        Reply::Respond(AdtResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn slow_xml(delay: Duration, body: &str) -> Reply {
        match xml(body) {
            Reply::Respond(response) => Reply::Delayed(delay, response),
            other => other,
        }
    }

    pub fn with_header(mut response: AdtResponse, name: &'static str, value: &str) -> AdtResponse {
        response
            .headers
            .append(name, HeaderValue::from_str(value).unwrap());
        response
    }

    // Builds an ADT node-structure document from (name, expandable) pairs.
    pub fn node_listing(nodes: &[(&str, bool)]) -> String {
        let mut body = String::from(
            r#"<?xml version="1.0" encoding="utf-8"?><asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0"><asx:values><DATA><TREE_CONTENT>"#,
        );
        for (name, expandable) in nodes {
            let (object_type, flag) = if *expandable {
                ("DEVC/K", "X")
            } else {
                ("CLAS/OC", "")
            };
            body.push_str(&format!(
                "<SEU_ADT_REPOSITORY_OBJ_NODE>\
                 <OBJECT_TYPE>{object_type}</OBJECT_TYPE>\
                 <OBJECT_NAME>{name}</OBJECT_NAME>\
                 <TECH_NAME>{name}</TECH_NAME>\
                 <OBJECT_URI>/sap/bc/adt/objects/{lower}</OBJECT_URI>\
                 <OBJECT_VIT_URI>/sap/bc/adt/vit/{lower}</OBJECT_VIT_URI>\
                 <EXPANDABLE>{flag}</EXPANDABLE>\
                 </SEU_ADT_REPOSITORY_OBJ_NODE>",
                lower = name.to_lowercase(),
            ));
        }
        body.push_str("</TREE_CONTENT></DATA></asx:values></asx:abap>");
        body
    }
}
