// src/adt/session.rs
// =============================================================================
// The CSRF handshake.
//
// ADT refuses POST requests that do not carry a valid X-CSRF-Token. The
// token (and the session cookies that go with it) come from one GET to the
// discovery endpoint with the header `X-CSRF-Token: fetch`.
//
// The result is a `Credentials` value. It is created once, never mutated,
// and shared read-only by every worker (behind an Arc).
//
// There is no retry here: if the handshake fails there is nothing useful
// the crawler can do, so the error goes straight back to main.
// =============================================================================

use tracing::{debug, info, instrument};
use url::Url;

use super::endpoints;
use super::transport::{AdtRequest, Transport};
use crate::error::AdtError;

pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Token plus session cookies returned by the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub cookies: Vec<String>,
}

impl Credentials {
    /// The value of the `Cookie` header to replay on later requests.
    /// Returns None when the server set no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        }
    }

    // Attaches token and cookies to a request.
    pub fn authorize(&self, request: AdtRequest) -> AdtRequest {
        let request = request.header(CSRF_HEADER, self.token.clone());
        match self.cookie_header() {
            Some(cookies) => request.header("Cookie", cookies),
            None => request,
        }
    }
}

// Performs the handshake against `base`.
//
// Returns: Credentials on success
// Errors:
//   - transport failure (server unreachable)
//   - non-success status
//   - no token header in the response
#[instrument(skip(transport))]
pub async fn fetch_credentials(
    transport: &dyn Transport,
    base: &Url,
) -> Result<Credentials, AdtError> {
    let url = endpoints::discovery_url(base)?;
    info!("Requesting CSRF token from {}", url);

    let request = AdtRequest::get(url).header(CSRF_HEADER, "fetch");
    let response = transport
        .send(request)
        .await
        .map_err(AdtError::Handshake)?;

    if !response.status.is_success() {
        return Err(AdtError::HandshakeStatus(response.status));
    }

    let token = response
        .header(CSRF_HEADER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AdtError::MissingToken)?
        .to_string();
    let cookies = response.session_cookies();

    debug!(cookies = cookies.len(), "session cookies received");
    info!("CSRF token and cookies retrieved");

    Ok(Credentials { token, cookies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adt::transport::mock::{self, MockTransport, Reply};
    use reqwest::StatusCode;

    fn base() -> Url {
        Url::parse("http://adt.example").unwrap()
    }

    fn discovery_reply() -> Reply {
        let response = mock::status(StatusCode::OK);
        let response = mock::with_header(response, "X-CSRF-Token", "T1");
        let response = mock::with_header(response, "Set-Cookie", "sid=abc; path=/");
        Reply::Respond(response)
    }

    #[tokio::test]
    async fn test_handshake_reads_token_and_cookies() {
        let base = base();
        let transport = MockTransport::new()
            .route(&endpoints::discovery_url(&base).unwrap(), discovery_reply());

        let creds = fetch_credentials(&transport, &base).await.unwrap();

        assert_eq!(creds.token, "T1");
        assert_eq!(creds.cookies, vec!["sid=abc".to_string()]);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, reqwest::Method::GET);
        assert!(calls[0]
            .headers
            .contains(&(CSRF_HEADER, "fetch".to_string())));
    }

    #[tokio::test]
    async fn test_missing_token_is_fatal() {
        let base = base();
        let transport = MockTransport::new().route(
            &endpoints::discovery_url(&base).unwrap(),
            Reply::Respond(mock::status(StatusCode::OK)),
        );

        let err = fetch_credentials(&transport, &base).await.unwrap_err();
        assert!(matches!(err, AdtError::MissingToken));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fatal() {
        let base = base();
        let transport = MockTransport::new().route(
            &endpoints::discovery_url(&base).unwrap(),
            Reply::Fail("connection refused".to_string()),
        );

        let err = fetch_credentials(&transport, &base).await.unwrap_err();
        assert!(matches!(err, AdtError::Handshake(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_handshake_is_fatal() {
        let base = base();
        let transport = MockTransport::new().route(
            &endpoints::discovery_url(&base).unwrap(),
            Reply::Respond(mock::status(StatusCode::UNAUTHORIZED)),
        );

        let err = fetch_credentials(&transport, &base).await.unwrap_err();
        assert!(matches!(err, AdtError::HandshakeStatus(StatusCode::UNAUTHORIZED)));
    }

    #[test]
    fn test_authorize_adds_token_and_cookie_header() {
        let creds = Credentials {
            token: "T1".to_string(),
            cookies: vec!["sid=abc".to_string(), "lang=EN".to_string()],
        };
        let request = creds.authorize(AdtRequest::post(base()));
        assert_eq!(
            request.headers,
            vec![
                (CSRF_HEADER, "T1".to_string()),
                ("Cookie", "sid=abc; lang=EN".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_cookie_header_without_cookies() {
        let creds = Credentials {
            token: "T1".to_string(),
            cookies: Vec::new(),
        };
        assert_eq!(creds.cookie_header(), None);
        assert_eq!(creds.authorize(AdtRequest::post(base())).headers.len(), 1);
    }
}
