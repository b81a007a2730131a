//! Transport collaborator
//!
//! The crawler core never talks to the network directly. Every request goes
//! through a [`Transport`], which owns connection handling, header and
//! encoding negotiation, proxy selection and the per-request deadline.
//! [`HttpTransport`] is the reqwest-backed implementation used by the CLI;
//! tests substitute scripted transports.

mod http;

pub use http::{build_http_client, HttpTransport};

use crate::SumiError;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// A cookie attached to every request of a crawl
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    /// Creates a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Renders cookies as a single `Cookie` request header value
///
/// Returns `None` when there is nothing to send.
pub fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Content-Encoding header value, if any
    pub content_encoding: Option<String>,

    /// Decompressed, charset-decoded body
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns the decoded body text
    pub fn text(&self) -> &str {
        &self.body
    }
}

/// Outbound request seam used by the crawler and the robots gate
#[async_trait]
pub trait Transport: Send + Sync {
    /// Identity token used to select applicable robots.txt rule blocks
    fn agent_name(&self) -> &str;

    /// Executes a GET request for `url`, attaching `cookies`
    ///
    /// Non-2xx responses are returned as `Ok`; only transport-level failures
    /// (connection, timeout, body read) are errors.
    async fn execute_request(&self, url: &Url, cookies: &[Cookie]) -> Result<HttpResponse, SumiError>;
}
