//! HTTP transport implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Optional outbound proxy selection
//! - gzip/brotli negotiation and decompression
//! - Per-request deadlines and error classification

use crate::config::UserAgentConfig;
use crate::transport::{cookie_header, Cookie, HttpResponse, Transport};
use crate::SumiError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, COOKIE};
use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;
use url::Url;

/// Upper bound on the TCP connect phase, independent of the request deadline
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - The per-request deadline
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. malformed proxy URL)
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_sweep::config::UserAgentConfig;
/// use sumi_sweep::transport::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSweep".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     proxy: None,
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(3)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    agent_name: String,
}

impl HttpTransport {
    /// Creates a transport from the user agent configuration
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, SumiError> {
        let client = build_http_client(config, timeout)
            .map_err(|e| SumiError::InvalidArgument(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            agent_name: config.crawler_name.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn agent_name(&self) -> &str {
        &self.agent_name
    }

    async fn execute_request(&self, url: &Url, cookies: &[Cookie]) -> Result<HttpResponse, SumiError> {
        let mut request = self.client.get(url.as_str());
        if let Some(header) = cookie_header(cookies) {
            request = request.header(COOKIE, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = header_value(&response, CONTENT_TYPE);
        let content_encoding = header_value(&response, CONTENT_ENCODING);

        // text() decompresses and decodes using the response charset
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        tracing::trace!("GET {} -> {} ({} bytes)", url, status_code, body.len());

        Ok(HttpResponse {
            final_url,
            status_code,
            content_type,
            content_encoding,
            body,
        })
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn classify_error(url: &Url, error: reqwest::Error) -> SumiError {
    if error.is_timeout() {
        SumiError::Timeout {
            url: url.to_string(),
        }
    } else {
        SumiError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
