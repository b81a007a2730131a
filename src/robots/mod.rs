//! Robots.txt handling module
//!
//! The robots gate fetches a domain's exclusion rules once per crawl, before
//! any worker starts, and reduces them to a read-only list of disallowed
//! prefixes. Fetching fails open: an erroring robots.txt means no restriction.

mod parser;

pub use parser::{parse_disallowed, ParsedRobots};

use crate::transport::{Cookie, Transport};
use crate::SumiError;
use url::Url;

/// Fetches and parses `http://{authority}/robots.txt`
///
/// # Arguments
///
/// * `transport` - The transport to fetch with; its agent name selects the
///   applicable rule blocks
/// * `authority` - `host[:port]` of the crawl domain
/// * `cookies` - Cookies attached to the request
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Parsed rules, or allow-all for any 4xx/5xx response
/// * `Err(SumiError)` - The request itself failed
pub async fn fetch_robots(
    transport: &dyn Transport,
    authority: &str,
    cookies: &[Cookie],
) -> Result<ParsedRobots, SumiError> {
    let url = Url::parse(&format!("http://{}/robots.txt", authority))?;
    let response = transport.execute_request(&url, cookies).await?;

    if !response.is_success() {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}, allowing all",
            authority,
            response.status_code
        );
        return Ok(ParsedRobots::allow_all());
    }

    Ok(ParsedRobots::from_content(response.text(), transport.agent_name()))
}

/// Fetches robots.txt and returns only the disallowed prefixes
pub async fn get_disallowed_prefixes(
    transport: &dyn Transport,
    authority: &str,
    cookies: &[Cookie],
) -> Result<Vec<String>, SumiError> {
    fetch_robots(transport, authority, cookies)
        .await
        .map(|robots| robots.disallowed().to_vec())
}

/// Checks a URL against a list of disallowed prefixes
///
/// # Returns
///
/// * `false` - Some entry is a literal prefix of the URL's path-and-query
///   or of its full string form
/// * `true` - Otherwise
pub fn uri_is_allowed(disallowed: &[String], url: &Url) -> bool {
    let full = url.as_str();
    let path = &url[url::Position::BeforePath..];

    !disallowed
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()) || full.starts_with(prefix.as_str()))
}
