use crate::SumiError;
use url::Url;

/// The authority a crawl is confined to
///
/// Keeps both the string the caller supplied (used for literal prefix
/// checks during link resolution) and the parsed form (used for host,
/// origin and path-only lookups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    original: String,
    url: Url,
}

impl Domain {
    /// Parses a domain authority such as `https://example.com` or
    /// `https://reddit.com/r/`
    ///
    /// # Returns
    ///
    /// * `Ok(Domain)` - An HTTP(S) URL with a host
    /// * `Err(SumiError::InvalidArgument)` - Any other scheme, or no host
    pub fn parse(domain: &str) -> Result<Self, SumiError> {
        let original = domain.trim().to_string();
        let url = Url::parse(&original)?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SumiError::InvalidArgument(format!(
                "Domain must use http or https, got: {}",
                original
            )));
        }

        if url.host_str().is_none() {
            return Err(SumiError::InvalidArgument(format!(
                "Domain has no host: {}",
                original
            )));
        }

        Ok(Self { original, url })
    }

    /// The domain exactly as supplied
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The parsed domain URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The lowercase host
    pub fn host(&self) -> String {
        extract_host(&self.url).unwrap_or_default()
    }

    /// `host[:port]`, port only when it is not the scheme default
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host(),
        }
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.url.scheme(), self.authority())
    }

    /// The path-only form, e.g. `/r/` for `https://reddit.com/r/`
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Returns true if `url` starts with this domain on the same host
    ///
    /// Both sides are compared in their normalised string form, so
    /// `https://example.com` contains `https://example.com/page`. The host
    /// and port must also match, which rules out look-alikes such as
    /// `https://example.com.evil.org/`.
    pub fn contains(&self, url: &Url) -> bool {
        url.as_str().starts_with(self.url.as_str()) && self.same_origin(url)
    }

    /// Returns true if `url` has this domain's host and effective port
    pub fn same_origin(&self, url: &Url) -> bool {
        extract_host(url).is_some_and(|host| host == self.host())
            && url.port_or_known_default() == self.url.port_or_known_default()
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}

/// Extracts the host from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sweep::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
