//! Anchor link extraction and domain-scoped resolution

use crate::url::Domain;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every anchor `href` that resolves inside `domain`
///
/// Order follows the document; repeated links are kept (the frontier
/// deduplicates).
pub fn extract_links(html: &str, domain: &Domain) -> Vec<Url> {
    let mut links = Vec::new();
    if html.is_empty() {
        return links;
    }

    let document = Html::parse_document(html);
    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, domain) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves a link href against the crawl domain
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only (`#...`) hrefs
/// - `javascript:` links
/// - anything that is neither prefixed by the domain's full string nor by
///   its path-only form (out of domain)
/// - anything that resolves to another host or port, e.g.
///   `https://example.com.evil.org/` for `https://example.com`
///
/// A leading protocol-relative `//` is stripped and replaced by the domain's
/// scheme before the prefix checks. Fragments are dropped from the resolved
/// URL.
pub fn resolve_link(href: &str, domain: &Domain) -> Option<Url> {
    let trimmed = href.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') || is_script_link(trimmed) {
        return None;
    }

    let value = match trimmed.strip_prefix("//") {
        Some(rest) => format!("{}://{}", domain.url().scheme(), rest),
        None => trimmed.to_string(),
    };

    let mut url = if value.starts_with(domain.as_str()) {
        Url::parse(&value).ok()?
    } else if value.starts_with(domain.path()) {
        Url::parse(&format!("{}{}", domain.origin(), value)).ok()?
    } else {
        return None;
    };

    if !domain.same_origin(&url) {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

fn is_script_link(value: &str) -> bool {
    value
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}
