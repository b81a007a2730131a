//! Link and data extraction
//!
//! Extraction is a pure function of the page HTML, the crawl domain and the
//! optional custom pattern:
//! - Links come from `<a href="...">` tags and are kept only when they
//!   resolve inside the domain
//! - The custom pattern, when present, yields `(capture-group-name, value)`
//!   pairs

mod links;

pub use links::{extract_links, resolve_link};

use crate::url::Domain;
use crate::SumiError;
use regex::Regex;
use url::Url;

/// Output of one extraction call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedData {
    /// Absolute, domain-scoped links in document order (may repeat)
    pub links: Vec<Url>,

    /// Captured `(group name, value)` pairs
    pub data: Vec<(String, String)>,
}

/// Extracts links and, when `pattern` is given, custom captures
///
/// # Example
///
/// ```
/// use sumi_sweep::extract::extract;
/// use sumi_sweep::url::Domain;
///
/// let domain = Domain::parse("https://domain.com").unwrap();
/// let html = r#"<a href="https://domain.com/area"></a><a href="/area"></a><a href="/"></a>"#;
/// let extracted = extract(html, &domain, None);
/// assert_eq!(extracted.links.len(), 3);
/// ```
pub fn extract(html: &str, domain: &Domain, pattern: Option<&Regex>) -> ExtractedData {
    ExtractedData {
        links: extract_links(html, domain),
        data: pattern
            .map(|pattern| extract_captures(html, pattern))
            .unwrap_or_default(),
    }
}

/// Like [`extract`], compiling `pattern` first; an empty pattern means
/// links only
pub fn extract_with_pattern(html: &str, domain: &Domain, pattern: &str) -> Result<ExtractedData, SumiError> {
    if pattern.is_empty() {
        return Ok(extract(html, domain, None));
    }

    let regex = Regex::new(pattern)?;
    Ok(extract(html, domain, Some(&regex)))
}

/// Collects the `(group name, value)` pairs of every pattern match
///
/// Each participating named group contributes one pair, in pattern order.
/// Groups whose body is a plain literal (such as `(?<source>src)`) only
/// anchor the match and are not reported, since their value never varies.
/// Unnamed groups are ignored.
pub fn extract_captures(html: &str, pattern: &Regex) -> Vec<(String, String)> {
    let anchors = literal_groups(pattern.as_str());
    let named: Vec<(usize, &str)> = pattern
        .capture_names()
        .enumerate()
        .filter_map(|(index, name)| name.map(|name| (index, name)))
        .filter(|(_, name)| !anchors.iter().any(|anchor| anchor == name))
        .collect();

    if named.is_empty() {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    for caps in pattern.captures_iter(html) {
        for (index, name) in &named {
            if let Some(m) = caps.get(*index) {
                pairs.push((name.to_string(), m.as_str().to_string()));
            }
        }
    }
    pairs
}

/// Names of the groups in `source` whose body is a literal with no regex
/// syntax
fn literal_groups(source: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut rest = source;

    while let Some(open) = rest.find("(?") {
        let after = &rest[open + 2..];
        let after = after.strip_prefix('P').unwrap_or(after);
        rest = after;

        let Some(named) = after.strip_prefix('<') else {
            continue;
        };
        let Some(close) = named.find('>') else {
            continue;
        };
        let name = &named[..close];
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            // Lookbehind such as `(?<=` or `(?<!`
            continue;
        }

        let body = &named[close + 1..];
        let literal = body
            .find(')')
            .map(|end| &body[..end])
            .is_some_and(|body| !body.is_empty() && !body.contains(is_regex_syntax));
        if literal {
            literals.push(name.to_string());
        }
    }

    literals
}

fn is_regex_syntax(c: char) -> bool {
    matches!(c, '\\' | '.' | '+' | '*' | '?' | '(' | '|' | '[' | ']' | '{' | '}' | '^' | '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_ANCHORS: &str =
        r#"<a href="https://domain.com/area"></a><a href="/area"></a><a href="/"></a>"#;

    fn domain() -> Domain {
        Domain::parse("https://domain.com").unwrap()
    }

    #[test]
    fn test_three_links_without_pattern() {
        let extracted = extract(THREE_ANCHORS, &domain(), None);
        assert_eq!(extracted.links.len(), 3);
        assert!(extracted.data.is_empty());
    }

    #[test]
    fn test_literal_group_only_anchors() {
        let html = format!(r#"{}<img src="source.jpg" />"#, THREE_ANCHORS);
        let extracted = extract_with_pattern(
            &html,
            &domain(),
            r#"<img.+?(?<source>src)=\"(?<sourcename>.+?)\""#,
        )
        .unwrap();

        assert_eq!(extracted.links.len(), 3);
        assert_eq!(
            extracted.data,
            vec![("sourcename".to_string(), "source.jpg".to_string())]
        );
    }

    #[test]
    fn test_one_pair_per_match() {
        let html = r#"<img src="a.png"><p>text</p><img src="b.png">"#;
        let extracted =
            extract_with_pattern(html, &domain(), r#"<img.+?src="(?<image>.+?)""#).unwrap();

        assert_eq!(
            extracted.data,
            vec![
                ("image".to_string(), "a.png".to_string()),
                ("image".to_string(), "b.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_every_variable_group_reported() {
        let html = r#"<h2>Lamp</h2><span>12.50</span><h2>Desk</h2><span>80</span>"#;
        let extracted = extract_with_pattern(
            html,
            &domain(),
            r#"<h2>(?<title>[^<]+)</h2><span>(?<price>[^<]+)</span>"#,
        )
        .unwrap();

        assert_eq!(
            extracted.data,
            vec![
                ("title".to_string(), "Lamp".to_string()),
                ("price".to_string(), "12.50".to_string()),
                ("title".to_string(), "Desk".to_string()),
                ("price".to_string(), "80".to_string()),
            ]
        );
    }

    #[test]
    fn test_literal_groups_detected() {
        assert_eq!(literal_groups(r#"(?<source>src)="(?<value>.+?)""#), vec!["source"]);
        assert_eq!(literal_groups(r#"(?P<kind>img)(?<=x)(?<n>\d+)"#), vec!["kind"]);
        assert!(literal_groups(r#"(?<alt>a|b)"#).is_empty());
    }

    #[test]
    fn test_pattern_without_named_groups_captures_nothing() {
        let html = r#"<img src="a.png">"#;
        let extracted = extract_with_pattern(html, &domain(), r#"<img.+?src="(.+?)""#).unwrap();
        assert!(extracted.data.is_empty());
    }

    #[test]
    fn test_empty_pattern_is_links_only() {
        let extracted = extract_with_pattern(THREE_ANCHORS, &domain(), "").unwrap();
        assert_eq!(extracted.links.len(), 3);
        assert!(extracted.data.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let result = extract_with_pattern(THREE_ANCHORS, &domain(), "(?<broken");
        assert!(matches!(result, Err(SumiError::InvalidPattern(_))));
    }
}
