//! Robots.txt parser implementation
//!
//! Only `User-agent` and `Disallow` directives matter here. Consecutive
//! `User-agent` lines form one group; the `Disallow` lines that follow apply
//! when any agent in the group is `*` or is contained in this crawler's agent
//! name (case-insensitive).

use crate::robots::uri_is_allowed;
use url::Url;

/// Disallowed prefixes applicable to this crawler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    disallowed: Vec<String>,
}

impl ParsedRobots {
    /// Parses raw robots.txt content for the given agent name
    pub fn from_content(content: &str, agent_name: &str) -> Self {
        Self {
            disallowed: parse_disallowed(content, agent_name),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns the disallowed prefixes
    pub fn disallowed(&self) -> &[String] {
        &self.disallowed
    }

    /// Returns true if the whole site is off limits
    pub fn disallows_root(&self) -> bool {
        self.disallowed.iter().any(|d| d == "/")
    }

    /// Checks if a URL is allowed
    pub fn is_allowed(&self, url: &Url) -> bool {
        uri_is_allowed(&self.disallowed, url)
    }
}

/// Extracts the disallowed prefixes that apply to `agent_name`
///
/// Empty `Disallow:` values (which mean "allow everything") are skipped and
/// duplicates are removed, keeping first-seen order.
pub fn parse_disallowed(content: &str, agent_name: &str) -> Vec<String> {
    let agent = agent_name.to_lowercase();
    let mut disallowed: Vec<String> = Vec::new();
    let mut group_agents: Vec<String> = Vec::new();
    let mut in_agent_lines = false;
    let mut applicable = false;

    for line in content.lines() {
        // Strip comments
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                // A user-agent line after rules starts a new group
                if !in_agent_lines {
                    group_agents.clear();
                }
                in_agent_lines = true;
                group_agents.push(value.to_lowercase());
                applicable = group_agents.iter().any(|ua| agent_matches(ua, &agent));
            }
            "disallow" => {
                in_agent_lines = false;
                if applicable && !value.is_empty() && !disallowed.iter().any(|d| d == value) {
                    disallowed.push(value.to_string());
                }
            }
            _ => {
                in_agent_lines = false;
            }
        }
    }

    disallowed
}

/// Matches a lowercase `User-agent` value against our lowercase name
///
/// `*` matches everyone. Otherwise the product token (the part before any
/// `/version`) must equal the name.
fn agent_matches(user_agent: &str, agent: &str) -> bool {
    if user_agent == "*" {
        return true;
    }
    let product = user_agent.split('/').next().unwrap_or_default().trim();
    !product.is_empty() && product == agent
}
