//! Color-space preservation policy.
//!
//! Pointing an asset at a different file makes the host scene re-guess the
//! asset's color space. When preservation is on, the value captured before
//! the switch is written back, but only for destination paths matched by the
//! substring filter.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Comma-separated allow-list of path substrings.
///
/// Matching is case-sensitive. Tokens are trimmed and empty tokens dropped,
/// so an empty or all-comma filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SubstringFilter {
    tokens: Vec<String>,
}

impl SubstringFilter {
    pub fn parse(filter: &str) -> Self {
        let tokens = filter
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True if any token occurs in `path`.
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.tokens.iter().any(|token| path.contains(token.as_str()))
    }
}

impl From<String> for SubstringFilter {
    fn from(filter: String) -> Self {
        Self::parse(&filter)
    }
}

impl From<SubstringFilter> for String {
    fn from(filter: SubstringFilter) -> Self {
        filter.tokens.join(",")
    }
}

/// Whether, and for which destinations, a color space survives a path switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSpacePolicy {
    pub preserve: bool,
    pub filter: SubstringFilter,
}

impl ColorSpacePolicy {
    pub fn new(preserve: bool, filter: &str) -> Self {
        Self {
            preserve,
            filter: SubstringFilter::parse(filter),
        }
    }

    /// Policy that never restores anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The color space to write back after switching to `destination`.
    pub fn restore_for(&self, destination: &Path, captured: &str) -> Option<String> {
        (self.preserve && self.filter.matches(destination)).then(|| captured.to_string())
    }
}
