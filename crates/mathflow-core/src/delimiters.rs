//! Math delimiter configuration.
//!
//! The delimiter list is shared by the detector, the native renderer, and
//! the options handed to the external KaTeX auto-render function, so the
//! serialized shape matches what auto-render expects (`{left, right, display}`).

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Canonical inline delimiter used when reconstructing source.
pub const INLINE_DELIMITER: &str = "$";

/// Canonical display delimiter used when reconstructing source.
pub const DISPLAY_DELIMITER: &str = "$$";

/// A single left/right delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiter {
    pub left: SmolStr,
    pub right: SmolStr,
    /// Render as display (block) math.
    pub display: bool,
}

impl Delimiter {
    pub fn new(left: impl Into<SmolStr>, right: impl Into<SmolStr>, display: bool) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            display,
        }
    }

    /// True for the `\(..\)` / `\[..\]` family.
    pub fn is_bracket(&self) -> bool {
        self.left.starts_with('\\')
    }
}

/// Ordered set of recognized delimiters.
///
/// Order matters: at any position the first listed delimiter whose left
/// side matches wins, so `$$` must precede `$`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelimiterConfig {
    delimiters: Vec<Delimiter>,
}

impl DelimiterConfig {
    pub fn new(delimiters: Vec<Delimiter>) -> Self {
        Self { delimiters }
    }

    /// Only the `$$..$$` and `$..$` pairs.
    pub fn dollars_only() -> Self {
        Self::new(vec![
            Delimiter::new("$$", "$$", true),
            Delimiter::new("$", "$", false),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delimiter> {
        self.delimiters.iter()
    }

    pub fn as_slice(&self) -> &[Delimiter] {
        &self.delimiters
    }

    /// Whether any bracket-style delimiter is configured.
    pub fn has_brackets(&self) -> bool {
        self.delimiters.iter().any(Delimiter::is_bracket)
    }

    pub fn is_empty(&self) -> bool {
        self.delimiters.is_empty()
    }
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self::new(vec![
            Delimiter::new("$$", "$$", true),
            Delimiter::new("$", "$", false),
            Delimiter::new("\\(", "\\)", false),
            Delimiter::new("\\[", "\\]", true),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_puts_display_dollars_first() {
        let config = DelimiterConfig::default();
        let first = config.iter().next().unwrap();
        assert_eq!(first.left, "$$");
        assert!(first.display);
        assert!(config.has_brackets());
    }

    #[test]
    fn test_dollars_only_has_no_brackets() {
        assert!(!DelimiterConfig::dollars_only().has_brackets());
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let json = serde_json::to_value(DelimiterConfig::dollars_only()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"left": "$$", "right": "$$", "display": true},
                {"left": "$", "right": "$", "display": false},
            ])
        );
    }
}
