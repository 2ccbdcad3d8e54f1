//! Math span detection.
//!
//! Pure single-pass checks over a content element's text. The `regex` crate
//! guarantees linear-time matching, so pathological runs of delimiters cannot
//! backtrack.

use std::sync::LazyLock;

use regex::Regex;

use crate::delimiters::DelimiterConfig;

/// `$..$` or `$$..$$` with at least one non-`$` character inside.
pub static DOLLAR_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$?[^$]+?\$\$?").unwrap());

/// `\(..\)` or `\[..\]`, spanning newlines.
pub static BRACKET_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\(.+?\\\)|\\\[.+?\\\]").unwrap());

/// A backtick pair with non-empty content.
pub static ASCIIMATH_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Does the text contain a `$`-delimited math span?
pub fn has_latex(text: &str) -> bool {
    DOLLAR_SPAN_RE.is_match(text)
}

/// Like [`has_latex`], additionally honoring bracket delimiters when the
/// config enables them.
pub fn has_latex_with(text: &str, delimiters: &DelimiterConfig) -> bool {
    let dollars = delimiters.iter().any(|d| d.left.starts_with('$'));
    (dollars && has_latex(text)) || (delimiters.has_brackets() && BRACKET_SPAN_RE.is_match(text))
}

/// Does the text contain a backtick-delimited AsciiMath span?
pub fn has_ascii_math(text: &str) -> bool {
    ASCIIMATH_SPAN_RE.is_match(text)
}

/// Either kind of math, as used to decide whether an element gets a container.
pub fn has_math(text: &str, delimiters: &DelimiterConfig) -> bool {
    has_latex_with(text, delimiters) || has_ascii_math(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_and_display_spans() {
        assert!(has_latex("area is $\\pi r^2$ here"));
        assert!(has_latex("$$\\int_0^1 x\\,dx$$"));
        assert!(has_latex("multi $a +\nb$ line"));
    }

    #[test]
    fn test_no_false_positives() {
        assert!(!has_latex(""));
        assert!(!has_latex("plain text"));
        assert!(!has_latex("costs $5"));
        assert!(!has_latex("$$"));
        assert!(!has_latex("$"));
        assert!(!has_ascii_math("a single ` tick"));
        assert!(!has_ascii_math("``"));
        assert!(!has_ascii_math(""));
    }

    #[test]
    fn test_ascii_math_spans() {
        assert!(has_ascii_math("a `x^2` b"));
        assert!(has_ascii_math("`sum_(i=1)^n\ni`"));
    }

    #[test]
    fn test_bracket_delimiters_follow_config() {
        let text = "see \\(x+1\\) and \\[y\\]";
        assert!(!has_latex(text));
        assert!(has_latex_with(text, &DelimiterConfig::default()));
        assert!(!has_latex_with(text, &DelimiterConfig::dollars_only()));
    }

    #[test]
    fn test_pathological_input_is_bounded() {
        let dollars = "$".repeat(200_000);
        assert!(!has_latex(&dollars));
        let ticks = "`".repeat(200_000);
        assert!(!has_ascii_math(&ticks));
        let nested = "\\(\\[".repeat(50_000);
        assert!(!has_latex_with(&nested, &DelimiterConfig::default()));
    }

    #[test]
    fn test_has_math_combines_both() {
        let config = DelimiterConfig::default();
        assert!(has_math("`x`", &config));
        assert!(has_math("$x$", &config));
        assert!(!has_math("nothing", &config));
    }
}
