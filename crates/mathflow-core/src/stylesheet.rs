//! Font URL rewriting for the renderer stylesheet.
//!
//! The stylesheet ships with font references relative to its own location,
//! which means nothing once it is injected inline into the host page.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#).unwrap()
});

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());

/// Whether a CSS url already resolves on its own.
fn is_absolute(url: &str) -> bool {
    url.is_empty() || url.starts_with('/') || url.starts_with('#') || SCHEME_RE.is_match(url)
}

fn join(base: &str, relative: &str) -> String {
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    if base.ends_with('/') {
        format!("{base}{relative}")
    } else {
        format!("{base}/{relative}")
    }
}

/// Resolve every relative `url(...)` in `css` against `base`.
///
/// Absolute, root-relative, `data:` and fragment urls are left as written,
/// as is the quoting style.
pub fn rewrite_font_urls<'a>(css: &'a str, base: &str) -> Cow<'a, str> {
    CSS_URL_RE.replace_all(css, |caps: &Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let (url, quote) = if let Some(m) = caps.get(1) {
            (m.as_str(), "\"")
        } else if let Some(m) = caps.get(2) {
            (m.as_str(), "'")
        } else if let Some(m) = caps.get(3) {
            (m.as_str(), "")
        } else {
            return whole.to_string();
        };
        if is_absolute(url) {
            return whole.to_string();
        }
        format!("url({quote}{}{quote})", join(base, url))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example.net/katex/0.16";

    #[test]
    fn test_relative_fonts_are_resolved() {
        let css = "@font-face{src:url(fonts/KaTeX_Main-Regular.woff2) format('woff2'),\
                   url(\"./fonts/KaTeX_Main-Regular.woff\") format('woff')}";
        insta::assert_snapshot!(rewrite_font_urls(css, BASE), @r#"@font-face{src:url(https://cdn.example.net/katex/0.16/fonts/KaTeX_Main-Regular.woff2) format('woff2'),url("https://cdn.example.net/katex/0.16/fonts/KaTeX_Main-Regular.woff") format('woff')}"#);
    }

    #[test]
    fn test_absolute_urls_untouched() {
        let css = "a{background:url(data:image/png;base64,AAAA)}\
                   b{src:url('/fonts/x.woff')}\
                   c{src:url(https://other.example/x.ttf)}\
                   d{filter:url(#blur)}";
        assert_eq!(rewrite_font_urls(css, BASE), css);
    }

    #[test]
    fn test_trailing_slash_base_and_single_quotes() {
        let out = rewrite_font_urls("x{src:url( 'f.ttf' )}", "https://h.example/a/");
        assert_eq!(out, "x{src:url('https://h.example/a/f.ttf')}");
    }

    #[test]
    fn test_no_urls_borrows() {
        let css = ".katex{font-size:1.21em}";
        assert!(matches!(rewrite_font_urls(css, BASE), Cow::Borrowed(_)));
    }
}
