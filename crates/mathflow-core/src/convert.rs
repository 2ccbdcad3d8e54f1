//! AsciiMath to LaTeX source conversion.
//!
//! Only the backtick-delimited spans are rewritten; everything else passes
//! through byte-for-byte. The AsciiMath grammar itself lives behind
//! [`AsciiMathTranslator`] and is provided by the consuming platform.

use std::borrow::Cow;

use crate::delimiters::INLINE_DELIMITER;
use crate::detect::ASCIIMATH_SPAN_RE;

/// Error reported by an AsciiMath translator for malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TranslateError(pub String);

impl From<&str> for TranslateError {
    fn from(message: &str) -> Self {
        TranslateError(message.to_owned())
    }
}

/// Failure converting an element's markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("could not translate asciimath `{input}`")]
    Translation {
        input: String,
        #[source]
        source: TranslateError,
    },
}

/// Opaque AsciiMath grammar: one expression in, LaTeX out.
pub trait AsciiMathTranslator {
    fn translate(&self, asciimath: &str) -> Result<String, TranslateError>;
}

/// Unit type implementation - spans are treated as LaTeX verbatim.
impl AsciiMathTranslator for () {
    fn translate(&self, asciimath: &str) -> Result<String, TranslateError> {
        Ok(asciimath.to_string())
    }
}

impl<T: AsciiMathTranslator> AsciiMathTranslator for &T {
    fn translate(&self, asciimath: &str) -> Result<String, TranslateError> {
        (*self).translate(asciimath)
    }
}

/// Rewrite every backtick span into `$..$` LaTeX.
///
/// Returns the input borrowed when there is nothing to convert.
pub fn convert_to_latex<'a, T: AsciiMathTranslator>(
    markup: &'a str,
    translator: &T,
) -> Result<Cow<'a, str>, ConvertError> {
    if !ASCIIMATH_SPAN_RE.is_match(markup) {
        return Ok(Cow::Borrowed(markup));
    }

    let mut out = String::with_capacity(markup.len() + 16);
    let mut last = 0;
    for caps in ASCIIMATH_SPAN_RE.captures_iter(markup) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let latex = translator
            .translate(inner.as_str())
            .map_err(|source| ConvertError::Translation {
                input: inner.as_str().to_string(),
                source,
            })?;
        out.push_str(&markup[last..whole.start()]);
        out.push_str(INLINE_DELIMITER);
        out.push_str(&latex);
        out.push_str(INLINE_DELIMITER);
        last = whole.end();
    }
    out.push_str(&markup[last..]);

    Ok(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl AsciiMathTranslator for Upper {
        fn translate(&self, asciimath: &str) -> Result<String, TranslateError> {
            if asciimath.contains('(') && !asciimath.contains(')') {
                return Err("unbalanced paren".into());
            }
            Ok(asciimath.replace("sqrt", "\\sqrt"))
        }
    }

    #[test]
    fn test_converts_backtick_span() {
        let out = convert_to_latex("a `x^2` b", &()).unwrap();
        assert_eq!(out, "a $x^2$ b");
    }

    #[test]
    fn test_uses_translator() {
        let out = convert_to_latex("root `sqrt x` and `y`", &Upper).unwrap();
        assert_eq!(out, "root $\\sqrt x$ and $y$");
    }

    #[test]
    fn test_passthrough_is_borrowed() {
        let text = "nothing to do $x$ here";
        let out = convert_to_latex(text, &Upper).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, text);
    }

    #[test]
    fn test_text_outside_ticks_is_untouched() {
        let text = "  lead\n`a`\t<b>&amp; `b` tail ";
        let out = convert_to_latex(text, &()).unwrap();
        assert_eq!(out, "  lead\n$a$\t<b>&amp; $b$ tail ");
    }

    #[test]
    fn test_translation_failure_propagates() {
        let err = convert_to_latex("bad `f(x` here", &Upper).unwrap_err();
        let ConvertError::Translation { input, source } = err;
        assert_eq!(input, "f(x");
        assert_eq!(source, TranslateError::from("unbalanced paren"));
    }

    #[test]
    fn test_translation_error_chain() {
        let err = convert_to_latex("`g(` only", &Upper).unwrap_err();
        assert_eq!(err.to_string(), "could not translate asciimath `g(`");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("unbalanced paren"));
    }
}
