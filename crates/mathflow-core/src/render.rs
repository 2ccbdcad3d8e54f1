//! Math rendering over a DOM subtree.
//!
//! [`MathRenderer`] is the seam for the external renderer (KaTeX auto-render
//! in the browser). [`MathmlRenderer`] is a native implementation backed by
//! `pulldown-latex` that produces the same block shape, so the raw extractor
//! treats both alike:
//!
//! ```text
//! span.katex-display            (display math only)
//!   span.katex
//!     math > semantics > (mrow | merror) + annotation[encoding=application/x-tex]
//! ```

use pulldown_latex::{
    Parser, Storage, config::DisplayMode, config::RenderConfig, mathml::push_mathml,
};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::delimiters::DelimiterConfig;
use crate::dom::{Dom, MATHML_NAMESPACE};

pub const KATEX_CLASS: &str = "katex";
pub const KATEX_DISPLAY_CLASS: &str = "katex-display";
pub const KATEX_ERROR_CLASS: &str = "katex-error";
pub const KATEX_MATHML_CLASS: &str = "katex-mathml";
pub const KATEX_HTML_CLASS: &str = "katex-html";
pub const ANNOTATION_TAG: &str = "annotation";
pub const TEX_ENCODING: &str = "application/x-tex";

/// Tags whose text is never treated as math.
pub const IGNORED_TAGS: &[&str] = &[
    "script", "noscript", "style", "textarea", "pre", "code", "option",
];

/// Options handed to the renderer on every invocation.
///
/// Serializes to the option object KaTeX auto-render accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub delimiters: DelimiterConfig,
    /// When false, malformed math renders as an error placeholder.
    pub throw_on_error: bool,
    pub strict: bool,
    /// Subtrees carrying these classes are skipped, which keeps re-rendering
    /// from wrapping already rendered math twice.
    pub ignored_classes: Vec<SmolStr>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            delimiters: DelimiterConfig::default(),
            throw_on_error: false,
            strict: false,
            ignored_classes: vec![
                SmolStr::new_static(KATEX_CLASS),
                SmolStr::new_static(KATEX_DISPLAY_CLASS),
                SmolStr::new_static(KATEX_ERROR_CLASS),
            ],
        }
    }
}

/// Renders delimited math found in the plain text nodes under `root`.
///
/// Implementations mutate the subtree in place and never fail: malformed
/// math becomes an error placeholder, not an error.
pub trait MathRenderer<D: Dom> {
    fn render(&self, dom: &D, root: &D::Node, options: &RenderOptions);
}

/// A piece of text split at math delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Math {
        /// TeX between the delimiters.
        source: &'a str,
        /// Source including delimiters.
        raw: &'a str,
        display: bool,
    },
}

/// Find the byte index of `right` at brace depth zero, skipping escaped characters.
fn find_end_of_math(text: &str, start: usize, right: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let right = right.as_bytes();
    let mut depth = 0i32;
    let mut index = start;
    while index < bytes.len() {
        if depth <= 0 && bytes[index..].starts_with(right) {
            return Some(index);
        }
        match bytes[index] {
            b'\\' => index += 1,
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        index += 1;
    }
    None
}

/// Split text into plain and math segments.
///
/// At each position the delimiters are tried in configured order; a left
/// delimiter without a matching right one, or with nothing between them, is
/// plain text.
pub fn split_delimited<'a>(text: &'a str, delimiters: &DelimiterConfig) -> Vec<Segment<'a>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let matched = delimiters.iter().find_map(|d| {
            if !bytes[index..].starts_with(d.left.as_bytes()) {
                return None;
            }
            let content_start = index + d.left.len();
            let end = find_end_of_math(text, content_start, &d.right)?;
            (end > content_start).then_some((d, content_start, end))
        });

        match matched {
            Some((d, content_start, end)) => {
                if text_start < index {
                    segments.push(Segment::Text(&text[text_start..index]));
                }
                let close = end + d.right.len();
                segments.push(Segment::Math {
                    source: &text[content_start..end],
                    raw: &text[index..close],
                    display: d.display,
                });
                index = close;
                text_start = close;
            }
            None => {
                // An escaped character never opens math.
                let step = if bytes[index] == b'\\' { 2 } else { 1 };
                index += step;
                while index < bytes.len() && !text.is_char_boundary(index) {
                    index += 1;
                }
            }
        }
    }

    if text_start < bytes.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }
    segments
}

/// Render TeX to the inner markup of a `<math>` element.
///
/// The error carries the parser's messages joined together.
pub fn render_mathml(latex: &str, display: bool) -> Result<String, String> {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config).map_err(|e| e.to_string())?;

    // Strip the outer <math ...> wrapper; the caller builds its own.
    let body_start = mathml.find('>').map(|i| i + 1).unwrap_or(0);
    let body = mathml[body_start..]
        .strip_suffix("</math>")
        .unwrap_or(&mathml[body_start..]);
    Ok(body.to_string())
}

/// Native renderer producing MathML with a TeX annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathmlRenderer;

impl MathmlRenderer {
    fn build<D: Dom>(&self, dom: &D, source: &str, display: bool) -> D::Node {
        let katex = dom.create_element("span");
        dom.add_class(&katex, KATEX_CLASS);

        let math = dom.create_element_ns(MATHML_NAMESPACE, "math");
        dom.set_attribute(&math, "display", if display { "block" } else { "inline" });
        let semantics = dom.create_element_ns(MATHML_NAMESPACE, "semantics");

        match render_mathml(source, display) {
            Ok(body) => {
                let mrow = dom.create_element_ns(MATHML_NAMESPACE, "mrow");
                dom.set_inner_html(&mrow, &body);
                dom.append_child(&semantics, &mrow);
            }
            Err(message) => {
                tracing::debug!(%source, %message, "rendering error placeholder");
                dom.add_class(&katex, KATEX_ERROR_CLASS);
                dom.set_attribute(&katex, "title", &message);
                let merror = dom.create_element_ns(MATHML_NAMESPACE, "merror");
                let mtext = dom.create_element_ns(MATHML_NAMESPACE, "mtext");
                dom.set_text_content(&mtext, source);
                dom.append_child(&merror, &mtext);
                dom.append_child(&semantics, &merror);
            }
        }

        let annotation = dom.create_element_ns(MATHML_NAMESPACE, ANNOTATION_TAG);
        dom.set_attribute(&annotation, "encoding", TEX_ENCODING);
        dom.set_text_content(&annotation, source);
        dom.append_child(&semantics, &annotation);
        dom.append_child(&math, &semantics);
        dom.append_child(&katex, &math);

        if display {
            let wrapper = dom.create_element("span");
            dom.add_class(&wrapper, KATEX_DISPLAY_CLASS);
            dom.append_child(&wrapper, &katex);
            wrapper
        } else {
            katex
        }
    }
}

/// Plain text nodes under `root`, skipping ignored tags and classes.
pub fn plain_text_nodes<D: Dom>(dom: &D, root: &D::Node, options: &RenderOptions) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        for child in dom.children(&node).into_iter().rev() {
            if dom.is_text(&child) {
                out.push(child);
                continue;
            }
            let ignored_tag = dom
                .tag_name(&child)
                .is_some_and(|tag| IGNORED_TAGS.contains(&tag.as_str()));
            let ignored_class = options
                .ignored_classes
                .iter()
                .any(|class| dom.has_class(&child, class));
            if !ignored_tag && !ignored_class {
                stack.push(child);
            }
        }
    }
    out
}

impl<D: Dom> MathRenderer<D> for MathmlRenderer {
    fn render(&self, dom: &D, root: &D::Node, options: &RenderOptions) {
        for node in plain_text_nodes(dom, root, options) {
            let text = dom.text_content(&node);
            let segments = split_delimited(&text, &options.delimiters);
            if !segments.iter().any(|s| matches!(s, Segment::Math { .. })) {
                continue;
            }
            let Some(parent) = dom.parent(&node) else {
                continue;
            };

            for segment in segments {
                let replacement = match segment {
                    Segment::Text(plain) => dom.create_text(plain),
                    Segment::Math { source, raw, display } => {
                        if options.throw_on_error && render_mathml(source, display).is_err() {
                            tracing::warn!(%raw, "leaving malformed math unrendered");
                            dom.create_text(raw)
                        } else {
                            self.build(dom, source, display)
                        }
                    }
                };
                dom.insert_before(&parent, &replacement, Some(&node));
            }
            dom.remove(&node);
        }
    }
}
