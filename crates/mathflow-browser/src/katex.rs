//! KaTeX auto-render and AsciiMath bindings.
//!
//! Both libraries are expected as page globals (`renderMathInElement` from
//! KaTeX's auto-render extension, `AMTparseAMtoTeX` from ASCIIMathTeXImg).

use mathflow_core::{
    AsciiMathTranslator, Delimiter, MathRenderer, MathmlRenderer, RenderOptions, RendererKind,
    SmolStr, TranslateError,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Node};

use crate::dom::BrowserDom;
use crate::error::js_message;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = renderMathInElement, catch)]
    fn render_math_in_element(element: &Element, options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = AMTparseAMtoTeX, catch)]
    fn amt_parse_am_to_tex(asciimath: &str) -> Result<JsValue, JsValue>;
}

/// Option object for `renderMathInElement`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AutoRenderOptions<'a> {
    delimiters: &'a [Delimiter],
    throw_on_error: bool,
    strict: bool,
    ignored_classes: &'a [SmolStr],
    /// Keep the MathML half; it carries the annotation the extractor reads.
    output: &'static str,
}

impl<'a> From<&'a RenderOptions> for AutoRenderOptions<'a> {
    fn from(options: &'a RenderOptions) -> Self {
        Self {
            delimiters: options.delimiters.as_slice(),
            throw_on_error: options.throw_on_error,
            strict: options.strict,
            ignored_classes: &options.ignored_classes,
            output: "htmlAndMathml",
        }
    }
}

/// Renders through KaTeX auto-render.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexRenderer;

impl MathRenderer<BrowserDom> for KatexRenderer {
    fn render(&self, _dom: &BrowserDom, root: &Node, options: &RenderOptions) {
        let Some(element) = root.dyn_ref::<Element>() else {
            return;
        };
        let js_options = match serde_wasm_bindgen::to_value(&AutoRenderOptions::from(options)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "could not build auto-render options");
                return;
            }
        };
        if let Err(e) = render_math_in_element(element, &js_options) {
            tracing::warn!(error = %js_message(&e), "renderMathInElement threw");
        }
    }
}

/// Renderer picked by configuration.
#[derive(Debug, Clone, Copy)]
pub enum BrowserRenderer {
    Katex(KatexRenderer),
    Mathml(MathmlRenderer),
}

impl From<RendererKind> for BrowserRenderer {
    fn from(kind: RendererKind) -> Self {
        match kind {
            RendererKind::Katex => BrowserRenderer::Katex(KatexRenderer),
            RendererKind::Mathml => BrowserRenderer::Mathml(MathmlRenderer),
        }
    }
}

impl MathRenderer<BrowserDom> for BrowserRenderer {
    fn render(&self, dom: &BrowserDom, root: &Node, options: &RenderOptions) {
        match self {
            BrowserRenderer::Katex(katex) => katex.render(dom, root, options),
            BrowserRenderer::Mathml(mathml) => mathml.render(dom, root, options),
        }
    }
}

/// AsciiMath grammar from the page's `AMTparseAMtoTeX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiMathParser;

impl AsciiMathTranslator for AsciiMathParser {
    fn translate(&self, asciimath: &str) -> Result<String, TranslateError> {
        let value = amt_parse_am_to_tex(asciimath).map_err(|e| TranslateError(js_message(&e)))?;
        value
            .as_string()
            .ok_or_else(|| TranslateError::from("translator returned a non-string"))
    }
}
