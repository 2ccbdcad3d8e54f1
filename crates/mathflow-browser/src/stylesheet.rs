//! Stylesheet installation.

use mathflow_core::rewrite_font_urls;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlStyleElement};

use crate::error::SetupError;

/// Attribute marking the engine's `<style>` element.
pub const STYLE_MARKER: &str = "data-mathflow";

/// Inject `css` as a `<style>` element, resolving relative font urls
/// against `asset_base` when given.
///
/// `css` comes straight from script, so anything but a string is refused.
pub fn install_stylesheet(
    document: &Document,
    css: &JsValue,
    asset_base: Option<&str>,
) -> Result<HtmlStyleElement, SetupError> {
    let Some(css) = css.as_string() else {
        tracing::error!("stylesheet is not text");
        return Err(SetupError::StylesheetNotText);
    };
    let text = match asset_base {
        Some(base) => rewrite_font_urls(&css, base).into_owned(),
        None => css,
    };

    let style = document
        .create_element("style")
        .map_err(|e| SetupError::js("create style element", &e))?
        .dyn_into::<HtmlStyleElement>()
        .map_err(|e| SetupError::js("create style element", &e))?;
    let _ = style.set_attribute(STYLE_MARKER, "");
    style.set_text_content(Some(&text));

    let parent: Element = match document.head() {
        Some(head) => head.into(),
        None => document.document_element().ok_or(SetupError::NoDocument)?,
    };
    parent
        .append_child(&style)
        .map_err(|e| SetupError::js("append stylesheet", &e))?;
    tracing::debug!(bytes = text.len(), "installed stylesheet");
    Ok(style)
}
