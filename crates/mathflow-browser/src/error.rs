//! Setup failures.
//!
//! Anything that goes wrong while a session is running is contained and
//! logged by the engine; only starting up can fail.

use mathflow_core::ConfigError;
use wasm_bindgen::{JsCast, JsValue};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("no global window")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("document has no body")]
    NoBody,
    #[error("stylesheet must be a string")]
    StylesheetNotText,
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("{context}: {message}")]
    Js {
        context: &'static str,
        message: String,
    },
}

impl SetupError {
    pub(crate) fn js(context: &'static str, value: &JsValue) -> Self {
        SetupError::Js {
            context,
            message: js_message(value),
        }
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

