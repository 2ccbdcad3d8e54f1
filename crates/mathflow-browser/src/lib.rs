//! Browser layer for mathflow.
//!
//! This crate provides the web-sys side of the engine. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `BrowserDom`, the `Dom` adapter over real nodes
//! - `host`: `WfOutline`, bindings to the outliner's `WF` global
//! - `katex`: KaTeX auto-render and AsciiMath bindings
//! - `events`: keydown/focus listeners and the mutation observer
//! - `stylesheet`: style injection with font url rewriting
//! - `session`: start/stop composition
//!
//! # Re-exports
//!
//! This crate re-exports `mathflow-core` for convenience, so consumers
//! only need to depend on `mathflow-browser`.

// Re-export core crate
pub use mathflow_core;
pub use mathflow_core::*;

pub mod dom;
pub mod error;
pub mod events;
pub mod host;
pub mod katex;
pub mod session;
pub mod stylesheet;

pub use dom::BrowserDom;
pub use error::{SetupError, js_message};
pub use events::{BrowserEngine, Dispatcher, caret_offset, defer};
pub use host::WfOutline;
pub use katex::{AsciiMathParser, BrowserRenderer, KatexRenderer};
pub use session::Session;
pub use stylesheet::{STYLE_MARKER, install_stylesheet};
