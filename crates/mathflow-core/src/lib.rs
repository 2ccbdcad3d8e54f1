//! mathflow-core: raw/rendered math synchronization for outline items.
//!
//! This crate provides:
//! - `Dom` adapter trait and the `MemoryDom` / `MemoryOutline` test doubles
//! - Math span detection, AsciiMath conversion, rendering and raw extraction
//! - `ContainerSync` for the rendered sibling of each content element
//! - `FocusTracker` and `Engine`, the reducer both event producers feed
//!
//! Nothing here depends on a browser; `mathflow-browser` supplies the
//! web-sys side.

pub mod config;
pub mod container;
pub mod convert;
pub mod delimiters;
pub mod detect;
pub mod dispatch;
pub mod dom;
pub mod extract;
pub mod focus;
pub mod host;
pub mod memory;
pub mod render;
pub mod stylesheet;
pub mod visibility;
pub mod watch;

pub use config::{ConfigError, EngineConfig, RendererKind};
pub use container::{CONTAINER_CLASS, ContainerSync, MARKER_CLASS, SyncOutcome};
pub use convert::{AsciiMathTranslator, ConvertError, TranslateError, convert_to_latex};
pub use delimiters::{Delimiter, DelimiterConfig};
pub use detect::{has_ascii_math, has_latex, has_latex_with, has_math};
pub use dispatch::{BatchOutcome, Engine, Key, KeyInput};
pub use dom::{ContentElement, ContentKind, Dom};
pub use extract::{ExtractReport, to_raw_source};
pub use focus::{FocusState, FocusTracker, Transition, Trigger};
pub use host::{HostLayout, HostOutline, ItemId};
pub use memory::{MemoryDom, MemoryOutline, NodeId};
pub use render::{MathRenderer, MathmlRenderer, RenderOptions, Segment, split_delimited};
pub use smol_str::SmolStr;
pub use stylesheet::rewrite_font_urls;
pub use visibility::{HIDDEN_CLASS, Representation, show_raw, show_rendered};
pub use watch::{MutationRecord, MutationWatcher};
