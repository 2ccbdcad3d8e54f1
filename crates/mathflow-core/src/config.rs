//! Engine configuration, as passed in from JavaScript.

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::delimiters::DelimiterConfig;
use crate::host::HostLayout;
use crate::render::RenderOptions;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one math delimiter is required")]
    NoDelimiters,
    #[error("delimiter {index} has an empty side")]
    EmptyDelimiter { index: usize },
    #[error("unknown log level `{0}`")]
    LogLevel(String),
}

/// Which renderer turns delimited TeX into markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// KaTeX auto-render, loaded by the page.
    #[default]
    Katex,
    /// Built-in MathML output.
    Mathml,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub delimiters: DelimiterConfig,
    pub layout: HostLayout,
    pub renderer: RendererKind,
    pub throw_on_error: bool,
    pub strict: bool,
    /// CSS text to install on start.
    pub stylesheet: Option<String>,
    /// Absolute URL relative font references are resolved against.
    pub asset_base: Option<String>,
    pub log_level: Option<String>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiters.is_empty() {
            return Err(ConfigError::NoDelimiters);
        }
        if let Some(index) = self
            .delimiters
            .iter()
            .position(|d| d.left.is_empty() || d.right.is_empty())
        {
            return Err(ConfigError::EmptyDelimiter { index });
        }
        self.max_level().map(|_| ())
    }

    /// Configured log level, `DEBUG` in debug builds and `INFO` otherwise.
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        match &self.log_level {
            Some(level) => level
                .parse()
                .map_err(|_| ConfigError::LogLevel(level.clone())),
            None if cfg!(debug_assertions) => Ok(Level::DEBUG),
            None => Ok(Level::INFO),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            delimiters: self.delimiters.clone(),
            throw_on_error: self.throw_on_error,
            strict: self.strict,
            ..Default::default()
        }
    }
}
