//! Start and stop the engine on the live page.

use mathflow_core::{ContainerSync, Engine, EngineConfig};
use wasm_bindgen::JsValue;
use web_sys::{HtmlStyleElement, Node};

use crate::dom::BrowserDom;
use crate::error::SetupError;
use crate::events::Dispatcher;
use crate::host::WfOutline;
use crate::katex::{AsciiMathParser, BrowserRenderer};
use crate::stylesheet::install_stylesheet;

/// A running engine: stylesheet, initial render, and event wiring.
pub struct Session {
    dispatcher: Dispatcher,
    stylesheet: Option<HtmlStyleElement>,
}

impl Session {
    pub fn start(config: &EngineConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let window = web_sys::window().ok_or(SetupError::NoWindow)?;
        let document = window.document().ok_or(SetupError::NoDocument)?;
        let body: Node = document.body().ok_or(SetupError::NoBody)?.into();

        let stylesheet = config
            .stylesheet
            .as_deref()
            .map(|css| {
                install_stylesheet(
                    &document,
                    &JsValue::from_str(css),
                    config.asset_base.as_deref(),
                )
            })
            .transpose()?;

        let sync = ContainerSync::new(
            BrowserRenderer::from(config.renderer),
            AsciiMathParser,
            config.layout.clone(),
            config.render_options(),
        );
        let dom = BrowserDom::new(document.clone());
        let engine = Engine::new(dom, WfOutline, body.clone(), sync);

        // Nothing is rendered until events are wired.
        let dispatcher = Dispatcher::install(engine, &document, &body, config.layout.clone())
            .inspect_err(|_| {
                if let Some(style) = &stylesheet {
                    style.remove();
                }
            })?;
        let rendered = dispatcher
            .with_engine(|engine| engine.render_all())
            .unwrap_or_default();
        tracing::info!(rendered, renderer = ?config.renderer, "mathflow started");
        Ok(Self {
            dispatcher,
            stylesheet,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.is_running()
    }

    /// Detach from the page and remove everything the engine added.
    pub fn stop(&mut self) {
        self.dispatcher.stop();
        if let Some(style) = self.stylesheet.take() {
            style.remove();
        }
        tracing::info!("mathflow stopped");
    }
}
