//! WASM bindings for mathflow.
//!
//! One engine per page. From script:
//!
//! ```js
//! import init, { start, stop } from "mathflow";
//! await init();
//! start({ renderer: "katex", stylesheet: katexCss, assetBase: KATEX_URL });
//! ```

use std::cell::RefCell;
use std::sync::Once;

use mathflow_browser::{EngineConfig, Session};
use tracing::Level;
use wasm_bindgen::prelude::*;

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

static LOGGING: Once = Once::new();

fn init_logging(level: Level) {
    LOGGING.call_once(|| {
        use tracing::subscriber::set_global_default;
        use tracing_subscriber::Registry;
        use tracing_subscriber::layer::SubscriberExt;

        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(level)
                .build(),
        );
        let _ = set_global_default(Registry::default().with(wasm_layer));
    });
}

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Start the engine, replacing any running one.
///
/// `config` may be omitted; every field has a default.
#[wasm_bindgen]
pub fn start(config: JsValue) -> Result<(), JsError> {
    let config: EngineConfig = if config.is_undefined() || config.is_null() {
        EngineConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
    };
    init_logging(config.max_level()?);

    stop();
    let session = Session::start(&config).inspect_err(|e| {
        tracing::error!(error = %e, "mathflow failed to start");
    })?;
    SESSION.with(|slot| *slot.borrow_mut() = Some(session));
    Ok(())
}

/// Stop the engine and restore the page. No-op when not running.
#[wasm_bindgen]
pub fn stop() {
    let session = SESSION.with(|slot| slot.borrow_mut().take());
    if let Some(mut session) = session {
        session.stop();
    }
}

#[wasm_bindgen(js_name = isRunning)]
pub fn is_running() -> bool {
    SESSION.with(|slot| slot.borrow().as_ref().is_some_and(Session::is_running))
}

/// Re-sync every content element in view. Returns how many have math.
#[wasm_bindgen(js_name = renderAll)]
pub fn render_all() -> u32 {
    SESSION.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|session| session.dispatcher().with_engine(|engine| engine.render_all()))
            .unwrap_or(0) as u32
    })
}

/// Install a stylesheet without starting the engine.
#[wasm_bindgen(js_name = installStylesheet)]
pub fn install_stylesheet(css: JsValue, asset_base: Option<String>) -> Result<(), JsError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsError::new("no document"))?;
    mathflow_browser::install_stylesheet(&document, &css, asset_base.as_deref())?;
    Ok(())
}
