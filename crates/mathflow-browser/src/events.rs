//! Event wiring.
//!
//! Three sources drive the engine:
//! - `keydown` in the capture phase on the document, so the Backspace merge
//!   guard runs before the outliner's own handler; the rest of the key's
//!   work is deferred a tick
//! - `focusin`/`focusout` on the document, deferred a tick
//! - a `MutationObserver` over the body's subtree
//!
//! The outliner updates its model after its own key handlers return, so
//! anything that reads focus waits for a zero-delay timeout.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use mathflow_core::{Engine, HostLayout, Key, KeyInput, MutationRecord};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, KeyboardEvent, MutationObserver, MutationObserverInit, Node};

use crate::dom::BrowserDom;
use crate::error::SetupError;
use crate::host::WfOutline;
use crate::katex::{AsciiMathParser, BrowserRenderer};

pub type BrowserEngine = Engine<BrowserDom, WfOutline, BrowserRenderer, AsciiMathParser>;

/// Emptied on stop so that ticks already queued find nothing to run.
type SharedEngine = Rc<RefCell<Option<BrowserEngine>>>;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// Run `f` after the current event has finished dispatching.
pub fn defer(f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(f);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        0,
    );
    closure.forget();
}

/// Run `f` against the engine unless it was stopped or a handler further up
/// the stack holds it.
fn with_engine<R>(engine: &SharedEngine, f: impl FnOnce(&mut BrowserEngine) -> R) -> Option<R> {
    match engine.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(f),
        Err(_) => {
            tracing::warn!("engine busy, dropping event");
            None
        }
    }
}

/// Characters between the start of `content` and a collapsed caret inside it.
pub fn caret_offset(document: &Document, content: &Node) -> Option<usize> {
    let selection = document.get_selection().ok()??;
    if !selection.is_collapsed() {
        return None;
    }
    let anchor = selection.anchor_node()?;
    if !content.contains(Some(&anchor)) {
        return None;
    }
    let range = document.create_range().ok()?;
    range.set_start(content, 0).ok()?;
    range.set_end(&anchor, selection.anchor_offset()).ok()?;
    Some(range.to_string().length() as usize)
}

/// Describe a keydown for the engine.
fn key_input(dom: &BrowserDom, layout: &HostLayout, event: &KeyboardEvent) -> KeyInput {
    let mut input = KeyInput::new(Key::from_name(&event.key()));
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
        return input;
    };
    input.item = layout.item_id_of(dom, &target);
    if input.key == Key::Backspace
        && let Some(content) = layout.enclosing_content(dom, &target)
    {
        input.caret_offset = caret_offset(dom.document(), &content.node);
        input.content = content.kind;
    }
    input
}

fn convert_records(records: &js_sys::Array) -> Vec<MutationRecord<Node>> {
    records
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::MutationRecord>().ok())
        .filter(|record| record.type_() == "childList")
        .filter_map(|record| {
            let target = record.target()?;
            let list = record.added_nodes();
            let added = (0..list.length()).filter_map(|i| list.item(i)).collect();
            Some(MutationRecord::new(target, added))
        })
        .collect()
}

/// Live event wiring for one engine. Dropping it detaches everything.
pub struct Dispatcher {
    engine: SharedEngine,
    listeners: Vec<EventListener>,
    observer: Option<(MutationObserver, ObserverCallback)>,
}

impl Dispatcher {
    /// Attach listeners to `document` and start observing `root`.
    pub fn install(
        engine: BrowserEngine,
        document: &Document,
        root: &Node,
        layout: HostLayout,
    ) -> Result<Self, SetupError> {
        let engine = Rc::new(RefCell::new(Some(engine)));
        let mut listeners = Vec::with_capacity(3);

        listeners.push({
            let engine = engine.clone();
            EventListener::new_with_options(
                document,
                "keydown",
                EventListenerOptions::run_in_capture_phase(),
                move |event| {
                    let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                        return;
                    };
                    let key = with_engine(&engine, |engine| {
                        let input = key_input(engine.dom(), &layout, event);
                        engine.on_key_down(&input);
                        input.key
                    });
                    let Some(key) = key else {
                        return;
                    };
                    let engine = engine.clone();
                    defer(move || {
                        with_engine(&engine, |engine| engine.on_deferred_key(key));
                    });
                },
            )
        });

        for event_type in ["focusin", "focusout"] {
            let engine = engine.clone();
            listeners.push(EventListener::new(document, event_type, move |_| {
                let engine = engine.clone();
                defer(move || {
                    with_engine(&engine, |engine| engine.on_focus_change());
                });
            }));
        }

        let callback: ObserverCallback = {
            let engine = engine.clone();
            Closure::new(move |records: js_sys::Array, _observer: MutationObserver| {
                let records = convert_records(&records);
                if records.is_empty() {
                    return;
                }
                with_engine(&engine, |engine| {
                    let outcome = engine.on_mutations(&records);
                    tracing::trace!(?outcome, "mutation batch");
                });
            })
        };
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| SetupError::js("create MutationObserver", &e))?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(root, &init)
            .map_err(|e| SetupError::js("observe document", &e))?;

        tracing::debug!("event wiring installed");
        Ok(Self {
            engine,
            listeners,
            observer: Some((observer, callback)),
        })
    }

    /// Run `f` against the engine; `None` once stopped.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut BrowserEngine) -> R) -> Option<R> {
        with_engine(&self.engine, f)
    }

    pub fn is_running(&self) -> bool {
        self.engine.try_borrow().map_or(true, |slot| slot.is_some())
    }

    /// Detach listeners, stop observing, and hand the document back raw.
    pub fn stop(&mut self) {
        self.disconnect();
        self.listeners.clear();
        let stopped = self
            .engine
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(engine) = stopped {
            engine.restore_all();
            engine.dom().clear_bindings();
            tracing::debug!("event wiring removed");
        }
    }

    fn disconnect(&mut self) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // The callback must outlive the observer's last delivery.
        self.disconnect();
    }
}
