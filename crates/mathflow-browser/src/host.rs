//! Bindings to the outliner's global `WF` API.
//!
//! Every call is made with `catch`: before the outliner has loaded, `WF`
//! is undefined and the call throws. A throw or a `null` result reads as
//! "nothing there".

use mathflow_core::{HostOutline, ItemId};
use wasm_bindgen::prelude::*;
use web_sys::{Element, Node};

#[wasm_bindgen]
extern "C" {
    /// An outline item handle.
    pub type WfItem;

    #[wasm_bindgen(js_namespace = WF, js_name = currentItem, catch)]
    fn wf_current_item() -> Result<Option<WfItem>, JsValue>;

    #[wasm_bindgen(js_namespace = WF, js_name = focusedItem, catch)]
    fn wf_focused_item() -> Result<Option<WfItem>, JsValue>;

    #[wasm_bindgen(js_namespace = WF, js_name = getItemById, catch)]
    fn wf_get_item_by_id(id: &str) -> Result<Option<WfItem>, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getId)]
    fn get_id(this: &WfItem) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getElement)]
    fn get_element(this: &WfItem) -> Result<Option<Element>, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getPreviousVisibleSibling)]
    fn get_previous_visible_sibling(this: &WfItem) -> Result<Option<WfItem>, JsValue>;
}

fn settle<T>(call: &'static str, result: Result<Option<T>, JsValue>) -> Option<T> {
    result.unwrap_or_else(|e| {
        tracing::trace!(call, error = ?e, "host call threw");
        None
    })
}

fn item_id(item: &WfItem) -> Option<ItemId> {
    settle("getId", item.get_id().map(|id| id.as_string()))
        .map(ItemId::from)
}

fn item(id: &ItemId) -> Option<WfItem> {
    settle("getItemById", wf_get_item_by_id(id.as_str()))
}

/// The live outliner, reached through `window.WF`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WfOutline;

impl HostOutline for WfOutline {
    type Node = Node;

    fn current_item(&self) -> Option<ItemId> {
        item_id(&settle("currentItem", wf_current_item())?)
    }

    fn focused_item(&self) -> Option<ItemId> {
        item_id(&settle("focusedItem", wf_focused_item())?)
    }

    fn item_element(&self, id: &ItemId) -> Option<Node> {
        settle("getElement", item(id)?.get_element()).map(Node::from)
    }

    fn previous_visible_sibling(&self, id: &ItemId) -> Option<ItemId> {
        let sibling = settle(
            "getPreviousVisibleSibling",
            item(id)?.get_previous_visible_sibling(),
        )?;
        item_id(&sibling)
    }
}
