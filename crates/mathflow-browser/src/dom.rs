//! web-sys implementation of the engine's DOM adapter.
//!
//! Event bindings made through [`Dom::bind_focus_toggle`] and
//! [`Dom::bind_click_focus`] are gloo `EventListener`s held in a shared
//! registry; dropping a listener detaches it, so clearing a binding is just
//! removing it from the registry.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use mathflow_core::Dom;
use mathflow_core::visibility::{show_raw, show_rendered};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

#[derive(Default)]
struct Bindings {
    /// Row -> its focusin/focusout listeners.
    toggles: Vec<(Node, [EventListener; 2])>,
    /// Container -> its click listener.
    clicks: Vec<(Node, EventListener)>,
}

impl Bindings {
    /// Forget listeners whose node has left the document.
    fn prune(&mut self) {
        self.toggles.retain(|(node, _)| node.is_connected());
        self.clicks.retain(|(node, _)| node.is_connected());
    }
}

/// A document plus the engine's event bindings on it. Cloning shares both.
#[derive(Clone)]
pub struct BrowserDom {
    document: Document,
    bindings: Rc<RefCell<Bindings>>,
}

impl BrowserDom {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            bindings: Rc::new(RefCell::new(Bindings::default())),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of rows with a live focus toggle.
    pub fn toggle_count(&self) -> usize {
        self.bindings.borrow().toggles.len()
    }

    /// Detach every listener the engine bound.
    pub fn clear_bindings(&self) {
        let mut bindings = self.bindings.borrow_mut();
        bindings.toggles.clear();
        bindings.clicks.clear();
    }

    /// A view over the same document without a registry, for use inside
    /// listener callbacks.
    fn unbound(&self) -> Self {
        Self::new(self.document.clone())
    }
}

fn as_element(node: &Node) -> Option<&Element> {
    node.dyn_ref::<Element>()
}

impl Dom for BrowserDom {
    type Node = Node;

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn is_text(&self, node: &Node) -> bool {
        node.node_type() == Node::TEXT_NODE
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        as_element(node).map(|e| e.local_name().to_ascii_lowercase())
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Node, text: &str) {
        node.set_text_content(Some(text));
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        as_element(node)?.get_attribute(name)
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) {
        if let Some(element) = as_element(node) {
            let _ = element.set_attribute(name, value);
        }
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        as_element(node).is_some_and(|e| e.class_list().contains(class))
    }

    fn add_class(&self, node: &Node, class: &str) {
        if let Some(element) = as_element(node) {
            let _ = element.class_list().add_1(class);
        }
    }

    fn remove_class(&self, node: &Node, class: &str) {
        if let Some(element) = as_element(node) {
            let _ = element.class_list().remove_1(class);
        }
    }

    fn set_style(&self, node: &Node, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn create_element(&self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(element) => element.into(),
            Err(e) => {
                tracing::error!(tag, error = ?e, "create_element failed");
                // An empty fragment inserts nothing.
                self.document.create_document_fragment().into()
            }
        }
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Node {
        match self.document.create_element_ns(Some(namespace), tag) {
            Ok(element) => element.into(),
            Err(e) => {
                tracing::error!(tag, namespace, error = ?e, "create_element_ns failed");
                self.document.create_document_fragment().into()
            }
        }
    }

    fn create_text(&self, text: &str) -> Node {
        self.document.create_text_node(text).into()
    }

    fn set_inner_html(&self, node: &Node, html: &str) {
        if let Some(element) = as_element(node) {
            element.set_inner_html(html);
        }
    }

    fn append_child(&self, parent: &Node, child: &Node) {
        if let Err(e) = parent.append_child(child) {
            tracing::warn!(error = ?e, "append_child failed");
        }
    }

    fn insert_before(&self, parent: &Node, new: &Node, reference: Option<&Node>) {
        if let Err(e) = parent.insert_before(new, reference) {
            tracing::warn!(error = ?e, "insert_before failed");
        }
    }

    fn remove(&self, node: &Node) {
        if let Some(parent) = node.parent_node() {
            let _ = parent.remove_child(node);
        }
    }

    fn bind_focus_toggle(&self, parent: &Node, element: &Node, container: &Node) {
        self.clear_focus_toggle(parent);

        let focus_in = {
            let dom = self.unbound();
            let (element, container) = (element.clone(), container.clone());
            EventListener::new(parent, "focusin", move |_| {
                show_raw(&dom, &element, &container);
            })
        };
        let focus_out = {
            let dom = self.unbound();
            let (element, container) = (element.clone(), container.clone());
            EventListener::new(parent, "focusout", move |_| {
                show_rendered(&dom, &element, &container);
            })
        };

        let mut bindings = self.bindings.borrow_mut();
        bindings.prune();
        bindings.toggles.push((parent.clone(), [focus_in, focus_out]));
    }

    fn clear_focus_toggle(&self, parent: &Node) {
        self.bindings
            .borrow_mut()
            .toggles
            .retain(|(node, _)| node != parent);
    }

    fn bind_click_focus(&self, container: &Node, element: &Node) {
        let listener = {
            let dom = self.unbound();
            let target = container.clone();
            let element = element.clone();
            EventListener::new(container, "click", move |_| {
                show_raw(&dom, &element, &target);
                if let Some(html) = element.dyn_ref::<HtmlElement>()
                    && let Err(e) = html.focus()
                {
                    tracing::debug!(error = ?e, "could not focus raw element");
                }
            })
        };

        let mut bindings = self.bindings.borrow_mut();
        bindings.prune();
        bindings.clicks.retain(|(node, _)| node != container);
        bindings.clicks.push((container.clone(), listener));
    }
}
