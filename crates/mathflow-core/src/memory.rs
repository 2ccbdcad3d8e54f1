//! In-memory DOM and outline.
//!
//! `MemoryDom` is an arena-backed implementation of [`Dom`] with just enough
//! behavior for the engine: structure, classes, attributes, opaque inner HTML,
//! and recorded event bindings that can be fired by hand. `MemoryOutline`
//! lays out items the way the host outliner does so the engine can be driven
//! without a browser.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use markdown_weaver_escape::escape_html;

use crate::dom::Dom;
use crate::host::{HostLayout, HostOutline, ItemId};
use crate::visibility;

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        namespace: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    inner_html: Option<String>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            inner_html: None,
        }
    }
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<NodeData>,
    /// parent row -> (content element, container)
    toggles: HashMap<NodeId, (NodeId, NodeId)>,
    /// container -> content element
    click_targets: HashMap<NodeId, NodeId>,
    focused: Option<NodeId>,
}

impl Arena {
    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(id).inner_html = None;
    }

    fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: Option<NodeId>) {
        self.detach(new);
        let children = &mut self.node_mut(parent).children;
        let index = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(index, new);
        self.node_mut(new).parent = Some(parent);
    }

    fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element { .. } => self
                .node(id)
                .children
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Text(text) => {
                let _ = escape_html(&mut *out, text);
            }
            NodeKind::Element { tag, namespace } => {
                out.push('<');
                out.push_str(tag);
                if let (Some(ns), "math") = (namespace, tag.as_str()) {
                    out.push_str(" xmlns=\"");
                    out.push_str(ns);
                    out.push('"');
                }
                if !node.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&node.classes.join(" "));
                    out.push('"');
                }
                for (name, value) in &node.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    let _ = escape_html(&mut *out, value);
                    out.push('"');
                }
                if !node.styles.is_empty() {
                    let style: Vec<String> =
                        node.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    out.push_str(" style=\"");
                    out.push_str(&style.join("; "));
                    out.push('"');
                }
                out.push('>');
                if let Some(html) = &node.inner_html {
                    out.push_str(html);
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Arena-backed document. Cloning shares the same tree.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    arena: Rc<RefCell<Arena>>,
    body: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document holding an empty `body`.
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let body = arena.push(NodeKind::Element {
            tag: "body".to_string(),
            namespace: None,
        });
        Self {
            arena: Rc::new(RefCell::new(arena)),
            body,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element with the given classes.
    pub fn element(&self, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(&node, class);
        }
        node
    }

    /// Serialize a subtree. Attributes are written in sorted order.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().write_html(node, &mut out);
        out
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let arena = self.arena.borrow();
        let mut current = node;
        loop {
            if current == self.body {
                return true;
            }
            match arena.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.arena.borrow().node(node).styles.get(property).cloned()
    }

    pub fn has_focus_toggle(&self, parent: NodeId) -> bool {
        self.arena.borrow().toggles.contains_key(&parent)
    }

    pub fn focused_node(&self) -> Option<NodeId> {
        self.arena.borrow().focused
    }

    /// Fire the focus toggle bound on `parent`, as a `focusin` would.
    pub fn focus_in(&self, parent: NodeId) {
        let binding = self.arena.borrow().toggles.get(&parent).copied();
        if let Some((element, container)) = binding {
            visibility::show_raw(self, &element, &container);
        }
    }

    /// Fire the focus toggle bound on `parent`, as a `focusout` would.
    pub fn focus_out(&self, parent: NodeId) {
        let binding = self.arena.borrow().toggles.get(&parent).copied();
        if let Some((element, container)) = binding {
            visibility::show_rendered(self, &element, &container);
        }
    }

    /// Fire the click handler bound on a rendered container.
    pub fn click(&self, container: NodeId) {
        let target = self.arena.borrow().click_targets.get(&container).copied();
        let Some(element) = target else {
            return;
        };
        visibility::show_raw(self, &element, &container);
        self.arena.borrow_mut().focused = Some(element);
        if let Some(parent) = self.parent(&element) {
            self.focus_in(parent);
        }
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.borrow().node(*node).parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.arena.borrow().node(*node).children.clone()
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let arena = self.arena.borrow();
        let parent = arena.node(*node).parent?;
        let siblings = &arena.node(parent).children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(self.arena.borrow().node(*node).kind, NodeKind::Text(_))
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.arena.borrow().node(*node).kind {
            NodeKind::Element { tag, .. } => Some(tag.to_ascii_lowercase()),
            NodeKind::Text(_) => None,
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.arena.borrow().text_content(*node)
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Text(existing) = &mut arena.node_mut(*node).kind {
            *existing = text.to_string();
            return;
        }
        arena.clear_children(*node);
        if !text.is_empty() {
            let child = arena.push(NodeKind::Text(text.to_string()));
            arena.insert_before(*node, child, None);
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.arena.borrow().node(*node).attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.arena
            .borrow_mut()
            .node_mut(*node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.arena
            .borrow()
            .node(*node)
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut arena = self.arena.borrow_mut();
        let classes = &mut arena.node_mut(*node).classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.arena
            .borrow_mut()
            .node_mut(*node)
            .classes
            .retain(|c| c != class);
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.arena
            .borrow_mut()
            .node_mut(*node)
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.arena.borrow_mut().push(NodeKind::Element {
            tag: tag.to_string(),
            namespace: None,
        })
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> NodeId {
        self.arena.borrow_mut().push(NodeKind::Element {
            tag: tag.to_string(),
            namespace: Some(namespace.to_string()),
        })
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .push(NodeKind::Text(text.to_string()))
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let mut arena = self.arena.borrow_mut();
        arena.clear_children(*node);
        arena.node_mut(*node).inner_html = Some(html.to_string());
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.arena.borrow_mut().insert_before(*parent, *child, None);
    }

    fn insert_before(&self, parent: &NodeId, new: &NodeId, reference: Option<&NodeId>) {
        self.arena
            .borrow_mut()
            .insert_before(*parent, *new, reference.copied());
    }

    fn remove(&self, node: &NodeId) {
        self.arena.borrow_mut().detach(*node);
    }

    fn bind_focus_toggle(&self, parent: &NodeId, element: &NodeId, container: &NodeId) {
        self.arena
            .borrow_mut()
            .toggles
            .insert(*parent, (*element, *container));
    }

    fn clear_focus_toggle(&self, parent: &NodeId) {
        self.arena.borrow_mut().toggles.remove(parent);
    }

    fn bind_click_focus(&self, container: &NodeId, element: &NodeId) {
        self.arena
            .borrow_mut()
            .click_targets
            .insert(*container, *element);
    }
}

#[derive(Debug, Default)]
struct OutlineState {
    current: Option<ItemId>,
    focused: Option<ItemId>,
    elements: HashMap<ItemId, NodeId>,
}

/// Outline laid out in a [`MemoryDom`] using the default [`HostLayout`].
///
/// Items look like
/// `div.project[projectid] > div.name > div.content`, an optional
/// `div.notes > div.content` row, and a `div.children` list.
#[derive(Debug, Clone)]
pub struct MemoryOutline {
    dom: MemoryDom,
    layout: HostLayout,
    state: Rc<RefCell<OutlineState>>,
}

impl MemoryOutline {
    pub fn new(dom: &MemoryDom) -> Self {
        Self {
            dom: dom.clone(),
            layout: HostLayout::default(),
            state: Rc::new(RefCell::new(OutlineState::default())),
        }
    }

    pub fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    fn build_item(&self, id: &ItemId, text: &str) -> NodeId {
        let dom = &self.dom;
        let item = dom.element("div", &["project"]);
        dom.set_attribute(&item, &self.layout.item_id_attribute, id.as_str());
        let name = dom.element("div", &[self.layout.name_class.as_str()]);
        let content = dom.element("div", &[self.layout.content_class.as_str()]);
        dom.set_text_content(&content, text);
        dom.append_child(&name, &content);
        dom.append_child(&item, &name);
        let children = dom.element("div", &["children"]);
        dom.append_child(&item, &children);
        self.state.borrow_mut().elements.insert(id.clone(), item);
        item
    }

    /// Append a top-level item.
    pub fn add_item(&self, id: &str, text: &str) -> NodeId {
        let item = self.build_item(&ItemId::from(id), text);
        self.dom.append_child(&self.dom.body(), &item);
        item
    }

    /// Append a child under `parent`.
    pub fn add_child(&self, parent: &str, id: &str, text: &str) -> Option<NodeId> {
        let parent_element = self.item_element(&ItemId::from(parent))?;
        let list = self
            .dom
            .children(&parent_element)
            .into_iter()
            .find(|n| self.dom.has_class(n, "children"))?;
        let item = self.build_item(&ItemId::from(id), text);
        self.dom.append_child(&list, &item);
        Some(item)
    }

    /// Insert a new item right after `sibling`, as pressing Enter does.
    pub fn insert_after(&self, sibling: &str, id: &str, text: &str) -> Option<NodeId> {
        let sibling_element = self.item_element(&ItemId::from(sibling))?;
        let item = self.build_item(&ItemId::from(id), text);
        self.dom.insert_after(&sibling_element, &item);
        Some(item)
    }

    /// Attach or replace the item's note.
    pub fn set_note(&self, id: &str, text: &str) -> Option<NodeId> {
        if let Some(existing) = self.note_element(id) {
            self.dom.set_text_content(&existing, text);
            return Some(existing);
        }
        let item = self.item_element(&ItemId::from(id))?;
        let notes = self.dom.element("div", &[self.layout.notes_class.as_str()]);
        let content = self.dom.element("div", &[self.layout.content_class.as_str()]);
        self.dom.set_text_content(&content, text);
        self.dom.append_child(&notes, &content);
        let children = self
            .dom
            .children(&item)
            .into_iter()
            .find(|n| self.dom.has_class(n, "children"));
        self.dom.insert_before(&item, &notes, children.as_ref());
        Some(content)
    }

    /// Replace the item's title text, as the host does after an edit.
    pub fn set_text(&self, id: &str, text: &str) {
        if let Some(content) = self.name_element(id) {
            self.dom.set_text_content(&content, text);
        }
    }

    pub fn remove_item(&self, id: &str) {
        let removed = self.state.borrow_mut().elements.remove(&ItemId::from(id));
        if let Some(element) = removed {
            self.dom.remove(&element);
        }
    }

    pub fn focus(&self, id: Option<&str>) {
        self.state.borrow_mut().focused = id.map(ItemId::from);
    }

    pub fn zoom(&self, id: Option<&str>) {
        self.state.borrow_mut().current = id.map(ItemId::from);
    }

    fn row_content(&self, id: &str, row_class: &str) -> Option<NodeId> {
        let item = self.item_element(&ItemId::from(id))?;
        let row = self
            .dom
            .children(&item)
            .into_iter()
            .find(|n| self.dom.has_class(n, row_class) && self.layout.row_kind(&self.dom, n).is_some())?;
        self.dom
            .children(&row)
            .into_iter()
            .find(|n| self.dom.has_class(n, &self.layout.content_class))
    }

    pub fn name_element(&self, id: &str) -> Option<NodeId> {
        self.row_content(id, &self.layout.name_class)
    }

    pub fn note_element(&self, id: &str) -> Option<NodeId> {
        self.row_content(id, &self.layout.notes_class)
    }
}

impl HostOutline for MemoryOutline {
    type Node = NodeId;

    fn current_item(&self) -> Option<ItemId> {
        self.state.borrow().current.clone()
    }

    fn focused_item(&self) -> Option<ItemId> {
        self.state.borrow().focused.clone()
    }

    fn item_element(&self, id: &ItemId) -> Option<NodeId> {
        let element = self.state.borrow().elements.get(id).copied()?;
        self.dom.is_attached(element).then_some(element)
    }

    fn previous_visible_sibling(&self, id: &ItemId) -> Option<ItemId> {
        let element = self.item_element(id)?;
        let parent = self.dom.parent(&element)?;
        let siblings = self.dom.children(&parent);
        let index = siblings.iter().position(|n| *n == element)?;
        siblings[..index]
            .iter()
            .rev()
            .find_map(|n| self.dom.attribute(n, &self.layout.item_id_attribute))
            .map(ItemId::from)
    }
}
