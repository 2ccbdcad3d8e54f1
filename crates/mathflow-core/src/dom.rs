//! DOM adapter interface.
//!
//! The engine never talks to `web_sys` directly. Everything it needs from a
//! document tree goes through [`Dom`], which the browser crate implements over
//! real nodes and [`crate::memory::MemoryDom`] implements over an arena for
//! tests. Methods take `&self`; implementations mutate through shared handles
//! the same way browser nodes do.

use std::fmt::Debug;

/// MathML namespace for elements created by the native renderer.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Document tree operations used by the engine.
pub trait Dom {
    /// Handle to a node. Cloning a handle never clones the node.
    type Node: Clone + PartialEq + Debug;

    // === Structure ===

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn is_text(&self, node: &Self::Node) -> bool;
    /// Lowercase tag name, `None` for non-element nodes.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;
    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&self, node: &Self::Node, text: &str);

    // === Attributes and classes ===

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    // === Construction and mutation ===

    fn create_element(&self, tag: &str) -> Self::Node;
    fn create_element_ns(&self, namespace: &str, tag: &str) -> Self::Node;
    fn create_text(&self, text: &str) -> Self::Node;
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Insert `new` before `reference`, or append when `reference` is `None`.
    fn insert_before(&self, parent: &Self::Node, new: &Self::Node, reference: Option<&Self::Node>);
    /// Detach a node from its parent. No-op for detached nodes.
    fn remove(&self, node: &Self::Node);

    // === Event wiring ===

    /// Show the raw element while `parent` holds focus, the container otherwise.
    fn bind_focus_toggle(&self, parent: &Self::Node, element: &Self::Node, container: &Self::Node);
    /// Drop any toggle previously bound on `parent`.
    fn clear_focus_toggle(&self, parent: &Self::Node);
    /// Clicking `container` moves focus into `element`.
    fn bind_click_focus(&self, container: &Self::Node, element: &Self::Node);

    // === Provided helpers ===

    /// Insert `new` as the next sibling of `reference`.
    fn insert_after(&self, reference: &Self::Node, new: &Self::Node) {
        let Some(parent) = self.parent(reference) else {
            tracing::trace!("insert_after: reference node is detached");
            return;
        };
        let next = self.next_sibling(reference);
        self.insert_before(&parent, new, next.as_ref());
    }

    /// Replace `node` in its parent with a single text node.
    fn replace_with_text(&self, node: &Self::Node, text: &str) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let replacement = self.create_text(text);
        self.insert_before(&parent, &replacement, Some(node));
        self.remove(node);
    }

    /// All descendants of `root` (not `root` itself) in document order.
    fn descendants(&self, root: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(self.children(&node).into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendant elements carrying `class`, in document order.
    fn descendants_with_class(&self, root: &Self::Node, class: &str) -> Vec<Self::Node> {
        self.descendants(root)
            .into_iter()
            .filter(|n| !self.is_text(n) && self.has_class(n, class))
            .collect()
    }

    /// First descendant element with the given tag name.
    fn first_descendant_with_tag(&self, root: &Self::Node, tag: &str) -> Option<Self::Node> {
        self.descendants(root)
            .into_iter()
            .find(|n| self.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// Walk up from `node` (inclusive) to the first element carrying `name`.
    fn closest_attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if let Some(value) = self.attribute(&n, name) {
                return Some(value);
            }
            current = self.parent(&n);
        }
        None
    }

    /// Whether `node` or any ancestor carries `class`.
    fn has_ancestor_with_class(&self, node: &Self::Node, class: &str) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if !self.is_text(&n) && self.has_class(&n, class) {
                return true;
            }
            current = self.parent(&n);
        }
        false
    }
}

/// Which row of an outline item a content element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// The item's title line.
    Name,
    /// The item's note body.
    Note,
}

/// A host-owned editable text element of one outline item.
///
/// The engine only annotates and reads these; the host creates and destroys them.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentElement<N> {
    pub node: N,
    pub kind: ContentKind,
}

impl<N> ContentElement<N> {
    pub fn new(node: N, kind: ContentKind) -> Self {
        Self { node, kind }
    }

    pub fn is_note(&self) -> bool {
        self.kind == ContentKind::Note
    }
}
