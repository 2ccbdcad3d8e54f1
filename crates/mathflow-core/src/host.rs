//! Host outliner interface.
//!
//! The outliner owns its items and their DOM. The engine only needs to ask
//! which item is focused, find an item's element, and step to the preceding
//! visible sibling. Every accessor may return `None` while the host is still
//! loading or at document boundaries; callers treat that as "do nothing".

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::container::CONTAINER_CLASS;
use crate::dom::{ContentElement, ContentKind, Dom};

/// Stable identifier the host assigns to an outline item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub SmolStr);

impl ItemId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The host outliner's item and selection API.
pub trait HostOutline {
    type Node;

    /// The item the view is currently zoomed into.
    fn current_item(&self) -> Option<ItemId>;
    /// The item holding the text cursor.
    fn focused_item(&self) -> Option<ItemId>;
    /// The item's root DOM element, if it is mounted.
    fn item_element(&self, id: &ItemId) -> Option<Self::Node>;
    fn previous_visible_sibling(&self, id: &ItemId) -> Option<ItemId>;
}

/// Host DOM vocabulary: the class names and attributes the outliner uses.
///
/// The defaults describe an item as
/// `div.project[projectid] > (div.name > div.content) + (div.notes > div.content)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostLayout {
    /// Attribute on the item element holding its id.
    pub item_id_attribute: SmolStr,
    /// Class of the editable text element.
    pub content_class: SmolStr,
    /// Class of the row wrapping an item's title.
    pub name_class: SmolStr,
    /// Class of the row wrapping an item's note.
    pub notes_class: SmolStr,
    /// Row classes copied onto the rendered container so host styling applies.
    pub inherited_classes: Vec<SmolStr>,
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            item_id_attribute: SmolStr::new_static("projectid"),
            content_class: SmolStr::new_static("content"),
            name_class: SmolStr::new_static("name"),
            notes_class: SmolStr::new_static("notes"),
            inherited_classes: vec![SmolStr::new_static("name"), SmolStr::new_static("notes")],
        }
    }
}

impl HostLayout {
    /// Classify a row element, ignoring engine-owned containers.
    pub fn row_kind<D: Dom>(&self, dom: &D, row: &D::Node) -> Option<ContentKind> {
        if dom.is_text(row) || dom.has_class(row, CONTAINER_CLASS) {
            return None;
        }
        if dom.has_class(row, &self.notes_class) {
            Some(ContentKind::Note)
        } else if dom.has_class(row, &self.name_class) {
            Some(ContentKind::Name)
        } else {
            None
        }
    }

    /// Interpret `node` as a content element if it is one.
    pub fn as_content_element<D: Dom>(
        &self,
        dom: &D,
        node: &D::Node,
    ) -> Option<ContentElement<D::Node>> {
        if dom.is_text(node) || !dom.has_class(node, &self.content_class) {
            return None;
        }
        let row = dom.parent(node)?;
        let kind = self.row_kind(dom, &row)?;
        Some(ContentElement::new(node.clone(), kind))
    }

    /// The item's own title and note elements, not those of its children.
    pub fn content_elements<D: Dom>(
        &self,
        dom: &D,
        item_element: &D::Node,
    ) -> Vec<ContentElement<D::Node>> {
        dom.children(item_element)
            .into_iter()
            .filter(|row| self.row_kind(dom, row).is_some())
            .flat_map(|row| dom.children(&row))
            .filter_map(|node| self.as_content_element(dom, &node))
            .collect()
    }

    /// Every content element at or under `root`.
    pub fn content_elements_within<D: Dom>(
        &self,
        dom: &D,
        root: &D::Node,
    ) -> Vec<ContentElement<D::Node>> {
        let mut found: Vec<_> = self.as_content_element(dom, root).into_iter().collect();
        if !dom.is_text(root) {
            found.extend(
                dom.descendants_with_class(root, &self.content_class)
                    .iter()
                    .filter_map(|node| self.as_content_element(dom, node)),
            );
        }
        found
    }

    /// The content element containing `node`, walking up from `node` itself.
    pub fn enclosing_content<D: Dom>(
        &self,
        dom: &D,
        node: &D::Node,
    ) -> Option<ContentElement<D::Node>> {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if let Some(element) = self.as_content_element(dom, &n) {
                return Some(element);
            }
            current = dom.parent(&n);
        }
        None
    }

    /// The id of the item `node` belongs to.
    pub fn item_id_of<D: Dom>(&self, dom: &D, node: &D::Node) -> Option<ItemId> {
        dom.closest_attribute(node, &self.item_id_attribute)
            .map(ItemId::from)
    }
}
