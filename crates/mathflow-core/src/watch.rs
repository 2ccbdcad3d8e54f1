//! Subtree insertion filtering.
//!
//! The platform observer hands over batches of child-list records. Only
//! host content elements are interesting; anything the engine inserted
//! itself (containers and rendered math) is ignored so that syncing never
//! feeds back into another sync.

use crate::container::CONTAINER_CLASS;
use crate::dom::{ContentElement, Dom};
use crate::host::HostLayout;

/// One child-list mutation, reduced to what the engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord<N> {
    pub target: N,
    pub added: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn new(target: N, added: Vec<N>) -> Self {
        Self { target, added }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MutationWatcher {
    layout: HostLayout,
}

impl MutationWatcher {
    pub fn new(layout: HostLayout) -> Self {
        Self { layout }
    }

    /// Content elements inserted by a batch, each listed once, in record order.
    pub fn inserted_content<D: Dom>(
        &self,
        dom: &D,
        records: &[MutationRecord<D::Node>],
    ) -> Vec<ContentElement<D::Node>> {
        let mut found: Vec<ContentElement<D::Node>> = Vec::new();
        for node in records.iter().flat_map(|r| r.added.iter()) {
            if dom.is_text(node) || dom.has_ancestor_with_class(node, CONTAINER_CLASS) {
                continue;
            }
            for element in self.layout.content_elements_within(dom, node) {
                if !found.iter().any(|f| f.node == element.node) {
                    found.push(element);
                }
            }
        }
        if !found.is_empty() {
            tracing::trace!(count = found.len(), "inserted content elements");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostOutline, ItemId};
    use crate::memory::{MemoryDom, MemoryOutline};

    #[test]
    fn test_inserted_items_yield_their_content() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        let a = outline.add_item("a", "$x$");
        outline.add_child("a", "a1", "child");
        outline.set_note("a", "note");

        let watcher = MutationWatcher::default();
        let records = vec![
            MutationRecord::new(dom.body(), vec![a]),
            MutationRecord::new(dom.body(), vec![a]),
        ];
        let found = watcher.inserted_content(&dom, &records);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].node, outline.name_element("a").unwrap());
    }

    #[test]
    fn test_engine_output_and_text_are_ignored() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "$x$");
        let item = outline.item_element(&ItemId::from("a")).unwrap();

        let container = dom.element("div", &[CONTAINER_CLASS, "name"]);
        let inner = dom.element("div", &["content"]);
        dom.append_child(&container, &inner);
        dom.append_child(&item, &container);
        let text = dom.create_text("typed");

        let records = vec![MutationRecord::new(item, vec![container, inner, text])];
        assert!(MutationWatcher::default().inserted_content(&dom, &records).is_empty());
    }

    #[test]
    fn test_inserted_content_element_itself() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "$x$");
        let content = outline.name_element("a").unwrap();
        let records = vec![MutationRecord::new(dom.parent(&content).unwrap(), vec![content])];
        let found = MutationWatcher::default().inserted_content(&dom, &records);
        assert_eq!(found.len(), 1);
        assert!(!found[0].is_note());
    }
}
