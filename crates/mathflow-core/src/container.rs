//! Rendered container management.
//!
//! Each content element with math gets one engine-owned container inserted
//! right after the element's row:
//!
//! ```text
//! div.project
//!   div.name > div.content.has-math      (raw, hidden while rendered)
//!   div.math-rendered.name               (rendered, hidden while raw)
//!   div.notes > div.content
//! ```
//!
//! [`ContainerSync::sync`] always tears down what is there before building,
//! so it can be called from any event path, any number of times.

use tracing::{debug, trace, warn};

use crate::convert::{AsciiMathTranslator, convert_to_latex};
use crate::detect::has_math;
use crate::dom::{ContentElement, Dom};
use crate::host::HostLayout;
use crate::render::{MathRenderer, RenderOptions};
use crate::visibility::{HIDDEN_CLASS, Representation};

/// Class of the engine-owned rendered container.
pub const CONTAINER_CLASS: &str = "math-rendered";

/// Marker class on content elements that currently contain math.
pub const MARKER_CLASS: &str = "has-math";

/// Result of syncing one content element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No math; the element is left to the host.
    Plain,
    /// A fresh container was built and rendered.
    Rendered,
    /// AsciiMath translation failed; the raw text stays visible.
    ConversionFailed,
    /// The element has no parent row.
    Detached,
}

/// Builds, replaces and removes rendered containers.
#[derive(Debug, Clone)]
pub struct ContainerSync<R, T> {
    renderer: R,
    translator: T,
    layout: HostLayout,
    options: RenderOptions,
}

impl<R, T: AsciiMathTranslator> ContainerSync<R, T> {
    pub fn new(renderer: R, translator: T, layout: HostLayout, options: RenderOptions) -> Self {
        Self {
            renderer,
            translator,
            layout,
            options,
        }
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Containers currently following the element's row.
    pub fn containers<D: Dom>(&self, dom: &D, element: &D::Node) -> Vec<D::Node> {
        let Some(row) = dom.parent(element) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut next = dom.next_sibling(&row);
        while let Some(node) = next {
            if dom.is_text(&node) || !dom.has_class(&node, CONTAINER_CLASS) {
                break;
            }
            next = dom.next_sibling(&node);
            found.push(node);
        }
        found
    }

    /// The element's container, if it has one.
    pub fn container<D: Dom>(&self, dom: &D, element: &D::Node) -> Option<D::Node> {
        self.containers(dom, element).into_iter().next()
    }

    /// Remove every container of the element and its row's toggle handlers.
    ///
    /// Returns how many containers were removed.
    pub fn remove_existing<D: Dom>(&self, dom: &D, element: &D::Node) -> usize {
        let stale = self.containers(dom, element);
        for container in &stale {
            dom.remove(container);
        }
        if let Some(row) = dom.parent(element) {
            dom.clear_focus_toggle(&row);
        }
        stale.len()
    }

    /// Return the element to the host untouched: no container, no marker, visible.
    pub fn unsync<D: Dom>(&self, dom: &D, element: &D::Node) {
        self.remove_existing(dom, element);
        dom.remove_class(element, MARKER_CLASS);
        dom.remove_class(element, HIDDEN_CLASS);
    }

    /// Rebuild the element's rendered container from its current text.
    ///
    /// `showing` picks the initial visibility; the row's focus toggle takes
    /// over from there.
    pub fn sync<D: Dom>(
        &self,
        dom: &D,
        element: &ContentElement<D::Node>,
        showing: Representation,
    ) -> SyncOutcome
    where
        R: MathRenderer<D>,
    {
        let node = &element.node;
        let Some(row) = dom.parent(node) else {
            trace!("sync: content element is detached");
            return SyncOutcome::Detached;
        };

        let removed = self.remove_existing(dom, node);
        if removed > 1 {
            debug!(removed, "removed duplicate rendered containers");
        }

        let text = dom.text_content(node);
        if !has_math(&text, &self.options.delimiters) {
            self.unsync(dom, node);
            return SyncOutcome::Plain;
        }

        let latex = match convert_to_latex(&text, &self.translator) {
            Ok(latex) => latex,
            Err(e) => {
                warn!(error = %e, "leaving element raw after asciimath failure");
                self.unsync(dom, node);
                return SyncOutcome::ConversionFailed;
            }
        };

        let container = dom.create_element("div");
        dom.add_class(&container, CONTAINER_CLASS);
        for class in &self.layout.inherited_classes {
            if dom.has_class(&row, class) {
                dom.add_class(&container, class);
            }
        }
        if element.is_note() {
            // Collapsed notes clip to one line otherwise.
            dom.set_style(&container, "height", "auto");
            dom.set_style(&container, "overflow", "visible");
        }
        dom.set_text_content(&container, &latex);
        dom.insert_after(&row, &container);

        self.renderer.render(dom, &container, &self.options);

        dom.add_class(node, MARKER_CLASS);
        dom.bind_focus_toggle(&row, node, &container);
        dom.bind_click_focus(&container, node);
        showing.apply(dom, node, &container);

        trace!(?showing, note = element.is_note(), "synced content element");
        SyncOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TranslateError;
    use crate::host::{HostOutline, ItemId};
    use crate::memory::{MemoryDom, MemoryOutline};
    use crate::render::{KATEX_CLASS, MathmlRenderer};
    use crate::visibility::is_showing_rendered;

    struct Failing;

    impl AsciiMathTranslator for Failing {
        fn translate(&self, _: &str) -> Result<String, TranslateError> {
            Err("unbalanced".into())
        }
    }

    fn sync_for<T: AsciiMathTranslator>(translator: T) -> ContainerSync<MathmlRenderer, T> {
        ContainerSync::new(
            MathmlRenderer,
            translator,
            HostLayout::default(),
            RenderOptions::default(),
        )
    }

    fn name_of(outline: &MemoryOutline, id: &str) -> ContentElement<crate::memory::NodeId> {
        let item = outline.item_element(&ItemId::from(id)).unwrap();
        outline
            .layout()
            .content_elements(outline.dom(), &item)
            .remove(0)
    }

    #[test]
    fn test_sync_twice_leaves_one_container() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "area $\\pi r^2$");
        let element = name_of(&outline, "a");
        let sync = sync_for(());

        assert_eq!(sync.sync(&dom, &element, Representation::Rendered), SyncOutcome::Rendered);
        assert_eq!(sync.sync(&dom, &element, Representation::Rendered), SyncOutcome::Rendered);
        assert_eq!(sync.containers(&dom, &element.node).len(), 1);

        let container = sync.container(&dom, &element.node).unwrap();
        assert!(dom.has_class(&container, "name"));
        assert!(dom.has_class(&element.node, MARKER_CLASS));
        assert!(is_showing_rendered(&dom, &element.node, &container));
        assert_eq!(dom.descendants_with_class(&container, KATEX_CLASS).len(), 1);
    }

    #[test]
    fn test_plain_text_gets_no_container() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "costs $5");
        let element = name_of(&outline, "a");
        let sync = sync_for(());

        assert_eq!(sync.sync(&dom, &element, Representation::Rendered), SyncOutcome::Plain);
        assert!(sync.container(&dom, &element.node).is_none());
        assert!(!dom.has_class(&element.node, MARKER_CLASS));
    }

    #[test]
    fn test_math_removed_tears_down_container() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "$x$");
        let element = name_of(&outline, "a");
        let sync = sync_for(());
        sync.sync(&dom, &element, Representation::Rendered);

        outline.set_text("a", "no math now");
        assert_eq!(sync.sync(&dom, &element, Representation::Rendered), SyncOutcome::Plain);
        assert!(sync.container(&dom, &element.node).is_none());
        assert!(!dom.has_class(&element.node, HIDDEN_CLASS));
        let row = dom.parent(&element.node).unwrap();
        assert!(!dom.has_focus_toggle(row));
    }

    #[test]
    fn test_note_container_overrides_layout() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "title");
        let note = outline.set_note("a", "$$\\sum_i x_i$$").unwrap();
        let element = outline.layout().as_content_element(&dom, &note).unwrap();
        let sync = sync_for(());

        sync.sync(&dom, &element, Representation::Rendered);
        let container = sync.container(&dom, &note).unwrap();
        assert!(dom.has_class(&container, "notes"));
        assert!(!dom.has_class(&container, "name"));
        assert_eq!(dom.style(container, "height").as_deref(), Some("auto"));
        assert_eq!(dom.style(container, "overflow").as_deref(), Some("visible"));
    }

    #[test]
    fn test_focus_toggle_and_click() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "$x$");
        let element = name_of(&outline, "a");
        let sync = sync_for(());
        sync.sync(&dom, &element, Representation::Rendered);
        let container = sync.container(&dom, &element.node).unwrap();
        let row = dom.parent(&element.node).unwrap();

        dom.focus_in(row);
        assert!(!is_showing_rendered(&dom, &element.node, &container));
        dom.focus_out(row);
        assert!(is_showing_rendered(&dom, &element.node, &container));

        dom.click(container);
        assert_eq!(dom.focused_node(), Some(element.node));
        assert!(!is_showing_rendered(&dom, &element.node, &container));
    }

    #[test]
    fn test_asciimath_failure_leaves_raw() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "see `x^`");
        let element = name_of(&outline, "a");
        let sync = sync_for(Failing);

        assert_eq!(
            sync.sync(&dom, &element, Representation::Rendered),
            SyncOutcome::ConversionFailed
        );
        assert!(sync.container(&dom, &element.node).is_none());
        assert_eq!(dom.text_content(&element.node), "see `x^`");
        assert!(!dom.has_class(&element.node, HIDDEN_CLASS));
    }

    #[test]
    fn test_asciimath_renders_through_translator() {
        let dom = MemoryDom::new();
        let outline = MemoryOutline::new(&dom);
        outline.add_item("a", "see `x^2`");
        let element = name_of(&outline, "a");
        let sync = sync_for(());

        assert_eq!(sync.sync(&dom, &element, Representation::Raw), SyncOutcome::Rendered);
        let container = sync.container(&dom, &element.node).unwrap();
        assert_eq!(dom.descendants_with_class(&container, KATEX_CLASS).len(), 1);
        assert_eq!(dom.text_content(&element.node), "see `x^2`");
        assert!(!is_showing_rendered(&dom, &element.node, &container));
    }

    #[test]
    fn test_detached_element() {
        let dom = MemoryDom::new();
        let node = dom.element("div", &["content"]);
        let element = ContentElement::new(node, crate::dom::ContentKind::Name);
        assert_eq!(
            sync_for(()).sync(&dom, &element, Representation::Rendered),
            SyncOutcome::Detached
        );
    }
}
