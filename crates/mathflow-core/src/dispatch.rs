//! The engine reducer.
//!
//! Two producers feed [`Engine`]: deferred keyboard/focus ticks and
//! observer batches. They arrive in no particular order, so every entry
//! point re-reads the host, rebuilds what it touches from scratch, and is
//! safe to run again. Platform code only has to forward events:
//!
//! ```text
//! keydown ──► on_key_down ──(next tick)──► on_deferred_key ─┐
//! focusin/focusout ──(next tick)──► on_focus_change ────────┼──► FocusTracker ──► ContainerSync
//! MutationObserver ──► on_mutations ────────────────────────┘          │
//!                                                                      └──► to_raw_source
//! ```

use tracing::{debug, trace};

use crate::container::{ContainerSync, SyncOutcome};
use crate::convert::AsciiMathTranslator;
use crate::dom::{ContentElement, ContentKind, Dom};
use crate::extract::to_raw_source;
use crate::focus::{FocusState, FocusTracker, Transition, Trigger};
use crate::host::{HostOutline, ItemId};
use crate::render::MathRenderer;
use crate::visibility::Representation;
use crate::watch::{MutationRecord, MutationWatcher};

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            _ => Key::Other,
        }
    }
}

/// A keydown as seen before the host handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// Caret offset within the content element, `None` for a ranged selection.
    pub caret_offset: Option<usize>,
    /// Item the event target belongs to, when known.
    pub item: Option<ItemId>,
    /// Row the caret is in.
    pub content: ContentKind,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            caret_offset: None,
            item: None,
            content: ContentKind::Name,
        }
    }

    pub fn at_offset(mut self, offset: usize) -> Self {
        self.caret_offset = Some(offset);
        self
    }

    pub fn in_item(mut self, item: impl Into<ItemId>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn in_content(mut self, content: ContentKind) -> Self {
        self.content = content;
        self
    }

    /// Backspace with a collapsed caret at the very start of the name row:
    /// the host will merge this item into the one before it. Notes never merge.
    pub fn is_merge_backspace(&self) -> bool {
        self.key == Key::Backspace
            && self.content == ContentKind::Name
            && self.caret_offset == Some(0)
    }
}

/// What an observer batch led to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub transition: Option<Transition>,
    /// Inserted content elements that ended up with a rendered container.
    pub rendered: usize,
}

/// Focus-synchronized raw/rendered engine over one document.
pub struct Engine<D: Dom, H, R, T> {
    dom: D,
    host: H,
    root: D::Node,
    sync: ContainerSync<R, T>,
    watcher: MutationWatcher,
    tracker: FocusTracker,
    /// Item turned raw ahead of a merge the host has not done yet.
    merge_target: Option<ItemId>,
}

impl<D, H, R, T> Engine<D, H, R, T>
where
    D: Dom,
    H: HostOutline<Node = D::Node>,
    R: MathRenderer<D>,
    T: AsciiMathTranslator,
{
    /// `root` bounds the initial pass when the host has no current item.
    pub fn new(dom: D, host: H, root: D::Node, sync: ContainerSync<R, T>) -> Self {
        let watcher = MutationWatcher::new(sync.layout().clone());
        Self {
            dom,
            host,
            root,
            sync,
            watcher,
            tracker: FocusTracker::new(),
            merge_target: None,
        }
    }

    pub fn with_focus_state(mut self, state: FocusState) -> Self {
        self.tracker = FocusTracker::with_state(state);
        self
    }

    pub fn focus_state(&self) -> &FocusState {
        self.tracker.state()
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn container_sync(&self) -> &ContainerSync<R, T> {
        &self.sync
    }

    fn content_of(&self, id: &ItemId) -> Vec<ContentElement<D::Node>> {
        match self.host.item_element(id) {
            Some(element) => self.sync.layout().content_elements(&self.dom, &element),
            None => {
                trace!(item = %id, "item has no element");
                Vec::new()
            }
        }
    }

    fn representation_for(&self, element: &ContentElement<D::Node>) -> Representation {
        let focused = self
            .sync
            .layout()
            .item_id_of(&self.dom, &element.node)
            .is_some_and(|id| self.tracker.state().is_current(&id));
        Representation::for_focus(focused)
    }

    fn sync_elements(&self, elements: &[ContentElement<D::Node>]) -> usize {
        elements
            .iter()
            .map(|element| {
                self.sync
                    .sync(&self.dom, element, self.representation_for(element))
            })
            .filter(|outcome| *outcome == SyncOutcome::Rendered)
            .count()
    }

    /// Rebuild an item's containers, visibility following the focus snapshot.
    pub fn sync_item(&self, id: &ItemId) -> usize {
        self.sync_elements(&self.content_of(id))
    }

    /// Put an item into editing form: raw text visible, container rebuilt behind it.
    pub fn show_item_raw(&self, id: &ItemId) {
        for element in self.content_of(id) {
            to_raw_source(&self.dom, &element.node);
            self.sync.sync(&self.dom, &element, Representation::Raw);
        }
    }

    fn apply(&self, transition: &Transition) {
        for id in &transition.rerender {
            self.sync_item(id);
        }
        self.show_item_raw(&transition.to);
    }

    fn observe(&mut self, trigger: Trigger) -> Option<Transition> {
        let transition = self.tracker.observe(&self.host, trigger)?;
        self.apply(&transition);
        Some(transition)
    }

    /// Synchronous part of a keydown, run before the host sees the event.
    ///
    /// Returns true when the preceding item was turned raw ahead of a merge.
    pub fn on_key_down(&mut self, input: &KeyInput) -> bool {
        if !input.is_merge_backspace() {
            return false;
        }
        let Some(item) = input.item.clone().or_else(|| self.host.focused_item()) else {
            return false;
        };
        let Some(target) = self.host.previous_visible_sibling(&item) else {
            trace!(item = %item, "backspace at start of first item");
            return false;
        };

        let elements = self.content_of(&target);
        for element in &elements {
            let report = to_raw_source(&self.dom, &element.node);
            self.sync.unsync(&self.dom, &element.node);
            debug!(target = %target, restored = report.restored(), "raw before merge");
        }
        if elements.is_empty() {
            return false;
        }
        self.merge_target = Some(target);
        true
    }

    /// Deferred part of a keydown, run after the host has updated.
    pub fn on_deferred_key(&mut self, key: Key) -> Option<Transition> {
        let trigger = match key {
            Key::Enter => Trigger::Enter,
            _ => Trigger::Key,
        };
        let transition = self.observe(trigger);
        self.settle_merge();
        transition
    }

    /// Re-render a merge target the host left alone and unfocused.
    fn settle_merge(&mut self) {
        let Some(target) = self.merge_target.take() else {
            return;
        };
        if self.tracker.state().is_current(&target) {
            return;
        }
        let rendered = self.sync_item(&target);
        debug!(target = %target, rendered, "merge declined, rendering again");
    }

    /// Deferred check after a platform focus or blur.
    pub fn on_focus_change(&mut self) -> Option<Transition> {
        self.observe(Trigger::Focus)
    }

    /// Handle an observer batch: check focus, then sync inserted content.
    pub fn on_mutations(&mut self, records: &[MutationRecord<D::Node>]) -> BatchOutcome {
        if records.is_empty() {
            return BatchOutcome::default();
        }
        let transition = self.observe(Trigger::Mutation);
        let inserted = self.watcher.inserted_content(&self.dom, records);
        let rendered = self.sync_elements(&inserted);
        BatchOutcome {
            transition,
            rendered,
        }
    }

    /// Initial pass: sync everything under the host's current item, or under
    /// the root when the host has none.
    pub fn render_all(&mut self) -> usize {
        self.tracker.prime(&self.host);
        let scope = self
            .host
            .current_item()
            .and_then(|id| self.host.item_element(&id))
            .unwrap_or_else(|| self.root.clone());
        let elements = self.sync.layout().content_elements_within(&self.dom, &scope);
        let rendered = self.sync_elements(&elements);
        debug!(elements = elements.len(), rendered, "rendered outline");
        rendered
    }

    /// Remove every container under the root and leave raw text visible.
    pub fn restore_all(&self) {
        for element in self.sync.layout().content_elements_within(&self.dom, &self.root) {
            self.sync.unsync(&self.dom, &element.node);
        }
    }
}
