//! Focus bookkeeping.
//!
//! [`FocusState`] remembers which outline item held focus now and one
//! transition ago. [`FocusTracker`] compares it with what the host reports
//! and turns a difference into a [`Transition`]: the items to render again
//! and the item to show raw. It never touches the DOM itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{HostOutline, ItemId};

/// Focused item now and before the last observed transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    current: Option<ItemId>,
    previous: Option<ItemId>,
}

impl FocusState {
    pub fn new(current: Option<ItemId>, previous: Option<ItemId>) -> Self {
        Self { current, previous }
    }

    pub fn current(&self) -> Option<&ItemId> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&ItemId> {
        self.previous.as_ref()
    }

    pub fn is_current(&self, id: &ItemId) -> bool {
        self.current.as_ref() == Some(id)
    }
}

/// What prompted a focus check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Deferred tick after Enter; the new item's predecessor lost focus.
    Enter,
    /// Deferred tick after any other key.
    Key,
    /// Platform focus or blur.
    Focus,
    /// An observer batch.
    Mutation,
}

/// A change of focused item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Item that now holds focus and should show raw source.
    pub to: ItemId,
    /// Items that lost focus and should show rendered math again.
    pub rerender: Vec<ItemId>,
}

#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    state: FocusState,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: FocusState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// Adopt the host's focused item without producing a transition.
    ///
    /// Used on start, when nothing has been rendered for the old focus yet.
    pub fn prime<H: HostOutline>(&mut self, host: &H) {
        if let Some(focused) = host.focused_item() {
            self.state.current = Some(focused);
        }
    }

    /// Compare the host's focus with the recorded one.
    ///
    /// A host that reports nothing focused is not a transition.
    pub fn observe<H: HostOutline>(&mut self, host: &H, trigger: Trigger) -> Option<Transition> {
        let focused = host.focused_item()?;
        if self.state.is_current(&focused) {
            return None;
        }

        let old = self.state.current.take();
        let previous = match trigger {
            // Recorded focus may lag behind a burst of Enter presses; the item
            // just split from is always the one before the new cursor.
            Trigger::Enter => host.previous_visible_sibling(&focused).or_else(|| old.clone()),
            _ => old.clone(),
        };

        let mut rerender: Vec<ItemId> = previous.iter().cloned().collect();
        if let Some(old) = old
            && previous.as_ref() != Some(&old)
        {
            rerender.push(old);
        }
        rerender.retain(|id| *id != focused);

        debug!(
            ?trigger,
            to = %focused,
            previous = ?previous.as_ref().map(ItemId::as_str),
            "focus transition"
        );
        self.state.previous = previous;
        self.state.current = Some(focused.clone());

        Some(Transition {
            to: focused,
            rerender,
        })
    }
}
