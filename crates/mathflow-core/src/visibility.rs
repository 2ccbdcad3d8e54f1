//! Raw/rendered visibility toggling.
//!
//! Exactly one of a content element and its rendered container is visible at
//! a time; the other carries [`HIDDEN_CLASS`]. Both the platform focus
//! handlers and the focus tracker go through these two functions.
//!
//! # CSS Integration
//!
//! ```css
//! .math-hidden {
//!     display: none !important;
//! }
//! ```

use crate::dom::Dom;

/// Class applied to whichever representation is currently not shown.
pub const HIDDEN_CLASS: &str = "math-hidden";

/// Show the editable source, hide the rendered container.
pub fn show_raw<D: Dom>(dom: &D, element: &D::Node, container: &D::Node) {
    dom.remove_class(element, HIDDEN_CLASS);
    dom.add_class(container, HIDDEN_CLASS);
}

/// Show the rendered container, hide the editable source.
pub fn show_rendered<D: Dom>(dom: &D, element: &D::Node, container: &D::Node) {
    dom.add_class(element, HIDDEN_CLASS);
    dom.remove_class(container, HIDDEN_CLASS);
}

/// Whether the rendered form is the one currently shown.
pub fn is_showing_rendered<D: Dom>(dom: &D, element: &D::Node, container: &D::Node) -> bool {
    dom.has_class(element, HIDDEN_CLASS) && !dom.has_class(container, HIDDEN_CLASS)
}

/// Which representation of a content element should be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Editable source.
    Raw,
    /// Rendered container.
    Rendered,
}

impl Representation {
    /// Raw for the focused item, rendered for everything else.
    pub fn for_focus(focused: bool) -> Self {
        if focused { Self::Raw } else { Self::Rendered }
    }

    pub fn apply<D: Dom>(self, dom: &D, element: &D::Node, container: &D::Node) {
        match self {
            Self::Raw => show_raw(dom, element, container),
            Self::Rendered => show_rendered(dom, element, container),
        }
    }
}
