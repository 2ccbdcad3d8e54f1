//! Rendered math back to delimited source.
//!
//! Rendered blocks carry their TeX in an `annotation` element. Restoring a
//! subtree replaces every block with a text node holding that TeX wrapped in
//! the canonical delimiters, so `$x$`, `\(x\)` and `` `x` `` all come back as
//! `$x$`.

use tracing::trace;

use crate::delimiters::{DISPLAY_DELIMITER, INLINE_DELIMITER};
use crate::dom::Dom;
use crate::render::{
    ANNOTATION_TAG, KATEX_CLASS, KATEX_DISPLAY_CLASS, KATEX_HTML_CLASS, KATEX_MATHML_CLASS,
};

/// What [`to_raw_source`] did to a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Visual duplicates dropped after a semantic block.
    pub visual_removed: usize,
    pub display_restored: usize,
    pub inline_restored: usize,
    /// Blocks left rendered because they had no annotation.
    pub skipped: usize,
}

impl ExtractReport {
    pub fn restored(&self) -> usize {
        self.display_restored + self.inline_restored
    }
}

fn restore<D: Dom>(dom: &D, block: &D::Node, delimiter: &str) -> bool {
    let Some(annotation) = dom.first_descendant_with_tag(block, ANNOTATION_TAG) else {
        trace!("rendered block without annotation left in place");
        return false;
    };
    let source = dom.text_content(&annotation);
    dom.replace_with_text(block, &format!("{delimiter}{source}{delimiter}"));
    true
}

/// Replace rendered math under `root` with its delimited source, in place.
///
/// Already-raw subtrees are left alone, so this is safe to repeat.
pub fn to_raw_source<D: Dom>(dom: &D, root: &D::Node) -> ExtractReport {
    let mut report = ExtractReport::default();

    for semantic in dom.descendants_with_class(root, KATEX_MATHML_CLASS) {
        if let Some(next) = dom.next_sibling(&semantic)
            && !dom.is_text(&next)
            && dom.has_class(&next, KATEX_HTML_CLASS)
        {
            dom.remove(&next);
            report.visual_removed += 1;
        }
    }

    // Display blocks also contain a `.katex`, so they go first.
    for block in dom.descendants_with_class(root, KATEX_DISPLAY_CLASS) {
        if restore(dom, &block, DISPLAY_DELIMITER) {
            report.display_restored += 1;
        } else {
            report.skipped += 1;
        }
    }

    for block in dom.descendants_with_class(root, KATEX_CLASS) {
        let in_skipped_display = dom
            .parent(&block)
            .is_some_and(|p| dom.has_ancestor_with_class(&p, KATEX_DISPLAY_CLASS));
        if in_skipped_display {
            continue;
        }
        if restore(dom, &block, INLINE_DELIMITER) {
            report.inline_restored += 1;
        } else {
            report.skipped += 1;
        }
    }

    if report != ExtractReport::default() {
        trace!(?report, "restored raw source");
    }
    report
}
