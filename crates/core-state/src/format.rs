use core_doc::{Document, Marks};
use serde::Serialize;

use crate::Selection;

/// Derived formatting flags for the current selection, recomputed on every
/// selection or content change and handed to host toolbars. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub bulleted: bool,
    pub numbered: bool,
    pub quoted: bool,
}

impl FormatState {
    /// A range reports an inline flag when every covered non-empty run
    /// carries the mark; a caret reports the run ending at it, or the pending
    /// caret marks when a toggle is outstanding. Block flags hold when every
    /// leaf the selection intersects has the kind (or a quote ancestor).
    pub fn derive(doc: &Document, selection: Selection, pending: Option<Marks>) -> Self {
        let (start, end) = (selection.start(), selection.end());
        let inline = if start < end {
            range_marks(doc, start, end)
        } else {
            pending.unwrap_or_else(|| caret_marks(doc, start))
        };
        let leaves = doc.leaves_in_range(start, end);
        let all_kind = |kind: core_doc::BlockKind| leaves.iter().all(|&i| doc.leaf(i).kind == kind);
        Self {
            bold: inline.contains(Marks::BOLD),
            italic: inline.contains(Marks::ITALIC),
            underline: inline.contains(Marks::UNDERLINE),
            bulleted: all_kind(core_doc::BlockKind::Bulleted),
            numbered: all_kind(core_doc::BlockKind::Numbered),
            quoted: leaves.iter().all(|&i| doc.leaf_quoted(i)),
        }
    }
}

/// Intersection of marks across every run overlapping `[start, end)`; empty
/// when the range covers no text.
fn range_marks(doc: &Document, start: usize, end: usize) -> Marks {
    let mut acc = Marks::all();
    let mut any = false;
    doc.runs_in_range(start, end, |run| {
        any = true;
        acc &= run.marks;
    });
    if any { acc } else { Marks::empty() }
}

/// Marks of the run a caret offset resolves into. Boundary offsets resolve
/// to the earlier run, matching insertion inheritance.
pub(crate) fn caret_marks(doc: &Document, offset: usize) -> Marks {
    let (leaf, local) = doc.resolve(offset);
    let block = doc.leaf(leaf);
    if block.runs.is_empty() {
        return Marks::empty();
    }
    let (run_idx, _) = block.locate(local);
    block.runs[run_idx].marks
}
