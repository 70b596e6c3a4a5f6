//! Mutation primitives over the document tree.
//!
//! Every operation here is a pure transformation: it takes linear character
//! offsets, edits the tree, then re-normalizes. Structural invariants (quote
//! containers never empty, at least one block, merged runs) are restored by
//! `Document::normalize` at the end of each primitive, so callers can compose
//! them without intermediate bookkeeping.

use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use crate::{
    Block, BlockKind, Document, Mark, Node, Run, byte_of_char, next_grapheme_boundary,
    prev_grapheme_boundary,
};

/// Outcome of resolving a quote toggle: which structural edit was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteToggle {
    Wrapped,
    Unwrapped,
}

enum UnwrapWalk {
    NotFound,
    Found,
    Done,
}

impl Document {
    /// Insert text at a caret offset. The text is NFC-normalized. When
    /// `marks` is `None` the insertion inherits the attributes of the run
    /// ending at the caret; inside a link run the href is inherited too, at a
    /// link boundary it is not. Returns the number of characters inserted.
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: Option<crate::Marks>) -> usize {
        let text: String = text.nfc().collect();
        if text.is_empty() {
            return 0;
        }
        let inserted = text.chars().count();
        let (leaf_idx, local) = self.resolve_insert(offset);
        let plan = {
            let block = self.leaf(leaf_idx);
            if block.runs.is_empty() {
                None
            } else {
                let (run_idx, run_off) = block.locate(local);
                let run = &block.runs[run_idx];
                let inside = run_off > 0 && run_off < run.char_len();
                let inherited_href = if inside { run.href.clone() } else { None };
                Some((run_idx, run_off, run.marks, run.href.clone(), inherited_href))
            }
        };
        let block = self.leaf_mut(leaf_idx);
        match plan {
            None => {
                block.runs.push(Run {
                    text,
                    marks: marks.unwrap_or_default(),
                    href: None,
                });
            }
            Some((run_idx, run_off, run_marks, run_href, inherited_href)) => {
                let use_marks = marks.unwrap_or(run_marks);
                if use_marks == run_marks && inherited_href == run_href {
                    let run = &mut block.runs[run_idx];
                    let byte = byte_of_char(&run.text, run_off);
                    run.text.insert_str(byte, &text);
                } else {
                    let split = block.split_runs_at(local);
                    block.runs.insert(
                        split,
                        Run {
                            text,
                            marks: use_marks,
                            href: inherited_href,
                        },
                    );
                }
            }
        }
        self.normalize();
        trace!(target: "doc.edit", offset, inserted, "insert_text");
        inserted
    }

    /// Remove `[start, end)` and return the removed plain text. A range that
    /// spans block boundaries merges the first and last blocks and drops
    /// everything between; quote containers emptied this way are pruned.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let end = end.min(self.char_len());
        if start >= end {
            return String::new();
        }
        let removed = self.text_in_range(start, end);
        let (start_leaf, start_local) = self.resolve_forward(start);
        let (end_leaf, end_local) = self.resolve(end);
        if start_leaf == end_leaf {
            let block = self.leaf_mut(start_leaf);
            let a = block.split_runs_at(start_local);
            let b = block.split_runs_at(end_local);
            block.runs.drain(a..b);
        } else {
            {
                let block = self.leaf_mut(start_leaf);
                let a = block.split_runs_at(start_local);
                block.runs.truncate(a);
            }
            let tail = {
                let block = self.leaf_mut(end_leaf);
                let b = block.split_runs_at(end_local);
                block.runs.split_off(b)
            };
            for idx in ((start_leaf + 1)..=end_leaf).rev() {
                self.remove_leaf(idx);
            }
            self.leaf_mut(start_leaf).runs.extend(tail);
        }
        self.normalize();
        trace!(target: "doc.edit", start, end, removed_chars = removed.chars().count(), "delete_range");
        removed
    }

    /// Toggle one inline mark across a range: if every covered non-empty run
    /// already carries it the mark is removed, otherwise it is added. Returns
    /// false when the range covers no text.
    pub fn toggle_mark(&mut self, start: usize, end: usize, mark: Mark) -> bool {
        if start >= end {
            return false;
        }
        let flag = mark.flag();
        let mut any = false;
        let mut all = true;
        self.runs_in_range(start, end, |run| {
            any = true;
            if !run.marks.contains(flag) {
                all = false;
            }
        });
        if !any {
            return false;
        }
        let add = !all;
        self.for_runs_in_range_mut(start, end, |run| {
            if add {
                run.marks.insert(flag);
            } else {
                run.marks.remove(flag);
            }
        });
        self.normalize();
        trace!(target: "doc.edit", start, end, ?mark, add, "toggle_mark");
        true
    }

    /// Toggle the block kind of every leaf the selection intersects: when all
    /// of them already have `kind` they revert to paragraphs, otherwise they
    /// all take `kind`. Returns whether anything changed.
    pub fn toggle_block_kind(&mut self, start: usize, end: usize, kind: BlockKind) -> bool {
        let targets = self.leaves_in_range(start, end);
        if targets.is_empty() {
            return false;
        }
        let all = targets.iter().all(|&i| self.leaf(i).kind == kind);
        let next = if all { BlockKind::Paragraph } else { kind };
        let mut changed = false;
        for i in targets {
            let block = self.leaf_mut(i);
            if block.kind != next {
                block.kind = next;
                changed = true;
            }
        }
        trace!(target: "doc.edit", start, end, ?kind, ?next, changed, "toggle_block_kind");
        changed
    }

    /// Quote toggle. When the block at the selection start has a quote
    /// ancestor, the nearest such container is spliced out in place
    /// (preserving order). Otherwise the top-level nodes covering the
    /// selection are wrapped in a new quote container. Toggling twice with no
    /// intervening edit restores the prior structure.
    pub fn toggle_quote(&mut self, start: usize, end: usize) -> QuoteToggle {
        let (anchor, _) = self.resolve(start);
        if self.leaf_quoted(anchor) {
            self.unwrap_quote_of(anchor);
            self.normalize();
            trace!(target: "doc.edit", start, end, "quote_unwrapped");
            QuoteToggle::Unwrapped
        } else {
            let targets = self.leaves_in_range(start, end);
            let first = self.top_level_index_of_leaf(*targets.first().unwrap_or(&anchor));
            let last = self.top_level_index_of_leaf(*targets.last().unwrap_or(&anchor));
            let wrapped: Vec<Node> = self.children.drain(first..=last).collect();
            self.children.insert(first, Node::Quote(wrapped));
            self.normalize();
            trace!(target: "doc.edit", start, end, first, last, "quote_wrapped");
            QuoteToggle::Wrapped
        }
    }

    /// Set `href` across a range, splitting boundary runs.
    pub fn apply_link(&mut self, start: usize, end: usize, url: &str) -> bool {
        if start >= end {
            return false;
        }
        let mut any = false;
        self.for_runs_in_range_mut(start, end, |run| {
            run.href = Some(url.to_string());
            any = true;
        });
        self.normalize();
        trace!(target: "doc.edit", start, end, "apply_link");
        any
    }

    /// Clear `href` across a range.
    pub fn clear_link(&mut self, start: usize, end: usize) -> bool {
        let mut any = false;
        self.for_runs_in_range_mut(start, end, |run| {
            if run.href.take().is_some() {
                any = true;
            }
        });
        self.normalize();
        trace!(target: "doc.edit", start, end, any, "clear_link");
        any
    }

    /// Insert a fresh link run at a caret. Returns the number of characters
    /// inserted (the NFC length of `text`).
    pub fn insert_link(&mut self, offset: usize, text: &str, url: &str) -> usize {
        let text: String = text.nfc().collect();
        if text.is_empty() {
            return 0;
        }
        let inserted = text.chars().count();
        let (leaf_idx, local) = self.resolve_insert(offset);
        let block = self.leaf_mut(leaf_idx);
        let split = block.split_runs_at(local);
        block.runs.insert(
            split,
            Run {
                text,
                marks: crate::Marks::empty(),
                href: Some(url.to_string()),
            },
        );
        self.normalize();
        trace!(target: "doc.edit", offset, inserted, "insert_link");
        inserted
    }

    /// Split the block at a caret offset into two siblings of the same kind.
    /// The caret's linear offset is unchanged by the split.
    pub fn split_block(&mut self, offset: usize) -> bool {
        let (leaf_idx, local) = self.resolve(offset);
        let (kind, tail) = {
            let block = self.leaf_mut(leaf_idx);
            let at = block.split_runs_at(local);
            (block.kind, block.runs.split_off(at))
        };
        self.insert_leaf_after(leaf_idx, Block { kind, runs: tail });
        self.normalize();
        trace!(target: "doc.edit", offset, "split_block");
        true
    }

    /// Merge the leaf at `index` into the one before it, keeping the earlier
    /// block's kind. Linear offsets are unchanged. Returns false for the
    /// first leaf.
    pub fn merge_leaf_into_previous(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.leaf_count() {
            return false;
        }
        let runs = std::mem::take(&mut self.leaf_mut(index).runs);
        self.remove_leaf(index);
        self.leaf_mut(index - 1).runs.extend(runs);
        self.normalize();
        trace!(target: "doc.edit", index, "merge_leaf_into_previous");
        true
    }

    /// Delete one position before a caret offset. On a block boundary the
    /// caret counts as the start of the later block, so the boundary itself
    /// is deleted and the blocks join. Anywhere else the grapheme cluster
    /// ending at the caret is removed. Returns the caret offset after the
    /// edit, or `None` when nothing precedes the caret.
    pub fn delete_backward(&mut self, offset: usize) -> Option<usize> {
        let offset = offset.min(self.char_len());
        let (leaf_idx, local) = self.resolve_forward(offset);
        if local == 0 {
            if leaf_idx == 0 {
                return None;
            }
            self.merge_leaf_into_previous(leaf_idx);
            trace!(target: "doc.edit", offset, "delete_backward_join");
            return Some(offset);
        }
        let text = self.leaf(leaf_idx).text();
        let prev = prev_grapheme_boundary(&text, local);
        let start = offset - (local - prev);
        self.delete_range(start, offset);
        trace!(target: "doc.edit", offset, start, "delete_backward");
        Some(start)
    }

    /// Delete one position after a caret offset. On a block boundary the
    /// caret counts as the end of the earlier block, so the next block joins
    /// into it. Anywhere else the grapheme cluster starting at the caret is
    /// removed. Returns false when nothing follows the caret.
    pub fn delete_forward(&mut self, offset: usize) -> bool {
        let (leaf_idx, local) = self.resolve(offset);
        let len = self.leaf(leaf_idx).char_len();
        if local < len {
            let text = self.leaf(leaf_idx).text();
            let next = next_grapheme_boundary(&text, local);
            self.delete_range(offset, offset + (next - local));
            trace!(target: "doc.edit", offset, "delete_forward");
            true
        } else if leaf_idx + 1 < self.leaf_count() {
            self.merge_leaf_into_previous(leaf_idx + 1);
            trace!(target: "doc.edit", offset, "delete_forward_join");
            true
        } else {
            false
        }
    }

    /// Insert plain text at a caret offset, treating newlines as paragraph
    /// breaks. The first line inherits attributes like `insert_text`; blocks
    /// opened for later lines take the kind of the block at the caret.
    /// Returns the number of characters inserted (line breaks add none).
    pub fn insert_plain_text(&mut self, offset: usize, text: &str) -> usize {
        let text: String = text.nfc().collect();
        if !text.contains('\n') {
            return self.insert_text(offset, &text, None);
        }
        let lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let mut inserted = self.insert_text(offset, lines[0], None);
        self.split_block(offset + inserted);
        let (head, _) = self.resolve(offset + inserted);
        let kind = self.leaf(head).kind;
        for (k, line) in lines[1..lines.len() - 1].iter().enumerate() {
            let mut block = Block::empty(kind);
            if !line.is_empty() {
                block.runs.push(Run::plain(*line));
                inserted += line.chars().count();
            }
            self.insert_leaf_after(head + k, block);
        }
        let last = lines[lines.len() - 1];
        if !last.is_empty() {
            let tail_idx = head + lines.len() - 1;
            self.leaf_mut(tail_idx).runs.insert(0, Run::plain(last));
            inserted += last.chars().count();
        }
        self.normalize();
        trace!(target: "doc.edit", offset, inserted, "insert_plain_text");
        inserted
    }

    fn for_runs_in_range_mut(&mut self, start: usize, end: usize, mut f: impl FnMut(&mut Run)) {
        self.isolate_range(start, end);
        fn walk(
            nodes: &mut [Node],
            pos: &mut usize,
            start: usize,
            end: usize,
            f: &mut impl FnMut(&mut Run),
        ) {
            for node in nodes {
                match node {
                    Node::Leaf(block) => {
                        for run in &mut block.runs {
                            let len = run.char_len();
                            let (rs, re) = (*pos, *pos + len);
                            if len > 0 && rs >= start && re <= end {
                                f(run);
                            }
                            *pos = re;
                        }
                    }
                    Node::Quote(children) => walk(children, pos, start, end, f),
                }
            }
        }
        let mut pos = 0;
        walk(&mut self.children, &mut pos, start, end, &mut f);
    }

    /// Insertion targeting for a caret on a block boundary: the earlier block
    /// receives the insertion unless the block after it is empty, which wins.
    /// Typing right after a paragraph split lands inside the fresh block.
    fn resolve_insert(&self, offset: usize) -> (usize, usize) {
        let (leaf_idx, local) = self.resolve(offset);
        if local > 0
            && local == self.leaf(leaf_idx).char_len()
            && leaf_idx + 1 < self.leaf_count()
            && self.leaf(leaf_idx + 1).is_empty()
        {
            return (leaf_idx + 1, 0);
        }
        (leaf_idx, local)
    }

    /// Split runs so both range endpoints fall on run boundaries.
    fn isolate_range(&mut self, start: usize, end: usize) {
        let (el, e_local) = self.resolve(end);
        self.leaf_mut(el).split_runs_at(e_local);
        let (sl, s_local) = self.resolve_forward(start);
        self.leaf_mut(sl).split_runs_at(s_local);
    }

    fn remove_leaf(&mut self, index: usize) {
        fn walk(nodes: &mut Vec<Node>, target: &mut usize) -> bool {
            let mut i = 0;
            while i < nodes.len() {
                let removed = match &mut nodes[i] {
                    Node::Leaf(_) => {
                        if *target == 0 {
                            nodes.remove(i);
                            return true;
                        }
                        *target -= 1;
                        false
                    }
                    Node::Quote(children) => walk(children, target),
                };
                if removed {
                    return true;
                }
                i += 1;
            }
            false
        }
        let mut target = index;
        walk(&mut self.children, &mut target);
    }

    fn insert_leaf_after(&mut self, index: usize, block: Block) {
        fn walk(nodes: &mut Vec<Node>, target: &mut usize, block: &mut Option<Block>) -> bool {
            let mut i = 0;
            while i < nodes.len() {
                let done = match &mut nodes[i] {
                    Node::Leaf(_) => {
                        if *target == 0 {
                            if let Some(b) = block.take() {
                                nodes.insert(i + 1, Node::Leaf(b));
                            }
                            return true;
                        }
                        *target -= 1;
                        false
                    }
                    Node::Quote(children) => walk(children, target, block),
                };
                if done {
                    return true;
                }
                i += 1;
            }
            false
        }
        let mut target = index;
        let mut block = Some(block);
        walk(&mut self.children, &mut target, &mut block);
    }

    /// Splice the nearest quote ancestor of the leaf at `index` into its
    /// parent, dropping the container.
    fn unwrap_quote_of(&mut self, index: usize) -> bool {
        fn walk(nodes: &mut Vec<Node>, target: &mut usize) -> UnwrapWalk {
            let mut i = 0;
            while i < nodes.len() {
                let inner = match &mut nodes[i] {
                    Node::Leaf(_) => {
                        if *target == 0 {
                            return UnwrapWalk::Found;
                        }
                        *target -= 1;
                        UnwrapWalk::NotFound
                    }
                    Node::Quote(children) => walk(children, target),
                };
                match inner {
                    UnwrapWalk::Done => return UnwrapWalk::Done,
                    UnwrapWalk::Found => {
                        if let Node::Quote(children) = nodes.remove(i) {
                            let mut at = i;
                            for child in children {
                                nodes.insert(at, child);
                                at += 1;
                            }
                        }
                        return UnwrapWalk::Done;
                    }
                    UnwrapWalk::NotFound => {}
                }
                i += 1;
            }
            UnwrapWalk::NotFound
        }
        let mut target = index;
        matches!(walk(&mut self.children, &mut target), UnwrapWalk::Done)
    }

    fn top_level_index_of_leaf(&self, leaf: usize) -> usize {
        let mut count = 0;
        for (i, node) in self.children.iter().enumerate() {
            let n = super::node_leaf_count(node);
            if leaf < count + n {
                return i;
            }
            count += n;
        }
        self.children.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Marks, markup};
    use pretty_assertions::assert_eq;

    fn doc_of(s: &str) -> Document {
        markup::parse(s).expect("parse")
    }

    #[test]
    fn insert_inherits_marks_from_run_ending_at_caret() {
        let mut doc = doc_of("<p><strong>ab</strong>cd</p>");
        doc.insert_text(2, "X", None);
        assert_eq!(doc.to_markup(), "<p><strong>abX</strong>cd</p>");
    }

    #[test]
    fn insert_with_explicit_marks_splits_run() {
        let mut doc = doc_of("<p>abcd</p>");
        doc.insert_text(2, "X", Some(Marks::BOLD));
        assert_eq!(doc.to_markup(), "<p>ab<strong>X</strong>cd</p>");
    }

    #[test]
    fn insert_inside_link_stays_linked_but_boundary_exits() {
        let mut doc = doc_of("<p><a href=\"https://x.com\">ab</a></p>");
        doc.insert_text(1, "-", None);
        assert_eq!(
            doc.to_markup(),
            "<p><a href=\"https://x.com\">a-b</a></p>"
        );
        let mut doc = doc_of("<p><a href=\"https://x.com\">ab</a></p>");
        doc.insert_text(2, "!", None);
        assert_eq!(
            doc.to_markup(),
            "<p><a href=\"https://x.com\">ab</a>!</p>"
        );
    }

    #[test]
    fn insert_normalizes_to_nfc() {
        let mut doc = Document::new();
        // 'e' followed by a combining acute composes to a single char
        doc.insert_text(0, "e\u{301}", None);
        assert_eq!(doc.plain_text(), "\u{e9}");
        assert_eq!(doc.char_len(), 1);
    }

    #[test]
    fn delete_range_within_block() {
        let mut doc = doc_of("<p>hello</p>");
        let removed = doc.delete_range(1, 4);
        assert_eq!(removed, "ell");
        assert_eq!(doc.to_markup(), "<p>ho</p>");
    }

    #[test]
    fn delete_range_merges_blocks() {
        let mut doc = doc_of("<p>ab</p><p>cd</p><p>ef</p>");
        let removed = doc.delete_range(1, 5);
        assert_eq!(removed, "b\ncd\ne");
        assert_eq!(doc.to_markup(), "<p>af</p>");
    }

    #[test]
    fn delete_range_across_quote_prunes_empty_container() {
        let mut doc = doc_of("<p>ab</p><blockquote><p>cd</p></blockquote><p>ef</p>");
        doc.delete_range(1, 5);
        assert_eq!(doc.to_markup(), "<p>af</p>");
    }

    #[test]
    fn toggle_mark_adds_when_mixed() {
        let mut doc = doc_of("<p><strong>ab</strong>cd</p>");
        assert!(doc.toggle_mark(0, 4, Mark::Bold));
        assert_eq!(doc.to_markup(), "<p><strong>abcd</strong></p>");
    }

    #[test]
    fn toggle_mark_removes_when_uniform() {
        let mut doc = doc_of("<p><strong>abcd</strong></p>");
        assert!(doc.toggle_mark(0, 4, Mark::Bold));
        assert_eq!(doc.to_markup(), "<p>abcd</p>");
    }

    #[test]
    fn toggle_mark_partial_coverage_splits_runs() {
        let mut doc = doc_of("<p>hello world</p>");
        assert!(doc.toggle_mark(6, 11, Mark::Italic));
        assert_eq!(doc.to_markup(), "<p>hello <em>world</em></p>");
    }

    #[test]
    fn toggle_mark_over_empty_blocks_only_is_noop() {
        let mut doc = doc_of("<p>a</p><p></p><p>b</p>");
        // range covering only the empty middle block's position
        assert!(!doc.toggle_mark(1, 1, Mark::Bold));
    }

    #[test]
    fn toggle_block_kind_sets_then_reverts() {
        let mut doc = doc_of("<p>a</p><p>b</p>");
        assert!(doc.toggle_block_kind(0, 2, BlockKind::Bulleted));
        assert_eq!(doc.to_markup(), "<ul><li>a</li><li>b</li></ul>");
        assert!(doc.toggle_block_kind(0, 2, BlockKind::Bulleted));
        assert_eq!(doc.to_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn toggle_block_kind_mixed_unifies() {
        let mut doc = doc_of("<ul><li>a</li></ul><p>b</p>");
        assert!(doc.toggle_block_kind(0, 2, BlockKind::Bulleted));
        assert_eq!(doc.to_markup(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn toggle_quote_wraps_and_unwraps() {
        let mut doc = doc_of("<p>a</p><p>b</p>");
        assert_eq!(doc.toggle_quote(0, 0), QuoteToggle::Wrapped);
        assert_eq!(doc.to_markup(), "<blockquote><p>a</p></blockquote><p>b</p>");
        assert_eq!(doc.toggle_quote(0, 0), QuoteToggle::Unwrapped);
        assert_eq!(doc.to_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn toggle_quote_unwraps_nearest_container() {
        let mut doc = doc_of(
            "<blockquote><blockquote><p>a</p></blockquote><p>b</p></blockquote>",
        );
        doc.toggle_quote(0, 0);
        assert_eq!(
            doc.to_markup(),
            "<blockquote><p>a</p><p>b</p></blockquote>"
        );
    }

    #[test]
    fn toggle_quote_wraps_selection_span() {
        let mut doc = doc_of("<p>ab</p><p>cd</p><p>ef</p>");
        doc.toggle_quote(1, 3);
        assert_eq!(
            doc.to_markup(),
            "<blockquote><p>ab</p><p>cd</p></blockquote><p>ef</p>"
        );
    }

    #[test]
    fn apply_link_then_clear_round_trips() {
        let mut doc = doc_of("<p>hello world</p>");
        assert!(doc.apply_link(6, 11, "https://x.com"));
        assert_eq!(
            doc.to_markup(),
            "<p>hello <a href=\"https://x.com\">world</a></p>"
        );
        assert!(doc.clear_link(6, 11));
        assert_eq!(doc.to_markup(), "<p>hello world</p>");
    }

    #[test]
    fn insert_link_at_caret() {
        let mut doc = doc_of("<p>ab</p>");
        let n = doc.insert_link(1, "here", "https://x.com");
        assert_eq!(n, 4);
        assert_eq!(
            doc.to_markup(),
            "<p>a<a href=\"https://x.com\">here</a>b</p>"
        );
    }

    #[test]
    fn split_block_keeps_kind_and_offsets() {
        let mut doc = doc_of("<ul><li>abcd</li></ul>");
        doc.split_block(2);
        assert_eq!(doc.to_markup(), "<ul><li>ab</li><li>cd</li></ul>");
        assert_eq!(doc.char_len(), 4);
    }

    #[test]
    fn merge_leaf_into_previous_keeps_earlier_kind() {
        let mut doc = doc_of("<p>ab</p><ul><li>cd</li></ul>");
        assert!(doc.merge_leaf_into_previous(1));
        assert_eq!(doc.to_markup(), "<p>abcd</p>");
    }

    #[test]
    fn merge_first_leaf_is_noop() {
        let mut doc = doc_of("<p>ab</p>");
        assert!(!doc.merge_leaf_into_previous(0));
    }

    #[test]
    fn merge_out_of_quote_prunes_empty_container() {
        let mut doc = doc_of("<p>ab</p><blockquote><p>cd</p></blockquote>");
        assert!(doc.merge_leaf_into_previous(1));
        assert_eq!(doc.to_markup(), "<p>abcd</p>");
    }

    #[test]
    fn typing_after_split_lands_in_new_block() {
        let mut doc = doc_of("<p>ab</p>");
        doc.split_block(2);
        doc.insert_text(2, "x", None);
        assert_eq!(doc.to_markup(), "<p>ab</p><p>x</p>");
    }

    #[test]
    fn boundary_insert_prefers_earlier_block_when_next_has_text() {
        let mut doc = doc_of("<p>ab</p><p>cd</p>");
        doc.insert_text(2, "x", None);
        assert_eq!(doc.to_markup(), "<p>abx</p><p>cd</p>");
    }

    #[test]
    fn delete_backward_removes_grapheme_cluster() {
        let mut doc = doc_of("<p>a\u{1F1FA}\u{1F1F8}</p>");
        assert_eq!(doc.delete_backward(3), Some(1));
        assert_eq!(doc.to_markup(), "<p>a</p>");
    }

    #[test]
    fn delete_backward_on_boundary_joins_blocks() {
        let mut doc = doc_of("<p>ab</p><p>cd</p>");
        assert_eq!(doc.delete_backward(2), Some(2));
        assert_eq!(doc.to_markup(), "<p>abcd</p>");
    }

    #[test]
    fn delete_backward_undoes_a_split() {
        let mut doc = doc_of("<p>ab</p>");
        doc.split_block(2);
        assert_eq!(doc.delete_backward(2), Some(2));
        assert_eq!(doc.to_markup(), "<p>ab</p>");
    }

    #[test]
    fn delete_backward_at_document_start_is_noop() {
        let mut doc = doc_of("<p>ab</p>");
        assert_eq!(doc.delete_backward(0), None);
        assert_eq!(doc.to_markup(), "<p>ab</p>");
    }

    #[test]
    fn delete_forward_removes_grapheme_cluster() {
        let mut doc = doc_of("<p>a\u{1F1FA}\u{1F1F8}b</p>");
        assert!(doc.delete_forward(1));
        assert_eq!(doc.to_markup(), "<p>ab</p>");
    }

    #[test]
    fn delete_forward_at_block_end_joins_next() {
        let mut doc = doc_of("<p>ab</p><p>cd</p>");
        assert!(doc.delete_forward(2));
        assert_eq!(doc.to_markup(), "<p>abcd</p>");
    }

    #[test]
    fn delete_forward_at_document_end_is_noop() {
        let mut doc = doc_of("<p>ab</p>");
        assert!(!doc.delete_forward(2));
        assert_eq!(doc.to_markup(), "<p>ab</p>");
    }

    #[test]
    fn delete_forward_swallows_empty_block() {
        let mut doc = doc_of("<p>ab</p><p></p><p>cd</p>");
        assert!(doc.delete_forward(2));
        assert_eq!(doc.to_markup(), "<p>ab</p><p>cd</p>");
    }

    #[test]
    fn insert_plain_text_splits_on_newlines() {
        let mut doc = doc_of("<p>ad</p>");
        let n = doc.insert_plain_text(1, "b\nc");
        assert_eq!(n, 2);
        assert_eq!(doc.to_markup(), "<p>ab</p><p>cd</p>");
    }

    #[test]
    fn insert_plain_text_keeps_blank_lines() {
        let mut doc = Document::new();
        let n = doc.insert_plain_text(0, "x\n\ny");
        assert_eq!(n, 2);
        assert_eq!(doc.to_markup(), "<p>x</p><p><br/></p><p>y</p>");
    }

    #[test]
    fn insert_plain_text_single_line_inherits_marks() {
        let mut doc = doc_of("<p><strong>ab</strong></p>");
        doc.insert_plain_text(1, "x");
        assert_eq!(doc.to_markup(), "<p><strong>axb</strong></p>");
    }

    #[test]
    fn insert_plain_text_strips_carriage_returns() {
        let mut doc = Document::new();
        let n = doc.insert_plain_text(0, "a\r\nb");
        assert_eq!(n, 2);
        assert_eq!(doc.to_markup(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn insert_plain_text_continues_list_kind() {
        let mut doc = doc_of("<ul><li>ab</li></ul>");
        doc.insert_plain_text(2, "x\ny");
        assert_eq!(doc.to_markup(), "<ul><li>abx</li><li>y</li></ul>");
    }
}
