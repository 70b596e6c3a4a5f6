//! Structured document model for rich text editing.
//!
//! A `Document` is a small tree: leaf blocks of styled text runs, optionally
//! grouped under quote containers. Offsets are linear character positions over
//! the concatenation of run text in document order; block boundaries carry no
//! width, and an offset falling exactly between two blocks resolves to the end
//! of the earlier one. Mutation primitives (in `edit`) keep the tree
//! normalized: no empty runs, adjacent runs with identical attributes merged,
//! empty quote containers pruned, and at least one block present. The `markup`
//! module round-trips the committed string form the host exchanges with us.

use unicode_segmentation::UnicodeSegmentation;

pub mod edit;
pub mod markup;

pub use markup::MarkupError;

bitflags::bitflags! {
    /// Inline formatting attributes of a text run.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Marks: u8 {
        const BOLD = 1;
        const ITALIC = 2;
        const UNDERLINE = 4;
    }
}

/// Selector for a single inline mark, used by toggle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

impl Mark {
    pub const fn flag(self) -> Marks {
        match self {
            Mark::Bold => Marks::BOLD,
            Mark::Italic => Marks::ITALIC,
            Mark::Underline => Marks::UNDERLINE,
        }
    }
}

/// Block-level role of a leaf block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    #[default]
    Paragraph,
    Bulleted,
    Numbered,
}

/// A maximal span of text sharing one set of inline attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub marks: Marks,
    pub href: Option<String>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::empty(),
            href: None,
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
            href: None,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn same_attrs(&self, other: &Run) -> bool {
        self.marks == other.marks && self.href == other.href
    }

    /// Split the run at a character offset, returning the tail with the same
    /// attributes. `at` is clamped to the run length.
    fn split_off(&mut self, at: usize) -> Run {
        let byte = byte_of_char(&self.text, at);
        let tail = self.text.split_off(byte);
        Run {
            text: tail,
            marks: self.marks,
            href: self.href.clone(),
        }
    }
}

/// A leaf block: a run vector plus its block-level kind. A block with no runs
/// is an empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub runs: Vec<Run>,
}

impl Block {
    pub fn empty(kind: BlockKind) -> Self {
        Self {
            kind,
            runs: Vec::new(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Locate a block-local character offset. Returns `(run index, offset in
    /// run)`; an offset on a run boundary resolves to the end of the earlier
    /// run. For an empty block this is `(0, 0)`.
    pub fn locate(&self, local: usize) -> (usize, usize) {
        let mut remaining = local;
        for (i, run) in self.runs.iter().enumerate() {
            let len = run.char_len();
            if remaining <= len {
                return (i, remaining);
            }
            remaining -= len;
        }
        let last = self.runs.len().saturating_sub(1);
        (last, self.runs.last().map(Run::char_len).unwrap_or(0))
    }

    /// Split runs so that `local` falls on a run boundary. Returns the run
    /// index of that boundary (`runs[..idx]` strictly before, `runs[idx..]`
    /// at or after the offset).
    pub fn split_runs_at(&mut self, local: usize) -> usize {
        let mut remaining = local;
        for i in 0..self.runs.len() {
            if remaining == 0 {
                return i;
            }
            let len = self.runs[i].char_len();
            if remaining < len {
                let tail = self.runs[i].split_off(remaining);
                self.runs.insert(i + 1, tail);
                return i + 1;
            }
            remaining -= len;
        }
        self.runs.len()
    }

    /// Drop empty runs and merge adjacent runs carrying identical attributes.
    fn coalesce(&mut self) {
        self.runs.retain(|r| !r.text.is_empty());
        let mut i = 0;
        while i + 1 < self.runs.len() {
            if self.runs[i].same_attrs(&self.runs[i + 1]) {
                let next = self.runs.remove(i + 1);
                self.runs[i].text.push_str(&next.text);
            } else {
                i += 1;
            }
        }
    }
}

/// Tree node: either a leaf block or a quote container grouping child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Block),
    Quote(Vec<Node>),
}

fn node_leaf_count(node: &Node) -> usize {
    match node {
        Node::Leaf(_) => 1,
        Node::Quote(children) => children.iter().map(node_leaf_count).sum(),
    }
}

/// A leaf block observed during traversal, with its quote-ancestry bit.
#[derive(Debug, Clone, Copy)]
pub struct LeafRef<'a> {
    pub block: &'a Block,
    pub quoted: bool,
}

/// The editable document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    children: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// The empty document: a single empty paragraph.
    pub fn new() -> Self {
        Self {
            children: vec![Node::Leaf(Block::empty(BlockKind::Paragraph))],
        }
    }

    pub(crate) fn from_nodes(children: Vec<Node>) -> Self {
        let mut doc = Self { children };
        doc.normalize();
        doc
    }

    /// Build a document from plain text; newlines become paragraph breaks.
    pub fn from_plain_text(text: &str) -> Self {
        let children = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                let mut block = Block::empty(BlockKind::Paragraph);
                if !line.is_empty() {
                    block.runs.push(Run::plain(line));
                }
                Node::Leaf(block)
            })
            .collect();
        Self::from_nodes(children)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// True when the document is exactly one empty paragraph.
    pub fn is_empty(&self) -> bool {
        matches!(
            self.children.as_slice(),
            [Node::Leaf(block)] if block.kind == BlockKind::Paragraph && block.is_empty()
        )
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(self)
    }

    pub fn leaves(&self) -> Vec<LeafRef<'_>> {
        fn collect<'a>(nodes: &'a [Node], quoted: bool, out: &mut Vec<LeafRef<'a>>) {
            for node in nodes {
                match node {
                    Node::Leaf(block) => out.push(LeafRef { block, quoted }),
                    Node::Quote(children) => collect(children, true, out),
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.children, false, &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.children.iter().map(node_leaf_count).sum()
    }

    pub fn leaf(&self, index: usize) -> &Block {
        fn walk<'a>(nodes: &'a [Node], target: &mut usize) -> Option<&'a Block> {
            for node in nodes {
                match node {
                    Node::Leaf(block) => {
                        if *target == 0 {
                            return Some(block);
                        }
                        *target -= 1;
                    }
                    Node::Quote(children) => {
                        if let Some(found) = walk(children, target) {
                            return Some(found);
                        }
                    }
                }
            }
            None
        }
        let mut target = index;
        walk(&self.children, &mut target).unwrap_or_else(|| {
            panic!("leaf index {index} out of bounds");
        })
    }

    pub(crate) fn leaf_mut(&mut self, index: usize) -> &mut Block {
        fn walk<'a>(nodes: &'a mut [Node], target: &mut usize) -> Option<&'a mut Block> {
            for node in nodes {
                match node {
                    Node::Leaf(block) => {
                        if *target == 0 {
                            return Some(block);
                        }
                        *target -= 1;
                    }
                    Node::Quote(children) => {
                        if let Some(found) = walk(children, target) {
                            return Some(found);
                        }
                    }
                }
            }
            None
        }
        let mut target = index;
        walk(&mut self.children, &mut target).unwrap_or_else(|| {
            panic!("leaf index {index} out of bounds");
        })
    }

    /// Total characters across all runs. Block boundaries contribute nothing.
    pub fn char_len(&self) -> usize {
        self.leaves().iter().map(|l| l.block.char_len()).sum()
    }

    /// Leaf text joined with newlines, the plain-text projection of the tree.
    pub fn plain_text(&self) -> String {
        let parts: Vec<String> = self.leaves().iter().map(|l| l.block.text()).collect();
        parts.join("\n")
    }

    /// First character offset of a leaf block.
    pub fn leaf_start(&self, index: usize) -> usize {
        self.leaves()
            .iter()
            .take(index)
            .map(|l| l.block.char_len())
            .sum()
    }

    /// Resolve a linear character offset to `(leaf index, block-local
    /// offset)`. An offset on a block boundary resolves to the end of the
    /// earlier block; out-of-range offsets clamp to the document end.
    pub fn resolve(&self, offset: usize) -> (usize, usize) {
        let leaves = self.leaves();
        let mut remaining = offset;
        for (i, leaf) in leaves.iter().enumerate() {
            let len = leaf.block.char_len();
            if remaining <= len {
                return (i, remaining);
            }
            remaining -= len;
        }
        let last = leaves.len().saturating_sub(1);
        let end = leaves.last().map(|l| l.block.char_len()).unwrap_or(0);
        (last, end)
    }

    /// Range-start resolution: a boundary offset claims the start of the
    /// later block so forward operations act on the content that follows.
    pub(crate) fn resolve_forward(&self, offset: usize) -> (usize, usize) {
        let leaves = self.leaves();
        let mut remaining = offset;
        for (i, leaf) in leaves.iter().enumerate() {
            let len = leaf.block.char_len();
            if remaining < len || (remaining == len && i + 1 == leaves.len()) {
                return (i, remaining);
            }
            if remaining == len {
                remaining = 0;
                continue;
            }
            remaining -= len;
        }
        let last = leaves.len().saturating_sub(1);
        let end = leaves.last().map(|l| l.block.char_len()).unwrap_or(0);
        (last, end)
    }

    /// Whether the leaf at `index` sits under a quote container.
    pub fn leaf_quoted(&self, index: usize) -> bool {
        self.leaves().get(index).map(|l| l.quoted).unwrap_or(false)
    }

    /// Visit every run whose character span overlaps `[start, end)`.
    pub fn runs_in_range(&self, start: usize, end: usize, mut visit: impl FnMut(&Run)) {
        fn walk(
            nodes: &[Node],
            pos: &mut usize,
            start: usize,
            end: usize,
            visit: &mut impl FnMut(&Run),
        ) {
            for node in nodes {
                match node {
                    Node::Leaf(block) => {
                        for run in &block.runs {
                            let len = run.char_len();
                            let (rs, re) = (*pos, *pos + len);
                            if rs < end && re > start {
                                visit(run);
                            }
                            *pos = re;
                        }
                    }
                    Node::Quote(children) => walk(children, pos, start, end, visit),
                }
            }
        }
        let mut pos = 0;
        walk(&self.children, &mut pos, start, end, &mut visit);
    }

    /// Leaf indices a selection intersects. A caret intersects exactly the
    /// leaf it resolves to; a range intersects every leaf it covers at least
    /// one character of, plus empty blocks strictly inside it.
    pub fn leaves_in_range(&self, start: usize, end: usize) -> Vec<usize> {
        if start >= end {
            return vec![self.resolve(start.min(end)).0];
        }
        let mut out = Vec::new();
        let mut pos = 0;
        for (i, leaf) in self.leaves().iter().enumerate() {
            let len = leaf.block.char_len();
            let (ls, le) = (pos, pos + len);
            let hit = if len == 0 {
                start <= ls && ls < end
            } else {
                ls < end && le > start
            };
            if hit {
                out.push(i);
            }
            pos = le;
        }
        if out.is_empty() {
            out.push(self.resolve(start).0);
        }
        out
    }

    /// Plain text covered by `[start, end)`, with newlines at leaf breaks.
    pub fn text_in_range(&self, start: usize, end: usize) -> String {
        if start >= end {
            return String::new();
        }
        let mut out = String::new();
        let mut pos = 0;
        let mut last_leaf_hit: Option<usize> = None;
        for (i, leaf) in self.leaves().iter().enumerate() {
            for run in &leaf.block.runs {
                let len = run.char_len();
                let (rs, re) = (pos, pos + len);
                if rs < end && re > start {
                    if let Some(prev) = last_leaf_hit
                        && prev != i
                    {
                        out.push('\n');
                    }
                    last_leaf_hit = Some(i);
                    let from = start.saturating_sub(rs);
                    let to = (end - rs).min(len);
                    out.extend(run.text.chars().skip(from).take(to - from));
                }
                pos = re;
            }
        }
        out
    }

    /// Restore the tree invariants after a mutation.
    pub fn normalize(&mut self) {
        fn normalize_nodes(nodes: &mut Vec<Node>) {
            for node in nodes.iter_mut() {
                match node {
                    Node::Leaf(block) => block.coalesce(),
                    Node::Quote(children) => normalize_nodes(children),
                }
            }
            nodes.retain(|node| match node {
                Node::Quote(children) => !children.is_empty(),
                Node::Leaf(_) => true,
            });
        }
        normalize_nodes(&mut self.children);
        if self.children.is_empty() {
            self.children
                .push(Node::Leaf(Block::empty(BlockKind::Paragraph)));
        }
        // A lone whitespace-only paragraph is one of the host surface's
        // "empty line" shapes and canonicalizes to the empty document.
        if let [Node::Leaf(block)] = self.children.as_mut_slice()
            && block.kind == BlockKind::Paragraph
            && block.text().chars().all(char::is_whitespace)
        {
            block.runs.clear();
        }
    }
}

/// Byte index of a character offset in `text`, clamped to the text length.
pub(crate) fn byte_of_char(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Largest grapheme-cluster boundary strictly before `char_offset`.
pub fn prev_grapheme_boundary(text: &str, char_offset: usize) -> usize {
    let mut prev = 0;
    let mut acc = 0;
    for g in text.graphemes(true) {
        if acc >= char_offset {
            break;
        }
        prev = acc;
        acc += g.chars().count();
    }
    prev
}

/// Smallest grapheme-cluster boundary strictly after `char_offset`, clamped
/// to the text length.
pub fn next_grapheme_boundary(text: &str, char_offset: usize) -> usize {
    let mut acc = 0;
    for g in text.graphemes(true) {
        let next = acc + g.chars().count();
        if next > char_offset {
            return next;
        }
        acc = next;
    }
    acc
}
