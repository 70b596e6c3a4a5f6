//! Markup round-trip: the committed string form exchanged with the host.
//!
//! Serialization is canonical: one `<p>` per paragraph, consecutive list
//! blocks grouped under a single `<ul>`/`<ol>`, `<blockquote>` wrapping its
//! children, and inline tags nested `<a>` > `<strong>` > `<em>` > `<u>`. An
//! empty block renders as `<p><br/></p>` except the empty document, which
//! serializes to the empty string. Parsing is deliberately lenient: host
//! surfaces hand us markup with aliases (`<b>`, `<i>`, `<div>`), stray
//! close tags, unknown wrappers, and the bare `<br>` an editable surface
//! uses as its "empty" sentinel. All of those normalize instead of failing;
//! the only hard error is a tag or quoted attribute left open at end of
//! input, which means the payload was truncated mid-token.

use tracing::trace;

use crate::{Block, BlockKind, Document, Marks, Node, Run};

/// Tokenization failure. Tree-level problems (mismatched close tags, unknown
/// elements) are tolerated and never reach this type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(usize),
    #[error("unterminated quoted attribute at byte {0}")]
    UnterminatedAttribute(usize),
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Canonical markup for a document. The empty document is the empty string.
pub fn serialize(doc: &Document) -> String {
    if doc.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    write_nodes(&mut out, doc.children());
    out
}

fn write_nodes(out: &mut String, nodes: &[Node]) {
    let mut i = 0;
    while i < nodes.len() {
        match &nodes[i] {
            Node::Quote(children) => {
                out.push_str("<blockquote>");
                write_nodes(out, children);
                out.push_str("</blockquote>");
                i += 1;
            }
            Node::Leaf(block) => match block.kind {
                BlockKind::Paragraph => {
                    write_block(out, "p", block);
                    i += 1;
                }
                kind @ (BlockKind::Bulleted | BlockKind::Numbered) => {
                    let tag = if kind == BlockKind::Bulleted { "ul" } else { "ol" };
                    out.push('<');
                    out.push_str(tag);
                    out.push('>');
                    // Adjacent siblings of the same kind share one container.
                    while let Some(Node::Leaf(b)) = nodes.get(i)
                        && b.kind == kind
                    {
                        write_block(out, "li", b);
                        i += 1;
                    }
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            },
        }
    }
}

fn write_block(out: &mut String, tag: &str, block: &Block) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    if block.runs.is_empty() {
        out.push_str("<br/>");
    } else {
        for run in &block.runs {
            write_run(out, run);
        }
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_run(out: &mut String, run: &Run) {
    if let Some(href) = &run.href {
        out.push_str("<a href=\"");
        escape_attr_into(out, href);
        out.push_str("\">");
    }
    if run.marks.contains(Marks::BOLD) {
        out.push_str("<strong>");
    }
    if run.marks.contains(Marks::ITALIC) {
        out.push_str("<em>");
    }
    if run.marks.contains(Marks::UNDERLINE) {
        out.push_str("<u>");
    }
    escape_text_into(out, &run.text);
    if run.marks.contains(Marks::UNDERLINE) {
        out.push_str("</u>");
    }
    if run.marks.contains(Marks::ITALIC) {
        out.push_str("</em>");
    }
    if run.marks.contains(Marks::BOLD) {
        out.push_str("</strong>");
    }
    if run.href.is_some() {
        out.push_str("</a>");
    }
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse markup into a normalized document. Lenient per the module contract;
/// `Err` only on truncated input.
pub fn parse(input: &str) -> Result<Document, MarkupError> {
    let tokens = tokenize(input)?;
    let mut builder = TreeBuilder::new();
    for token in tokens {
        builder.feed(token);
    }
    let doc = builder.finish();
    trace!(target: "doc.markup", bytes = input.len(), leaves = doc.leaf_count(), "parsed");
    Ok(doc)
}

#[derive(Debug)]
enum Token {
    Text(String),
    Open {
        name: String,
        href: Option<String>,
        self_closing: bool,
    },
    Close(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, MarkupError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        // A '<' not followed by a tag-ish byte is literal text.
        let starts_tag = matches!(
            bytes.get(pos + 1),
            Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?')
        );
        if !starts_tag {
            pos += 1;
            continue;
        }
        if pos > text_start {
            tokens.push(Token::Text(decode_entities(&input[text_start..pos])));
        }
        // Comments and declarations are skipped wholesale.
        if input[pos..].starts_with("<!--") {
            pos = match input[pos + 4..].find("-->") {
                Some(end) => pos + 4 + end + 3,
                None => bytes.len(),
            };
            text_start = pos;
            continue;
        }
        if matches!(bytes.get(pos + 1), Some(b'!') | Some(b'?')) {
            pos = match input[pos..].find('>') {
                Some(end) => pos + end + 1,
                None => return Err(MarkupError::UnterminatedTag(pos)),
            };
            text_start = pos;
            continue;
        }
        let tag_start = pos;
        pos += 1;
        let closing = bytes.get(pos) == Some(&b'/');
        if closing {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' && bytes[pos] != b'/' {
            pos += 1;
        }
        let name = input[name_start..pos].to_ascii_lowercase();
        let mut href = None;
        let mut self_closing = false;
        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos) {
                None => return Err(MarkupError::UnterminatedTag(tag_start)),
                Some(b'>') => {
                    pos += 1;
                    break;
                }
                Some(b'/') => {
                    self_closing = true;
                    pos += 1;
                }
                Some(_) => {
                    let (attr, value, next) = read_attribute(input, pos)?;
                    if attr.eq_ignore_ascii_case("href")
                        && let Some(value) = value
                    {
                        href = Some(value);
                    }
                    pos = next;
                }
            }
        }
        if name.is_empty() {
            // "<>" or "</>": treat as literal-free noise.
        } else if closing {
            tokens.push(Token::Close(name));
        } else {
            tokens.push(Token::Open {
                name,
                href,
                self_closing,
            });
        }
        text_start = pos;
    }
    if text_start < bytes.len() {
        tokens.push(Token::Text(decode_entities(&input[text_start..])));
    }
    Ok(tokens)
}

/// Read one `name` or `name=value` attribute starting at `pos`. Returns the
/// attribute name, its decoded value when present, and the byte offset just
/// past the attribute.
fn read_attribute(input: &str, pos: usize) -> Result<(String, Option<String>, usize), MarkupError> {
    let bytes = input.as_bytes();
    let name_start = pos;
    let mut pos = pos;
    while pos < bytes.len()
        && !bytes[pos].is_ascii_whitespace()
        && bytes[pos] != b'='
        && bytes[pos] != b'>'
        && bytes[pos] != b'/'
    {
        pos += 1;
    }
    let name = input[name_start..pos].to_string();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'=') {
        return Ok((name, None, pos));
    }
    pos += 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    match bytes.get(pos) {
        Some(&quote @ (b'"' | b'\'')) => {
            let value_start = pos + 1;
            let mut end = value_start;
            while end < bytes.len() && bytes[end] != quote {
                end += 1;
            }
            if end >= bytes.len() {
                return Err(MarkupError::UnterminatedAttribute(pos));
            }
            Ok((name, Some(decode_entities(&input[value_start..end])), end + 1))
        }
        _ => {
            // Unquoted values run to whitespace or '>' so bare URLs keep
            // their slashes.
            let value_start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                pos += 1;
            }
            Ok((name, Some(decode_entities(&input[value_start..pos])), pos))
        }
    }
}

/// Decode the common named entities, `&nbsp;`, and numeric references.
/// Anything unrecognized passes through literally.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        // Entity names are short; a ';' further out means a bare ampersand.
        let semi = rest.bytes().take(32).position(|b| b == b';');
        let Some(semi) = semi else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "#39" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

/// One open inline formatting element: the tag it came from plus its effect.
struct InlineFrame {
    tag: String,
    marks: Marks,
    href: Option<String>,
}

struct TreeBuilder {
    /// One node vector per open quote container; index 0 is the top level.
    dest: Vec<Vec<Node>>,
    list_stack: Vec<BlockKind>,
    inline: Vec<InlineFrame>,
    block: Option<Block>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            dest: vec![Vec::new()],
            list_stack: Vec::new(),
            inline: Vec::new(),
            block: None,
        }
    }

    fn feed(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.text(&text),
            Token::Open {
                name,
                href,
                self_closing,
            } => self.open(&name, href, self_closing),
            Token::Close(name) => self.close(&name),
        }
    }

    fn finish(mut self) -> Document {
        self.finalize_block();
        // Unclosed quotes wrap whatever they collected.
        while self.dest.len() > 1 {
            let children = self.dest.pop().unwrap_or_default();
            if let Some(parent) = self.dest.last_mut() {
                parent.push(Node::Quote(children));
            }
        }
        Document::from_nodes(self.dest.pop().unwrap_or_default())
    }

    fn current_marks(&self) -> Marks {
        self.inline
            .iter()
            .fold(Marks::empty(), |acc, f| acc | f.marks)
    }

    fn current_href(&self) -> Option<String> {
        self.inline.iter().rev().find_map(|f| f.href.clone())
    }

    fn text(&mut self, text: &str) {
        if self.block.is_none() {
            if text.chars().all(char::is_whitespace) {
                // Inter-tag pretty-printing whitespace, not content.
                return;
            }
            // Bare text outside any block gets an implicit paragraph.
            self.block = Some(Block::empty(BlockKind::Paragraph));
        }
        let marks = self.current_marks();
        let href = self.current_href();
        if let Some(block) = &mut self.block {
            block.runs.push(Run {
                text: text.to_string(),
                marks,
                href,
            });
        }
    }

    fn open(&mut self, name: &str, href: Option<String>, self_closing: bool) {
        match name {
            "p" | "div" => {
                self.finalize_block();
                self.block = Some(Block::empty(BlockKind::Paragraph));
            }
            "li" => {
                self.finalize_block();
                let kind = self.list_stack.last().copied().unwrap_or(BlockKind::Bulleted);
                self.block = Some(Block::empty(kind));
            }
            "ul" => {
                self.finalize_block();
                self.list_stack.push(BlockKind::Bulleted);
            }
            "ol" => {
                self.finalize_block();
                self.list_stack.push(BlockKind::Numbered);
            }
            "blockquote" => {
                self.finalize_block();
                self.dest.push(Vec::new());
            }
            "br" => {
                // With content this is a line break (block split); in an
                // empty context it is the surface's "empty line" sentinel
                // and contributes nothing.
                if let Some(block) = &self.block
                    && !block.runs.is_empty()
                {
                    let kind = block.kind;
                    self.finalize_block();
                    self.block = Some(Block::empty(kind));
                }
            }
            _ if self_closing => {}
            _ => {
                let marks = match name {
                    "strong" | "b" => Marks::BOLD,
                    "em" | "i" => Marks::ITALIC,
                    "u" => Marks::UNDERLINE,
                    _ => Marks::empty(),
                };
                let href = if name == "a" { href } else { None };
                self.inline.push(InlineFrame {
                    tag: name.to_string(),
                    marks,
                    href,
                });
            }
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "p" | "div" | "li" => self.finalize_block(),
            "ul" | "ol" => {
                self.finalize_block();
                self.list_stack.pop();
            }
            "blockquote" => {
                self.finalize_block();
                if self.dest.len() > 1 {
                    let children = self.dest.pop().unwrap_or_default();
                    if let Some(parent) = self.dest.last_mut() {
                        parent.push(Node::Quote(children));
                    }
                }
            }
            "br" => {}
            _ => {
                // Pop back to the most recent matching inline frame; a close
                // with no matching open is ignored.
                if let Some(at) = self.inline.iter().rposition(|f| f.tag == name) {
                    self.inline.truncate(at);
                }
            }
        }
    }

    fn finalize_block(&mut self) {
        if let Some(block) = self.block.take()
            && let Some(dest) = self.dest.last_mut()
        {
            dest.push(Node::Leaf(block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(input: &str) -> String {
        serialize(&parse(input).expect("parse"))
    }

    #[test]
    fn serialize_empty_document_is_empty_string() {
        assert_eq!(serialize(&Document::new()), "");
    }

    #[test]
    fn serialize_groups_adjacent_list_items() {
        let doc = parse("<ul><li>a</li></ul><ul><li>b</li></ul><ol><li>c</li></ol>").unwrap();
        assert_eq!(
            serialize(&doc),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>"
        );
    }

    #[test]
    fn serialize_empty_block_uses_br_placeholder() {
        let doc = parse("<p>a</p><p></p>").unwrap();
        assert_eq!(serialize(&doc), "<p>a</p><p><br/></p>");
    }

    #[test]
    fn serialize_inline_nesting_order() {
        let doc = parse(
            "<p><a href=\"https://x.com\"><u><em><strong>z</strong></em></u></a></p>",
        )
        .unwrap();
        assert_eq!(
            serialize(&doc),
            "<p><a href=\"https://x.com\"><strong><em><u>z</u></em></strong></a></p>"
        );
    }

    #[test]
    fn escapes_text_and_attribute_characters() {
        let mut doc = Document::new();
        doc.insert_text(0, "a<b>&c", None);
        doc.apply_link(0, 6, "https://x.com/?q=\"1\"&r=2");
        assert_eq!(
            serialize(&doc),
            "<p><a href=\"https://x.com/?q=&quot;1&quot;&amp;r=2\">a&lt;b&gt;&amp;c</a></p>"
        );
        let reparsed = parse(&serialize(&doc)).unwrap();
        assert_eq!(reparsed.plain_text(), "a<b>&c");
    }

    #[test]
    fn parse_aliases_b_i_and_div() {
        let doc = parse("<div><b>x</b><i>y</i></div>").unwrap();
        assert_eq!(serialize(&doc), "<p><strong>x</strong><em>y</em></p>");
    }

    #[test]
    fn parse_unknown_tags_are_transparent() {
        let doc = parse("<p><span class=\"x\">a<code>b</code></span>c</p>").unwrap();
        assert_eq!(serialize(&doc), "<p>abc</p>");
    }

    #[test]
    fn parse_bare_text_wraps_in_paragraph() {
        let doc = parse("hello").unwrap();
        assert_eq!(serialize(&doc), "<p>hello</p>");
    }

    #[test]
    fn parse_lone_br_is_empty_document() {
        assert!(parse("<br>").unwrap().is_empty());
        assert!(parse("<br/>").unwrap().is_empty());
        assert!(parse("<p><br/></p>").unwrap().is_empty());
    }

    #[test]
    fn parse_br_with_content_splits_block() {
        let doc = parse("<p>a<br>b</p>").unwrap();
        assert_eq!(serialize(&doc), "<p>a</p><p>b</p>");
    }

    #[test]
    fn parse_ignores_dangling_close_tags() {
        let doc = parse("</em><p>a</strong></p></blockquote>").unwrap();
        assert_eq!(serialize(&doc), "<p>a</p>");
    }

    #[test]
    fn parse_recovers_from_interleaved_close() {
        // </strong> closes past the <em> frame; the em styling is dropped
        // for the tail rather than erroring.
        let doc = parse("<p><strong><em>a</strong>b</em></p>").unwrap();
        assert_eq!(
            serialize(&doc),
            "<p><strong><em>a</em></strong>b</p>"
        );
    }

    #[test]
    fn parse_unclosed_quote_wraps_collected_blocks() {
        let doc = parse("<blockquote><p>a</p><p>b</p>").unwrap();
        assert_eq!(
            serialize(&doc),
            "<blockquote><p>a</p><p>b</p></blockquote>"
        );
    }

    #[test]
    fn parse_decodes_entities() {
        let doc = parse("<p>&lt;tag&gt; &amp; &quot;x&quot; &nbsp;&#233;&#x1F600;</p>").unwrap();
        assert_eq!(doc.plain_text(), "<tag> & \"x\" \u{a0}\u{e9}\u{1F600}");
    }

    #[test]
    fn parse_leaves_unknown_entities_literal() {
        let doc = parse("<p>a &unknown; b &#xZZ; c &noclose</p>").unwrap();
        assert_eq!(doc.plain_text(), "a &unknown; b &#xZZ; c &noclose");
    }

    #[test]
    fn parse_skips_comments_and_declarations() {
        let doc = parse("<!-- note --><!DOCTYPE html><p>a</p>").unwrap();
        assert_eq!(serialize(&doc), "<p>a</p>");
    }

    #[test]
    fn parse_drops_inter_tag_whitespace() {
        let doc = parse("<p>a</p>\n  <p>b</p>\n").unwrap();
        assert_eq!(doc.leaf_count(), 2);
        assert_eq!(serialize(&doc), "<p>a</p><p>b</p>");
    }

    #[test]
    fn parse_li_outside_list_defaults_to_bullet() {
        let doc = parse("<li>stray</li>").unwrap();
        assert_eq!(serialize(&doc), "<ul><li>stray</li></ul>");
    }

    #[test]
    fn parse_nested_quote_structure() {
        let input = "<blockquote><p>a</p><blockquote><p>b</p></blockquote></blockquote>";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn parse_anchor_without_href_is_transparent() {
        let doc = parse("<p><a>plain</a></p>").unwrap();
        assert_eq!(serialize(&doc), "<p>plain</p>");
    }

    #[test]
    fn parse_single_quoted_and_bare_attributes() {
        let doc = parse("<p><a href='https://x.com'>a</a><a href=https://y.com>b</a></p>").unwrap();
        assert_eq!(
            serialize(&doc),
            "<p><a href=\"https://x.com\">a</a><a href=\"https://y.com\">b</a></p>"
        );
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert_eq!(parse("<p>a</p><stro"), Err(MarkupError::UnterminatedTag(8)));
        assert_eq!(
            parse("<p><a href=\"https://x"),
            Err(MarkupError::UnterminatedAttribute(11))
        );
    }

    #[test]
    fn round_trip_is_a_fixpoint() {
        let inputs = [
            "<p>plain</p>",
            "<div>alias <b>bold</b></div>",
            "hello <strong>world</strong>",
            "<ul><li>one</li></ul><ul><li>two</li></ul>",
            "<blockquote>quoted text</blockquote>",
            "<p></p><p> </p>",
            "<br>",
            "<p>a<br>b</p>",
        ];
        for input in inputs {
            let once = round_trip(input);
            let twice = round_trip(&once);
            assert_eq!(once, twice, "fixpoint failed for {input:?}");
        }
    }
}
