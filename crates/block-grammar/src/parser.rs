//! Block delimiter parsing.
//!
//! Splits a document into freeform HTML and comment-delimited blocks:
//! ```text
//! <!-- wp:{name} {json}? -->inner markup<!-- /wp:{name} -->
//! <!-- wp:{name} {json}? /-->
//! ```
//!
//! The parser scans linearly once through the document, keeping a stack of
//! open blocks. Closers match the nearest open block of the same name; stray
//! closers stay in the surrounding text, and blocks still open at the end of
//! the document are closed implicitly. Openers nested deeper than
//! [`MAX_NESTING`] are kept as HTML of the innermost block, together with
//! their closers.

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Namespace assumed for delimiters that omit one (`<!-- wp:paragraph -->`).
pub const DEFAULT_NAMESPACE: &str = "core/";

/// Deepest block nesting the parser builds.
pub const MAX_NESTING: usize = 64;

/// Regex for a single block delimiter: opener, closer or void.
///
/// Groups: 1 closer slash, 2 namespace, 3 name, 4 attributes JSON, 5 void slash.
static DELIMITER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--\s+(/)?wp:([a-z][a-z0-9_-]*/)?([a-z][a-z0-9/_-]*)\s+(\{.*?\}\s+)?(/)?-->",
    )
    .expect("Invalid block delimiter regex")
});

/// A piece of the parsed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// HTML outside of any block delimiters.
    Freeform { markup: String },
    /// A delimited block, possibly containing nested blocks.
    Block(BlockNode),
}

impl Segment {
    /// Name of the block, or `None` for freeform HTML.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Freeform { .. } => None,
            Self::Block(node) => Some(&node.name),
        }
    }
}

/// Arrangement of a block's own HTML chunks and its nested blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InnerContent {
    /// A chunk of the block's own HTML.
    Html(String),
    /// Position of the next entry of `inner_blocks`.
    Block,
}

/// A delimited block as found in the document, before any type resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    /// Namespaced name; `core/` is prepended when the delimiter had no namespace.
    pub name: String,
    /// Whether the namespace was implied rather than written.
    pub implicit_namespace: bool,
    /// Raw JSON text from the opener, if any.
    pub attrs_json: Option<String>,
    /// Decoded header attributes. `None` when the JSON could not be decoded.
    pub attrs: Option<Map<String, Value>>,
    /// Nested blocks, in document order.
    pub inner_blocks: Vec<BlockNode>,
    /// The block's own HTML with nested blocks cut out.
    pub inner_html: String,
    /// Interleaving of `inner_html` chunks and nested blocks.
    pub inner_content: Vec<InnerContent>,
    /// Written as `<!-- wp:name /-->`.
    pub self_closing: bool,
}

impl BlockNode {
    fn new(delimiter: &Delimiter<'_>, self_closing: bool) -> Self {
        Self {
            name: delimiter.name.clone(),
            implicit_namespace: delimiter.implicit_namespace,
            attrs_json: delimiter.attrs_json.map(str::to_string),
            attrs: delimiter.decode_attrs(),
            inner_blocks: Vec::new(),
            inner_html: String::new(),
            inner_content: Vec::new(),
            self_closing,
        }
    }

    fn push_html(&mut self, html: &str) {
        if html.is_empty() {
            return;
        }
        self.inner_html.push_str(html);
        self.inner_content.push(InnerContent::Html(html.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterKind {
    Opener,
    Closer,
    Void,
}

#[derive(Debug)]
struct Delimiter<'a> {
    kind: DelimiterKind,
    name: String,
    implicit_namespace: bool,
    attrs_json: Option<&'a str>,
    start: usize,
    end: usize,
}

impl<'a> Delimiter<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let whole = caps.get(0)?;
        let namespace = caps.get(2).map(|m| m.as_str());
        let local = caps.get(3)?.as_str();
        let kind = if caps.get(1).is_some() {
            // Closers carrying attributes or a void slash are tolerated as closers.
            DelimiterKind::Closer
        } else if caps.get(5).is_some() {
            DelimiterKind::Void
        } else {
            DelimiterKind::Opener
        };

        Some(Self {
            kind,
            name: format!("{}{}", namespace.unwrap_or(DEFAULT_NAMESPACE), local),
            implicit_namespace: namespace.is_none(),
            attrs_json: caps.get(4).map(|m| m.as_str().trim_end()),
            start: whole.start(),
            end: whole.end(),
        })
    }

    fn decode_attrs(&self) -> Option<Map<String, Value>> {
        let Some(json) = self.attrs_json else {
            return Some(Map::new());
        };
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => Some(map),
            Ok(other) => {
                tracing::debug!(name = %self.name, ?other, "Block attributes are not an object");
                None
            }
            Err(e) => {
                tracing::debug!(name = %self.name, error = %e, "Malformed block attributes");
                None
            }
        }
    }
}

struct Frame {
    node: BlockNode,
    token_start: usize,
    token_end: usize,
    prev_offset: usize,
    leading_html_start: Option<usize>,
}

struct Parser<'a> {
    document: &'a str,
    /// Start of top-level text not yet emitted.
    offset: usize,
    /// Where the next delimiter search begins.
    scan_from: usize,
    output: Vec<Segment>,
    stack: Vec<Frame>,
    /// Openers past `MAX_NESTING` whose closers are still expected.
    suppressed: usize,
}

/// Parses a document into an ordered list of segments.
///
/// Never fails: input without delimiters is a single freeform segment, and an
/// empty document yields no segments at all.
///
/// # Example
/// ```
/// use block_grammar::{parse, Segment};
///
/// let segments = parse("<!-- wp:core/test {\"smoked\":\"yes\"} -->Brisket<!-- /wp:core/test -->");
/// assert_eq!(segments.len(), 1);
/// let Segment::Block(node) = &segments[0] else { panic!("expected a block") };
/// assert_eq!(node.name, "core/test");
/// assert_eq!(node.inner_html, "Brisket");
/// ```
pub fn parse(document: &str) -> Vec<Segment> {
    let mut parser = Parser {
        document,
        offset: 0,
        scan_from: 0,
        output: Vec::new(),
        stack: Vec::new(),
        suppressed: 0,
    };
    while parser.proceed() {}
    parser.output
}

impl<'a> Parser<'a> {
    fn next_delimiter(&mut self) -> Option<Delimiter<'a>> {
        let document = self.document;
        loop {
            let caps = DELIMITER_REGEX.captures_at(document, self.scan_from)?;
            let whole = caps.get(0)?;
            self.scan_from = whole.end();
            if let Some(delimiter) = Delimiter::from_captures(&caps) {
                return Some(delimiter);
            }
        }
    }

    fn proceed(&mut self) -> bool {
        let Some(delimiter) = self.next_delimiter() else {
            self.finish();
            return false;
        };

        let leading_html_start = (delimiter.start > self.offset).then_some(self.offset);

        match delimiter.kind {
            DelimiterKind::Void => {
                let node = BlockNode::new(&delimiter, true);
                if self.stack.is_empty() {
                    if let Some(start) = leading_html_start {
                        self.push_freeform(start, delimiter.start);
                    }
                    self.output.push(Segment::Block(node));
                } else {
                    self.add_inner_block(node, delimiter.start, delimiter.end, None);
                }
                self.offset = delimiter.end;
            }
            DelimiterKind::Opener if self.stack.len() >= MAX_NESTING => {
                if self.suppressed == 0 {
                    tracing::debug!(at = delimiter.start, depth = MAX_NESTING, "Keeping deeply nested block as HTML");
                }
                self.suppressed += 1;
            }
            DelimiterKind::Closer if self.suppressed > 0 => self.suppressed -= 1,
            DelimiterKind::Opener => {
                self.stack.push(Frame {
                    node: BlockNode::new(&delimiter, false),
                    token_start: delimiter.start,
                    token_end: delimiter.end,
                    prev_offset: delimiter.end,
                    leading_html_start,
                });
                self.offset = delimiter.end;
            }
            DelimiterKind::Closer => self.close(&delimiter),
        }
        true
    }

    fn close(&mut self, closer: &Delimiter<'_>) {
        let Some(depth) = self
            .stack
            .iter()
            .rposition(|frame| frame.node.name == closer.name)
        else {
            // Stray closer: it stays part of the surrounding HTML.
            tracing::debug!(name = %closer.name, at = closer.start, "Unmatched block closer");
            return;
        };

        // Blocks opened after the matching one were never closed.
        while self.stack.len() > depth + 1 {
            self.close_top_into_parent(closer.start, closer.start);
        }

        if self.stack.len() == 1 {
            self.add_block_from_stack(Some(closer.start));
        } else {
            self.close_top_into_parent(closer.start, closer.end);
        }
        self.offset = closer.end;
    }

    /// Closes the innermost open block at `html_end` and attaches it to its parent.
    fn close_top_into_parent(&mut self, html_end: usize, resume_at: usize) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let html = self.document.get(frame.prev_offset..html_end).unwrap_or("");
        frame.node.push_html(html);
        self.add_inner_block(frame.node, frame.token_start, frame.token_end, Some(resume_at));
    }

    fn add_inner_block(
        &mut self,
        node: BlockNode,
        token_start: usize,
        token_end: usize,
        last_offset: Option<usize>,
    ) {
        let document = self.document;
        let Some(parent) = self.stack.last_mut() else {
            self.output.push(Segment::Block(node));
            return;
        };
        let html = document.get(parent.prev_offset..token_start).unwrap_or("");
        parent.node.push_html(html);
        parent.node.inner_blocks.push(node);
        parent.node.inner_content.push(InnerContent::Block);
        parent.prev_offset = last_offset.unwrap_or(token_end);
    }

    fn add_block_from_stack(&mut self, end_offset: Option<usize>) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let end = end_offset.unwrap_or(self.document.len());
        let html = self.document.get(frame.prev_offset..end).unwrap_or("");
        frame.node.push_html(html);

        if let Some(start) = frame.leading_html_start {
            self.push_freeform(start, frame.token_start);
        }
        self.output.push(Segment::Block(frame.node));
    }

    fn finish(&mut self) {
        if self.stack.is_empty() {
            self.push_freeform(self.offset, self.document.len());
            return;
        }

        // Missing closers are assumed at the end of the document.
        let end = self.document.len();
        while self.stack.len() > 1 {
            self.close_top_into_parent(end, end);
        }
        self.add_block_from_stack(None);
    }

    fn push_freeform(&mut self, start: usize, end: usize) {
        let markup = self.document.get(start..end).unwrap_or("");
        if !markup.is_empty() {
            self.output.push(Segment::Freeform {
                markup: markup.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(segment: &Segment) -> &BlockNode {
        match segment {
            Segment::Block(node) => node,
            Segment::Freeform { markup } => panic!("expected block, got freeform {markup:?}"),
        }
    }

    fn depth(node: &BlockNode) -> usize {
        let mut depth = 1;
        let mut current = node;
        while let Some(inner) = current.inner_blocks.first() {
            depth += 1;
            current = inner;
        }
        depth
    }

    #[test]
    fn test_unclosed_openers_are_capped() {
        let segments = parse(&"<!-- wp:group -->".repeat(20_000));
        assert_eq!(segments.len(), 1);
        assert_eq!(depth(block(&segments[0])), MAX_NESTING);
    }

    #[test]
    fn test_deep_balanced_nesting_keeps_extra_levels_as_html() {
        let levels = 5_000;
        let doc = format!(
            "{}<p>x</p>{}",
            "<!-- wp:group -->".repeat(levels),
            "<!-- /wp:group -->".repeat(levels)
        );
        let segments = parse(&doc);
        assert_eq!(segments.len(), 1);
        let outer = block(&segments[0]);
        assert_eq!(depth(outer), MAX_NESTING);

        let mut innermost = outer;
        while let Some(inner) = innermost.inner_blocks.first() {
            innermost = inner;
        }
        assert!(innermost.inner_html.starts_with("<!-- wp:group -->"));
        assert!(innermost.inner_html.contains("<p>x</p>"));
        assert!(innermost.inner_html.ends_with("<!-- /wp:group -->"));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_freeform_only() {
        let segments = parse("<p>Just HTML</p>");
        assert_eq!(
            segments,
            vec![Segment::Freeform {
                markup: "<p>Just HTML</p>".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_block_with_attributes() {
        let segments =
            parse(r#"<!-- wp:core/test {"smoked":"yes"} -->Brisket<!-- /wp:core/test -->"#);
        assert_eq!(segments.len(), 1);
        let node = block(&segments[0]);
        assert_eq!(node.name, "core/test");
        assert_eq!(node.inner_html, "Brisket");
        assert_eq!(node.attrs_json.as_deref(), Some(r#"{"smoked":"yes"}"#));
        assert_eq!(
            node.attrs.as_ref().and_then(|a| a.get("smoked")),
            Some(&Value::String("yes".into()))
        );
        assert!(!node.self_closing);
    }

    #[test]
    fn test_namespace_defaults_to_core() {
        let segments = parse("<!-- wp:paragraph --><p>a</p><!-- /wp:paragraph -->");
        let node = block(&segments[0]);
        assert_eq!(node.name, "core/paragraph");
        assert!(node.implicit_namespace);
    }

    #[test]
    fn test_void_block() {
        let segments = parse(r#"<!-- wp:separator {"a":1} /-->"#);
        let node = block(&segments[0]);
        assert!(node.self_closing);
        assert_eq!(node.inner_html, "");
        assert_eq!(node.attrs.as_ref().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_malformed_json_yields_no_attrs() {
        let segments = parse("<!-- wp:core/test {not json} -->x<!-- /wp:core/test -->");
        let node = block(&segments[0]);
        assert!(node.attrs.is_none());
    }

    #[test]
    fn test_nested_blocks_record_inner_content() {
        let doc = "<!-- wp:core/quote --><blockquote><!-- wp:core/paragraph --><p>a</p><!-- /wp:core/paragraph --></blockquote><!-- /wp:core/quote -->";
        let segments = parse(doc);
        assert_eq!(segments.len(), 1);
        let quote = block(&segments[0]);
        assert_eq!(quote.inner_html, "<blockquote></blockquote>");
        assert_eq!(
            quote.inner_content,
            vec![
                InnerContent::Html("<blockquote>".into()),
                InnerContent::Block,
                InnerContent::Html("</blockquote>".into()),
            ]
        );
        assert_eq!(quote.inner_blocks[0].inner_html, "<p>a</p>");
    }

    #[test]
    fn test_leading_and_trailing_freeform() {
        let segments = parse("before<!-- wp:core/a -->x<!-- /wp:core/a -->after");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].name(), None);
        assert_eq!(segments[1].name(), Some("core/a"));
        assert_eq!(
            segments[2],
            Segment::Freeform {
                markup: "after".into()
            }
        );
    }

    #[test]
    fn test_stray_closer_stays_freeform() {
        let segments = parse("a<!-- /wp:core/a -->b");
        assert_eq!(
            segments,
            vec![Segment::Freeform {
                markup: "a<!-- /wp:core/a -->b".into()
            }]
        );
    }

    #[test]
    fn test_unclosed_opener_closes_at_end() {
        let segments = parse("<!-- wp:core/a -->dangling");
        let node = block(&segments[0]);
        assert_eq!(node.inner_html, "dangling");
    }

    #[test]
    fn test_mismatched_closer_kept_in_inner_html() {
        let segments = parse("<!-- wp:core/a -->x<!-- /wp:core/b -->y<!-- /wp:core/a -->");
        assert_eq!(segments.len(), 1);
        let node = block(&segments[0]);
        assert_eq!(node.inner_html, "x<!-- /wp:core/b -->y");
    }

    #[test]
    fn test_closer_closes_unclosed_inner_blocks() {
        let segments = parse("<!-- wp:core/a --><!-- wp:core/b -->inner<!-- /wp:core/a -->");
        assert_eq!(segments.len(), 1);
        let outer = block(&segments[0]);
        assert_eq!(outer.inner_blocks.len(), 1);
        assert_eq!(outer.inner_blocks[0].inner_html, "inner");
    }
}
