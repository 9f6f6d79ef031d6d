//! Tolerant HTML fragment parsing.
//!
//! Builds a [`Tree`] from any input. Unknown end tags are ignored, void
//! elements never take children, and the common implied end tags (`p`, `li`,
//! `dt`/`dd`, table rows and cells, `option`) are closed the way a browser
//! would close them. Elements nested deeper than [`MAX_DEPTH`] are flattened
//! into their deepest allowed ancestor.

use crate::tokenizer::{Token, tokenize_lenient};
use crate::tree::{NodeData, NodeId, Tree};

/// Deepest element nesting a parsed fragment keeps.
pub const MAX_DEPTH: usize = 256;

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Start tags that close an open `p`.
const CLOSES_P: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Elements that stop the search for an open `p` to close.
const P_SCOPE: &[&str] = &[
    "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

impl Tree {
    /// Parses an HTML fragment into a new tree under the document node.
    ///
    /// # Example
    /// ```
    /// use block_html::Tree;
    ///
    /// let tree = Tree::parse_fragment("<p>one<p>two");
    /// assert_eq!(tree.inner_html(tree.root()), "<p>one</p><p>two</p>");
    /// ```
    pub fn parse_fragment(html: &str) -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append_html(root, html);
        tree
    }

    /// Parses `html` and appends the resulting nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) {
        let mut stack: Vec<(String, NodeId)> = Vec::new();
        let mut flattened = false;

        for token in tokenize_lenient(html) {
            let current = stack.last().map_or(parent, |(_, id)| *id);
            match token {
                Token::Text(text) => self.append_text(current, &text),
                Token::Comment(text) => {
                    let comment = self.create_comment(text);
                    self.append(current, comment);
                }
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    close_implied(&mut stack, &name);
                    let current = stack.last().map_or(parent, |(_, id)| *id);
                    let opens = !self_closing && !is_void_element(&name);
                    if opens && stack.len() >= MAX_DEPTH {
                        if !flattened {
                            tracing::debug!(depth = MAX_DEPTH, "Flattening deeply nested markup");
                            flattened = true;
                        }
                        continue;
                    }
                    let element = self.create_element_with_attrs(&name, attributes);
                    self.append(current, element);
                    if opens {
                        stack.push((name, element));
                    }
                }
                Token::EndTag { name } => {
                    if let Some(depth) = stack.iter().rposition(|(open, _)| *open == name) {
                        stack.truncate(depth);
                    } else if name == "br" {
                        let br = self.create_element("br");
                        self.append(current, br);
                    }
                }
            }
        }
    }

    fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.last_child(parent) {
            if let NodeData::Text(existing) = self.data_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }
}

fn close_implied(stack: &mut Vec<(String, NodeId)>, name: &str) {
    if CLOSES_P.contains(&name) {
        close_in_scope(stack, "p", P_SCOPE);
    }
    match name {
        "li" => close_in_scope(stack, "li", &["ol", "ul", "menu"]),
        "dt" | "dd" => {
            close_in_scope(stack, "dt", &["dl"]);
            close_in_scope(stack, "dd", &["dl"]);
        }
        "tr" => close_in_scope(stack, "tr", &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => {
            close_in_scope(stack, "td", &["tr", "table"]);
            close_in_scope(stack, "th", &["tr", "table"]);
        }
        "thead" | "tbody" | "tfoot" => {
            close_in_scope(stack, "tr", &["table"]);
            for section in ["thead", "tbody", "tfoot"] {
                close_in_scope(stack, section, &["table"]);
            }
        }
        "option" => close_in_scope(stack, "option", &["select", "datalist"]),
        _ => {}
    }
}

/// Pops up to and including the innermost open `target`, unless a scope
/// boundary is open above it.
fn close_in_scope(stack: &mut Vec<(String, NodeId)>, target: &str, boundaries: &[&str]) {
    for depth in (0..stack.len()).rev() {
        let open = stack[depth].0.as_str();
        if open == target {
            stack.truncate(depth);
            return;
        }
        if boundaries.contains(&open) {
            return;
        }
    }
}
