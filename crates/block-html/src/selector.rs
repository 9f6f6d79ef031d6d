//! A small CSS selector engine.
//!
//! Supports type (`p`), universal (`*`), class (`.a`), id (`#a`) and
//! attribute selectors (`[a]`, `[a=v]`, `[a~=v]`, `[a^=v]`, `[a$=v]`,
//! `[a*=v]`), compound selectors (`img.wide[alt]`), the descendant and child
//! combinators, and comma-separated lists.

use crate::error::{Error, Result};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

impl AttrSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Includes(v) => value.split_whitespace().any(|token| token == v),
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        let Some(element) = tree.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != element.name {
                return false;
            }
        }
        self.ids.iter().all(|v| element.attr("id") == Some(v.as_str()))
            && self
                .classes
                .iter()
                .all(|class| element.classes().any(|c| c == class))
            && self.attrs.iter().all(|a| a.matches(element.attr(&a.name)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One comma-separated alternative: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// `parts[i].0` joins `parts[i]` to `parts[i - 1]`; ignored for the first.
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        self.matches_from(tree, id, self.parts.len() - 1)
    }

    fn matches_from(&self, tree: &Tree, id: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(tree, id) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => tree
                .parent(id)
                .is_some_and(|p| self.matches_from(tree, p, index - 1)),
            Combinator::Descendant => {
                let mut next = tree.parent(id);
                while let Some(ancestor) = next {
                    if self.matches_from(tree, ancestor, index - 1) {
                        return true;
                    }
                    next = tree.parent(ancestor);
                }
                false
            }
        }
    }
}

/// A parsed selector list.
///
/// # Example
/// ```
/// use block_html::{Selector, Tree};
///
/// let tree = Tree::parse_fragment("<ul><li class=\"a\">1</li><li>2</li></ul>");
/// let selector = Selector::parse("ul > li.a").unwrap();
/// let found = selector.select(&tree, tree.root());
/// assert_eq!(found.len(), 1);
/// assert_eq!(tree.text_content(found[0]), "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in selector.split(',') {
            alternatives.push(parse_complex(selector, part.trim())?);
        }
        Ok(Self {
            source: selector.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(tree, id))
    }

    /// Descendants of `scope` that match, in document order.
    ///
    /// Like `querySelectorAll`, combinators may match ancestors of `scope`.
    pub fn select(&self, tree: &Tree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .filter(|id| self.matches(tree, *id))
            .collect()
    }

    /// First matching descendant of `scope`.
    pub fn select_first(&self, tree: &Tree, scope: NodeId) -> Option<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .find(|id| self.matches(tree, *id))
    }
}

impl std::str::FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_complex(full: &str, text: &str) -> Result<Complex> {
    if text.is_empty() {
        return Err(Error::selector(full, "empty selector"));
    }
    let chars: Vec<char> = text.chars().collect();
    let mut parts: Vec<(Combinator, Compound)> = Vec::new();
    let mut combinator = Combinator::Descendant;
    let mut i = 0;

    while i < chars.len() {
        let mut saw_space = false;
        while i < chars.len() && chars[i].is_whitespace() {
            saw_space = true;
            i += 1;
        }
        if i < chars.len() && chars[i] == '>' {
            if parts.is_empty() {
                return Err(Error::selector(full, "leading combinator"));
            }
            combinator = Combinator::Child;
            i += 1;
            continue;
        }
        if saw_space && combinator != Combinator::Child {
            combinator = Combinator::Descendant;
        }
        if i >= chars.len() {
            break;
        }

        let (compound, next) = parse_compound(full, &chars, i)?;
        parts.push((combinator, compound));
        combinator = Combinator::Descendant;
        i = next;
    }

    if parts.is_empty() {
        return Err(Error::selector(full, "empty selector"));
    }
    Ok(Complex { parts })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(full: &str, chars: &[char], mut i: usize) -> Result<(Compound, usize)> {
    let mut compound = Compound::default();

    if chars[i] == '*' {
        compound.tag = Some("*".to_string());
        i += 1;
    } else if is_ident_char(chars[i]) {
        let (tag, next) = read_ident(chars, i);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '.' | '#' => {
                let (name, next) = read_ident(chars, i + 1);
                if name.is_empty() {
                    return Err(Error::selector(full, "expected a name"));
                }
                if chars[i] == '.' {
                    compound.classes.push(name);
                } else {
                    compound.ids.push(name);
                }
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .ok_or_else(|| Error::selector(full, "unclosed attribute selector"))?;
                let body: String = chars[i + 1..i + close].iter().collect();
                compound.attrs.push(parse_attr(full, &body)?);
                i += close + 1;
            }
            c if c.is_whitespace() || c == '>' => break,
            c => return Err(Error::selector(full, format!("unexpected character {c:?}"))),
        }
    }

    if compound.is_empty() {
        return Err(Error::selector(full, "empty compound selector"));
    }
    Ok((compound, i))
}

fn parse_attr(full: &str, body: &str) -> Result<AttrSelector> {
    let body = body.trim();
    let Some(eq) = body.find('=') else {
        if body.is_empty() {
            return Err(Error::selector(full, "empty attribute selector"));
        }
        return Ok(AttrSelector {
            name: body.to_ascii_lowercase(),
            op: AttrOp::Exists,
        });
    };

    let (lhs, rhs) = (&body[..eq], &body[eq + 1..]);
    let value = rhs.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    let (name, op) = match lhs.chars().last() {
        Some('~') => (&lhs[..lhs.len() - 1], AttrOp::Includes(value)),
        Some('^') => (&lhs[..lhs.len() - 1], AttrOp::Prefix(value)),
        Some('$') => (&lhs[..lhs.len() - 1], AttrOp::Suffix(value)),
        Some('*') => (&lhs[..lhs.len() - 1], AttrOp::Contains(value)),
        _ => (lhs, AttrOp::Equals(value)),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::selector(full, "missing attribute name"));
    }
    Ok(AttrSelector {
        name: name.to_ascii_lowercase(),
        op,
    })
}

impl Tree {
    /// Descendants of `scope` matching a selector string.
    ///
    /// An invalid selector matches nothing.
    pub fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Ok(selector) => selector.select(self, scope),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid selector");
                Vec::new()
            }
        }
    }

    /// First descendant of `scope` matching a selector string.
    pub fn query(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        match Selector::parse(selector) {
            Ok(selector) => selector.select_first(self, scope),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid selector");
                None
            }
        }
    }

    /// Whether an element matches a selector string.
    pub fn matches_selector(&self, id: NodeId, selector: &str) -> bool {
        Selector::parse(selector).is_ok_and(|s| s.matches(self, id))
    }
}
