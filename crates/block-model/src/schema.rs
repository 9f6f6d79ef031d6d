//! Content schemas: which elements, attributes and classes a block accepts
//! when it is created from pasted HTML.

use crate::transform::NodeMatchFn;
use block_html::{NodeId, Tree};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Allowed elements keyed by tag name; `#text` allows text nodes.
pub type ContentSchema = BTreeMap<String, SchemaNode>;

/// Schema key that admits text nodes.
pub const TEXT_NODE: &str = "#text";

/// What an element may contain.
#[derive(Clone, PartialEq)]
pub enum SchemaChildren {
    /// Children are left untouched.
    Any,
    /// Phrasing content, minus the named element so it cannot nest in itself.
    Phrasing { exclude: Option<String> },
    Schema(ContentSchema),
}

impl SchemaChildren {
    /// The schema children are checked against.
    pub fn resolve(&self) -> Option<ContentSchema> {
        match self {
            Self::Any => None,
            Self::Phrasing { exclude } => {
                let mut schema = phrasing_content_schema(true);
                if let Some(tag) = exclude {
                    schema.remove(tag);
                }
                Some(schema)
            }
            Self::Schema(schema) => Some(schema.clone()),
        }
    }

    fn merge(self, other: SchemaChildren) -> SchemaChildren {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => Self::Any,
            (Self::Schema(a), Self::Schema(b)) => Self::Schema(merge_schemas(a, b)),
            (Self::Phrasing { exclude: a }, Self::Phrasing { exclude: b }) => {
                // The union only keeps an exclusion both sides agree on.
                let exclude = if a == b { a } else { None };
                Self::Phrasing { exclude }
            }
            (a, b) => match (a.resolve(), b.resolve()) {
                (Some(a), Some(b)) => Self::Schema(merge_schemas(a, b)),
                _ => Self::Any,
            },
        }
    }
}

impl fmt::Debug for SchemaChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Phrasing { exclude } => f.debug_struct("Phrasing").field("exclude", exclude).finish(),
            Self::Schema(schema) => f.debug_set().entries(schema.keys()).finish(),
        }
    }
}

/// Rules for one allowed element.
#[derive(Clone, Default)]
pub struct SchemaNode {
    /// Attributes kept on the element; `class` is governed by `classes`.
    pub attributes: Vec<String>,
    /// Classes kept on the element. A trailing `*` matches a prefix.
    pub classes: Vec<String>,
    /// `None` means the element may not have children.
    pub children: Option<SchemaChildren>,
    /// Selectors of which at least one must match a descendant.
    pub require: Vec<String>,
    /// Keep the element even when it has no content.
    pub allow_empty: bool,
    /// Extra condition the element must satisfy.
    pub is_match: Option<NodeMatchFn>,
}

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// An element that holds phrasing content.
    pub fn phrasing() -> Self {
        Self::new().with_children(SchemaChildren::Phrasing { exclude: None })
    }

    pub fn with_attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes = attributes.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_children(mut self, children: SchemaChildren) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_child_schema(self, schema: ContentSchema) -> Self {
        self.with_children(SchemaChildren::Schema(schema))
    }

    pub fn with_require(mut self, selectors: &[&str]) -> Self {
        self.require = selectors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn with_match(mut self, is_match: NodeMatchFn) -> Self {
        self.is_match = Some(is_match);
        self
    }

    /// Whether `class` is kept on this element.
    pub fn allows_class(&self, class: &str) -> bool {
        self.classes.iter().any(|rule| match rule.strip_suffix('*') {
            Some(prefix) => class.starts_with(prefix),
            None => rule == class,
        })
    }

    fn merge(mut self, other: SchemaNode) -> SchemaNode {
        for attribute in other.attributes {
            if !self.attributes.contains(&attribute) {
                self.attributes.push(attribute);
            }
        }
        for class in other.classes {
            if !self.classes.contains(&class) {
                self.classes.push(class);
            }
        }
        for selector in other.require {
            if !self.require.contains(&selector) {
                self.require.push(selector);
            }
        }
        self.children = match (self.children.take(), other.children) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        };
        self.allow_empty |= other.allow_empty;
        // An element accepted unconditionally by either side stays accepted.
        self.is_match = match (self.is_match.take(), other.is_match) {
            (Some(a), Some(b)) => Some(Arc::new(move |tree: &Tree, node: NodeId| a(tree, node) || b(tree, node))),
            _ => None,
        };
        self
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.classes == other.classes
            && self.children == other.children
            && self.require == other.require
            && self.allow_empty == other.allow_empty
            && self.is_match.is_some() == other.is_match.is_some()
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("attributes", &self.attributes)
            .field("classes", &self.classes)
            .field("children", &self.children)
            .field("require", &self.require)
            .field("allow_empty", &self.allow_empty)
            .field("is_match", &self.is_match.is_some())
            .finish()
    }
}

/// Deep-merges two schemas; attribute and class lists are unioned.
pub fn merge_schemas(mut a: ContentSchema, b: ContentSchema) -> ContentSchema {
    for (tag, node) in b {
        let merged = match a.remove(&tag) {
            Some(existing) => existing.merge(node),
            None => node,
        };
        a.insert(tag, merged);
    }
    a
}

const TEXT_CONTENT: &[(&str, &[&str])] = &[
    ("strong", &[]),
    ("em", &[]),
    ("s", &[]),
    ("del", &[]),
    ("ins", &[]),
    ("a", &["href", "target", "rel", "id"]),
    ("code", &[]),
    ("abbr", &["title"]),
    ("sub", &[]),
    ("sup", &[]),
    ("br", &[]),
    ("small", &[]),
    ("q", &["cite"]),
    ("dfn", &["title"]),
    ("data", &["value"]),
    ("time", &["datetime"]),
    ("var", &[]),
    ("samp", &[]),
    ("kbd", &[]),
    ("i", &[]),
    ("b", &[]),
    ("u", &[]),
    ("mark", &[]),
    ("ruby", &[]),
    ("rt", &[]),
    ("rp", &[]),
    ("bdi", &["dir"]),
    ("bdo", &["dir"]),
    ("wbr", &[]),
];

const EMBEDDED_CONTENT: &[(&str, &[&str])] = &[
    ("audio", &["src", "preload", "autoplay", "mediagroup", "loop", "muted"]),
    ("canvas", &["width", "height"]),
    ("embed", &["src", "type", "width", "height"]),
    ("img", &["alt", "src", "srcset", "usemap", "ismap", "width", "height"]),
    ("object", &["data", "type", "name", "usemap", "form", "width", "height"]),
    (
        "video",
        &["src", "poster", "preload", "autoplay", "mediagroup", "loop", "muted", "controls", "width", "height"],
    ),
];

/// Elements dropped from phrasing content when it comes from a paste.
const NOT_PASTED: &[&str] = &["u", "abbr", "data", "time", "wbr", "bdi", "bdo"];

/// Schema of inline (phrasing) content.
///
/// Text-level elements may contain phrasing content other than themselves.
/// With `paste`, a few semantic elements that rarely survive a paste
/// meaningfully are left out.
pub fn phrasing_content_schema(paste: bool) -> ContentSchema {
    let mut schema = ContentSchema::new();
    for (tag, attributes) in TEXT_CONTENT {
        if paste && NOT_PASTED.contains(tag) {
            continue;
        }
        let mut node = SchemaNode::new().with_attributes(attributes);
        if *tag != "br" {
            node = node.with_children(SchemaChildren::Phrasing {
                exclude: Some(tag.to_string()),
            });
        }
        schema.insert(tag.to_string(), node);
    }
    for (tag, attributes) in EMBEDDED_CONTENT {
        schema.insert(tag.to_string(), SchemaNode::new().with_attributes(attributes));
    }
    schema.insert(TEXT_NODE.to_string(), SchemaNode::new());
    schema
}

/// Whether an element with this tag is phrasing (inline) content.
pub fn is_phrasing_content(tag: &str) -> bool {
    tag == "span"
        || tag == TEXT_NODE
        || TEXT_CONTENT.iter().any(|(t, _)| *t == tag)
        || EMBEDDED_CONTENT.iter().any(|(t, _)| *t == tag)
}

/// Whether an element with this tag is text-level content.
pub fn is_text_content(tag: &str) -> bool {
    tag == "span" || tag == TEXT_NODE || TEXT_CONTENT.iter().any(|(t, _)| *t == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phrasing_schema_excludes_self_nesting() {
        let schema = phrasing_content_schema(false);
        let strong = schema["strong"].children.as_ref().unwrap().resolve().unwrap();
        assert!(!strong.contains_key("strong"));
        assert!(strong.contains_key("em"));
        assert!(strong.contains_key(TEXT_NODE));
        assert!(schema["br"].children.is_none());
    }

    #[test]
    fn test_paste_schema_drops_semantic_elements() {
        assert!(phrasing_content_schema(false).contains_key("abbr"));
        assert!(!phrasing_content_schema(true).contains_key("abbr"));
        assert!(phrasing_content_schema(true).contains_key("a"));
    }

    #[test]
    fn test_is_phrasing_content() {
        assert!(is_phrasing_content("span"));
        assert!(is_phrasing_content("img"));
        assert!(!is_phrasing_content("p"));
        assert!(is_text_content("em"));
        assert!(!is_text_content("img"));
    }

    #[test]
    fn test_class_rules() {
        let node = SchemaNode::new().with_classes(&["alignleft", "wp-image-*"]);
        assert!(node.allows_class("alignleft"));
        assert!(node.allows_class("wp-image-12"));
        assert!(!node.allows_class("alignright"));
    }

    #[test]
    fn test_merge_unions_attributes_and_children() {
        let mut a = ContentSchema::new();
        a.insert("img".into(), SchemaNode::new().with_attributes(&["src"]));
        let mut b = ContentSchema::new();
        b.insert("img".into(), SchemaNode::new().with_attributes(&["src", "alt"]));
        b.insert("hr".into(), SchemaNode::new());

        let merged = merge_schemas(a, b);
        assert_eq!(merged["img"].attributes, vec!["src", "alt"]);
        assert!(merged.contains_key("hr"));
    }

    #[test]
    fn test_merged_match_accepts_either_side() {
        let is_pre: NodeMatchFn = Arc::new(|tree: &Tree, node: NodeId| tree.is_tag(node, "pre"));
        let is_code: NodeMatchFn = Arc::new(|tree: &Tree, node: NodeId| tree.is_tag(node, "code"));
        let a = ContentSchema::from([("x".to_string(), SchemaNode::new().with_match(is_pre.clone()))]);
        let b = ContentSchema::from([("x".to_string(), SchemaNode::new().with_match(is_code))]);
        let merged = merge_schemas(a, b);

        let tree = Tree::parse_fragment("<pre></pre><code></code><p></p>");
        let nodes = tree.children(tree.root());
        let is_match = merged["x"].is_match.as_ref().unwrap();
        assert!(is_match(&tree, nodes[0]));
        assert!(is_match(&tree, nodes[1]));
        assert!(!is_match(&tree, nodes[2]));

        let open = ContentSchema::from([("x".to_string(), SchemaNode::new())]);
        let c = ContentSchema::from([("x".to_string(), SchemaNode::new().with_match(is_pre))]);
        assert!(merge_schemas(open, c)["x"].is_match.is_none());
    }

    #[test]
    fn test_merging_phrasing_schemas_terminates() {
        let merged = merge_schemas(phrasing_content_schema(true), phrasing_content_schema(true));
        assert_eq!(merged, phrasing_content_schema(true));
        assert_eq!(
            merged["strong"].children,
            Some(SchemaChildren::Phrasing {
                exclude: Some("strong".to_string())
            })
        );
    }

    #[test]
    fn test_phrasing_merge_drops_disagreeing_exclusions() {
        let a = SchemaChildren::Phrasing {
            exclude: Some("em".to_string()),
        };
        let b = SchemaChildren::Phrasing {
            exclude: Some("strong".to_string()),
        };
        assert_eq!(a.merge(b), SchemaChildren::Phrasing { exclude: None });
    }

    #[test]
    fn test_phrasing_merges_with_explicit_schema() {
        let mut list = ContentSchema::new();
        list.insert("li".into(), SchemaNode::phrasing());
        let a = ContentSchema::from([("ul".to_string(), SchemaNode::new().with_child_schema(list))]);
        let b = ContentSchema::from([("ul".to_string(), SchemaNode::phrasing())]);
        let merged = merge_schemas(a, b);
        let Some(SchemaChildren::Schema(children)) = &merged["ul"].children else {
            panic!("expected an explicit child schema");
        };
        assert!(children.contains_key("li"));
        assert!(children.contains_key("strong"));
    }
}
