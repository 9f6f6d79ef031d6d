//! Attribute sourcing: reading attribute values out of saved markup.
//!
//! Values come either from the comment header or, for attributes that
//! declare a [`AttributeSource`], from the block's inner HTML. Every value is
//! then coerced to its declared type; a missing value takes the default, and
//! an attribute with neither is left out.

use crate::attribute::{AttributeDefinition, AttributeSchema, AttributeSource, AttributeType, Attributes};
use crate::coerce::coerce;
use block_html::{NodeData, NodeId, Tree};
use serde_json::{Map, Value};
use std::cell::OnceCell;
use tracing::warn;

/// A block's inner HTML, parsed at most once.
pub struct SourceDocument<'a> {
    html: &'a str,
    tree: OnceCell<Tree>,
}

impl<'a> SourceDocument<'a> {
    pub fn new(html: &'a str) -> Self {
        Self {
            html,
            tree: OnceCell::new(),
        }
    }

    pub fn html(&self) -> &'a str {
        self.html
    }

    pub fn tree(&self) -> &Tree {
        self.tree.get_or_init(|| Tree::parse_fragment(self.html))
    }
}

/// Resolves every attribute of `schema` for a block.
///
/// Header values win over markup for sourced attributes too, so values the
/// serializer had to write to the header are read back.
///
/// # Example
/// ```
/// use block_model::{AttributeDefinition, AttributeSchema, AttributeSource, Attributes};
/// use block_model::source::get_block_attributes;
/// use serde_json::json;
///
/// let mut schema = AttributeSchema::new();
/// schema.insert(
///     "url".into(),
///     AttributeDefinition::string().with_source(AttributeSource::attribute("img", "src")),
/// );
/// schema.insert("width".into(), AttributeDefinition::number());
///
/// let mut header = Attributes::new();
/// header.insert("width".into(), json!(300));
///
/// let attrs = get_block_attributes(&schema, r#"<img src="a.png">"#, &header);
/// assert_eq!(attrs["url"], json!("a.png"));
/// assert_eq!(attrs["width"], json!(300));
/// ```
pub fn get_block_attributes(schema: &AttributeSchema, inner_html: &str, header: &Attributes) -> Attributes {
    let document = SourceDocument::new(inner_html);
    schema
        .iter()
        .filter_map(|(key, definition)| {
            get_block_attribute(key, definition, &document, header).map(|value| (key.clone(), value))
        })
        .collect()
}

/// Resolves a single attribute; `None` when it has no value and no default.
pub fn get_block_attribute(
    key: &str,
    definition: &AttributeDefinition,
    document: &SourceDocument<'_>,
    header: &Attributes,
) -> Option<Value> {
    let from_header = header.get(key).cloned();
    let value = match (&definition.source, from_header) {
        (_, Some(value)) => Some(coerce(value, definition.kind)),
        (None, None) => None,
        (Some(source), None) => {
            let tree = document.tree();
            resolve_source(document, tree, tree.root(), source, definition.kind)
                .map(|raw| coerce_sourced(key, raw, definition.kind))
        }
    };
    finish(value, definition)
}

/// Reads the raw value a source describes, relative to `scope`.
///
/// Returns `None` when the source matches nothing.
pub fn resolve_source(
    document: &SourceDocument<'_>,
    tree: &Tree,
    scope: NodeId,
    source: &AttributeSource,
    kind: AttributeType,
) -> Option<Value> {
    match source {
        AttributeSource::Attribute {
            selector,
            attribute,
        } => {
            let value = target(tree, scope, selector.as_deref()).and_then(|node| tree.attr(node, attribute));
            if kind == AttributeType::Boolean {
                return Some(Value::Bool(value.is_some()));
            }
            value.map(|v| Value::String(v.to_string()))
        }
        AttributeSource::Property { selector, property } => {
            let node = target(tree, scope, selector.as_deref())?;
            property_value(tree, node, property)
        }
        AttributeSource::Text { selector } => {
            let node = target(tree, scope, selector.as_deref())?;
            Some(Value::String(tree.text_content(node)))
        }
        AttributeSource::Html {
            selector,
            multiline,
        } => {
            let Some(node) = target(tree, scope, selector.as_deref()) else {
                return Some(Value::String(String::new()));
            };
            let html = match multiline {
                Some(tag) => tree
                    .children(node)
                    .into_iter()
                    .filter(|child| tree.is_tag(*child, tag))
                    .map(|child| tree.outer_html(child))
                    .collect(),
                None => tree.inner_html(node),
            };
            Some(Value::String(html))
        }
        AttributeSource::Children { selector } => {
            let children = target(tree, scope, selector.as_deref())
                .map(|node| children_to_json(tree, node))
                .unwrap_or_default();
            Some(Value::Array(children))
        }
        AttributeSource::Node { selector } => {
            let node = target(tree, scope, selector.as_deref())?;
            node_to_json(tree, node)
        }
        AttributeSource::Query { selector, query } => {
            let items = tree
                .query_all(scope, selector)
                .into_iter()
                .map(|element| {
                    let object: Map<String, Value> = query
                        .iter()
                        .filter_map(|(key, definition)| {
                            let value = definition.source.as_ref().and_then(|source| {
                                resolve_source(document, tree, element, source, definition.kind)
                                    .map(|raw| coerce_sourced(key, raw, definition.kind))
                            });
                            finish(value, definition).map(|v| (key.clone(), v))
                        })
                        .collect();
                    Value::Object(object)
                })
                .collect();
            Some(Value::Array(items))
        }
        AttributeSource::Tag { selector } => {
            let node = target(tree, scope, selector.as_deref())?;
            tree.tag_name(node).map(|name| Value::String(name.to_lowercase()))
        }
        AttributeSource::Raw => Some(Value::String(if scope == tree.root() {
            document.html().to_string()
        } else {
            tree.inner_html(scope)
        })),
    }
}

/// Converts the children of `node` to structured JSON.
///
/// Text nodes become strings and elements become
/// `{"type": tag, "props": {...attributes, "children": [...]}}`. Comments
/// are dropped.
pub fn children_to_json(tree: &Tree, node: NodeId) -> Vec<Value> {
    tree.children(node)
        .into_iter()
        .filter_map(|child| node_to_json(tree, child))
        .collect()
}

/// Converts one node to structured JSON; see [`children_to_json`].
pub fn node_to_json(tree: &Tree, node: NodeId) -> Option<Value> {
    match tree.data(node) {
        NodeData::Text(text) => Some(Value::String(text.clone())),
        NodeData::Element(element) => {
            let mut props: Map<String, Value> = element
                .attrs
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            props.insert("children".to_string(), Value::Array(children_to_json(tree, node)));
            let mut object = Map::new();
            object.insert("type".to_string(), Value::String(element.name.clone()));
            object.insert("props".to_string(), Value::Object(props));
            Some(Value::Object(object))
        }
        NodeData::Document => Some(Value::Array(children_to_json(tree, node))),
        NodeData::Comment(_) => None,
    }
}

fn target(tree: &Tree, scope: NodeId, selector: Option<&str>) -> Option<NodeId> {
    match selector {
        Some(selector) => tree.query(scope, selector),
        None => Some(scope),
    }
}

fn property_value(tree: &Tree, node: NodeId, property: &str) -> Option<Value> {
    let value = match property {
        "textContent" | "innerText" => tree.text_content(node),
        "innerHTML" => tree.inner_html(node),
        "outerHTML" => tree.outer_html(node),
        "nodeName" | "tagName" => tree.tag_name(node)?.to_uppercase(),
        "localName" => tree.tag_name(node)?.to_string(),
        "nodeValue" => tree.text(node)?.to_string(),
        "className" => tree.attr(node, "class").unwrap_or_default().to_string(),
        "id" => tree.attr(node, "id").unwrap_or_default().to_string(),
        "childElementCount" => {
            let count = tree.children(node).into_iter().filter(|c| tree.is_element(*c)).count();
            return Some(Value::from(count));
        }
        other => return tree.attr(node, other).map(|v| Value::String(v.to_string())),
    };
    Some(Value::String(value))
}

fn coerce_sourced(key: &str, raw: Value, kind: AttributeType) -> Value {
    let coerced = coerce(raw.clone(), kind);
    if coerced != raw {
        warn!(attribute = key, expected = %kind, found = %raw, "Coerced sourced attribute value");
    }
    coerced
}

fn finish(value: Option<Value>, definition: &AttributeDefinition) -> Option<Value> {
    match value {
        Some(value) if definition.is_allowed(&value) => Some(value),
        _ => definition.default.clone(),
    }
}
