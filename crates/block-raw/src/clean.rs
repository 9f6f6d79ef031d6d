//! Schema-driven removal of disallowed markup.

use block_html::{NodeId, Tree};
use block_model::{ContentSchema, SchemaChildren, SchemaNode, TEXT_NODE};

use crate::filter::{is_empty, is_phrasing_node, next_element_sibling};

/// Removes everything `schema` does not allow from `html`.
///
/// Disallowed elements are unwrapped so their content survives and is
/// checked against the same schema. Allowed elements lose attributes and
/// classes the schema does not list, and are dropped when they should have
/// content but are empty. With `inline`, a `br` takes the place of each
/// unwrapped block element that is followed by another element.
///
/// # Example
/// ```
/// use block_model::phrasing_content_schema;
/// use block_raw::remove_invalid_html;
///
/// let html = remove_invalid_html(r#"<div><b style="x">Hi</b></div>"#, &phrasing_content_schema(true), false);
/// assert_eq!(html, "<b>Hi</b>");
/// ```
pub fn remove_invalid_html(html: &str, schema: &ContentSchema, inline: bool) -> String {
    let mut tree = Tree::parse_fragment(html);
    let root = tree.root();
    clean_children(&mut tree, root, schema, inline);
    tree.to_html()
}

fn clean_children(tree: &mut Tree, parent: NodeId, schema: &ContentSchema, inline: bool) {
    for node in tree.children(parent) {
        clean_node(tree, node, schema, inline);
    }
}

/// The schema rule that admits `node`, if any.
fn rule_for<'s>(tree: &Tree, node: NodeId, schema: &'s ContentSchema) -> Option<&'s SchemaNode> {
    let key = if tree.is_text(node) {
        TEXT_NODE
    } else {
        tree.tag_name(node)?
    };
    let rule = schema.get(key)?;
    match &rule.is_match {
        Some(is_match) if !is_match(tree, node) => None,
        _ => Some(rule),
    }
}

fn clean_node(tree: &mut Tree, node: NodeId, schema: &ContentSchema, inline: bool) {
    let Some(rule) = rule_for(tree, node, schema) else {
        clean_children(tree, node, schema, inline);
        if inline && !is_phrasing_node(tree, node) && next_element_sibling(tree, node).is_some() {
            let br = tree.create_element("br");
            tree.insert_after(node, br);
        }
        tree.unwrap(node);
        return;
    };
    if !tree.is_element(node) {
        return;
    }

    if rule.children.is_some() && !rule.allow_empty && is_empty(tree, node) {
        tree.remove(node);
        return;
    }

    tree.retain_attrs(node, |name, _| name == "class" || rule.attributes.iter().any(|a| a == name));
    if let Some(class) = tree.attr(node, "class").map(str::to_string) {
        let kept: Vec<&str> = class.split_whitespace().filter(|c| rule.allows_class(c)).collect();
        if kept.is_empty() {
            tree.remove_attr(node, "class");
        } else {
            tree.set_attr(node, "class", kept.join(" "));
        }
    }

    if !tree.has_children(node) {
        return;
    }
    match &rule.children {
        None => {
            for child in tree.children(node) {
                tree.remove(child);
            }
        }
        Some(SchemaChildren::Any) => {}
        Some(children) => {
            let requirement_missing =
                !rule.require.is_empty() && tree.query(node, &rule.require.join(",")).is_none();
            if requirement_missing {
                clean_children(tree, node, schema, inline);
                tree.unwrap(node);
            } else if tree.parent(node) == Some(tree.root()) && is_phrasing_node(tree, node) {
                clean_children(tree, node, schema, inline);
                let holds_blocks = tree
                    .children(node)
                    .into_iter()
                    .any(|child| !is_phrasing_node(tree, child));
                if holds_blocks {
                    tree.unwrap(node);
                }
            } else {
                let child_schema = children.resolve().unwrap_or_default();
                clean_children(tree, node, &child_schema, inline);
            }
        }
    }
}
