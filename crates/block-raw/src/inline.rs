//! Inline content detection and filtering.

use block_html::{NodeId, Tree};
use block_model::phrasing_content_schema;
use block_model::schema::is_text_content;

use crate::clean::remove_invalid_html;
use crate::filter::{FilterContext, deep_filter_html, element_children};
use crate::filters::{INLINE_CLEANUP_FILTERS, INLINE_FILTERS};

/// Tags that may be pasted into each other without becoming blocks, such as
/// list items into a list.
const INLINE_TAG_GROUPS: &[&[&str]] = &[&["ul", "li", "ol"], &["h1", "h2", "h3", "h4", "h5", "h6"]];

fn is_inline(tree: &Tree, node: NodeId, context_tag: Option<&str>) -> bool {
    let Some(tag) = tree.tag_name(node) else {
        return true;
    };
    if is_text_content(tag) {
        return true;
    }
    let Some(context_tag) = context_tag else {
        return false;
    };
    INLINE_TAG_GROUPS
        .iter()
        .any(|group| group.contains(&tag) && group.contains(&context_tag))
}

fn all_inline(tree: &Tree, nodes: &[NodeId], context_tag: Option<&str>) -> bool {
    nodes
        .iter()
        .all(|node| is_inline(tree, *node, context_tag) && all_inline(tree, &element_children(tree, *node), context_tag))
}

fn is_double_br(tree: &Tree, node: NodeId) -> bool {
    tree.is_tag(node, "br") && tree.prev_sibling(node).is_some_and(|prev| tree.is_tag(prev, "br"))
}

/// Whether `html` can be inserted inside an existing block as is.
///
/// Text-level elements always can. Other elements can only when they belong
/// to the same family as `context_tag`, the tag of the receiving element.
/// A double line break marks a paragraph boundary and makes the content
/// block content.
pub fn is_inline_content(html: &str, context_tag: Option<&str>) -> bool {
    let tree = Tree::parse_fragment(html);
    let nodes = element_children(&tree, tree.root());
    !nodes.iter().any(|node| is_double_br(&tree, *node)) && all_inline(&tree, &nodes, context_tag)
}

/// Reduces `html` to the phrasing content allowed inside a block.
pub fn filter_inline_html(html: &str, context: &FilterContext<'_>) -> String {
    let html = deep_filter_html(html, INLINE_FILTERS, context);
    let html = remove_invalid_html(&html, &phrasing_content_schema(true), true);
    let html = deep_filter_html(&html, INLINE_CLEANUP_FILTERS, context);
    tracing::debug!(html = %html, "Processed inline HTML");
    html
}
