//! Node filters and the depth-first walk that applies them.

use block_html::{NodeId, Tree};
use block_model::ContentSchema;
use block_model::schema::is_phrasing_content;
use tracing::trace;

/// What every filter can see besides the node itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Schema of the block content accepted by the registered raw transforms.
    pub schema: &'a ContentSchema,
    pub allow_unfiltered_html: bool,
}

/// A node-local rewrite of a parsed fragment.
///
/// A filter may change, replace or remove the node it is given, and may touch
/// the node's siblings and ancestors.
pub trait NodeFilter: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn apply(&self, tree: &mut Tree, node: NodeId, context: &FilterContext<'_>);
}

/// Runs `filters` over the children of `parent`, deepest nodes first.
///
/// The children of a node are collected when the walk reaches it, so nodes a
/// filter inserts are not visited in the same pass. A filter is skipped once
/// an earlier one has taken the node out of the tree.
pub fn deep_filter(tree: &mut Tree, parent: NodeId, filters: &[&dyn NodeFilter], context: &FilterContext<'_>) {
    // Each frame holds a node whose filters run once its children are done.
    let mut stack: Vec<(Option<NodeId>, std::vec::IntoIter<NodeId>)> = vec![(None, tree.children(parent).into_iter())];

    while let Some((_, pending)) = stack.last_mut() {
        match pending.next() {
            Some(child) => {
                let grandchildren = tree.children(child).into_iter();
                stack.push((Some(child), grandchildren));
            }
            None => {
                if let Some((Some(node), _)) = stack.pop() {
                    apply_filters(tree, node, filters, context);
                }
            }
        }
    }
}

fn apply_filters(tree: &mut Tree, node: NodeId, filters: &[&dyn NodeFilter], context: &FilterContext<'_>) {
    for filter in filters {
        if !tree.is_attached(node) {
            break;
        }
        filter.apply(tree, node, context);
        if !tree.is_attached(node) {
            trace!(filter = filter.name(), "Filter took node out of the tree");
        }
    }
}

/// Parses `html`, filters it and returns the resulting markup.
pub fn deep_filter_html(html: &str, filters: &[&dyn NodeFilter], context: &FilterContext<'_>) -> String {
    let mut tree = Tree::parse_fragment(html);
    let root = tree.root();
    deep_filter(&mut tree, root, filters, context);
    tree.to_html()
}

/// Nearest sibling in `direction` that is phrasing content, climbing out of
/// phrasing parents when the node is at their edge.
pub(crate) fn phrasing_sibling(tree: &Tree, node: NodeId, next: bool) -> Option<NodeId> {
    let sibling = if next { tree.next_sibling(node) } else { tree.prev_sibling(node) };
    if let Some(sibling) = sibling {
        if is_phrasing_node(tree, sibling) {
            return Some(sibling);
        }
    }
    let parent = tree.parent(node)?;
    if !is_phrasing_node(tree, parent) {
        return None;
    }
    phrasing_sibling(tree, parent, next)
}

/// Whether a node of any kind counts as phrasing content.
pub(crate) fn is_phrasing_node(tree: &Tree, node: NodeId) -> bool {
    if tree.is_text(node) {
        return true;
    }
    tree.tag_name(node).is_some_and(is_phrasing_content)
}

/// Previous sibling that is an element, skipping text and comments.
pub(crate) fn prev_element_sibling(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.prev_sibling(node);
    while let Some(sibling) = current {
        if tree.is_element(sibling) {
            return Some(sibling);
        }
        current = tree.prev_sibling(sibling);
    }
    None
}

/// Next sibling that is an element, skipping text and comments.
pub(crate) fn next_element_sibling(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.next_sibling(node);
    while let Some(sibling) = current {
        if tree.is_element(sibling) {
            return Some(sibling);
        }
        current = tree.next_sibling(sibling);
    }
    None
}

/// Element children of a node.
pub(crate) fn element_children(tree: &Tree, node: NodeId) -> Vec<NodeId> {
    tree.children(node).into_iter().filter(|child| tree.is_element(*child)).collect()
}

/// Declarations of an inline `style` attribute with lowercase property names.
pub(crate) fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|rule| {
            let (key, value) = rule.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
}

/// Replaces the children of `node` with the parsed `html`.
pub(crate) fn set_inner_html(tree: &mut Tree, node: NodeId, html: &str) {
    for child in tree.children(node) {
        tree.remove(child);
    }
    tree.append_html(node, html);
}

/// Whether a node holds nothing but formatting whitespace.
///
/// Elements with attributes are never empty. Non-breaking spaces count as
/// whitespace here, other Unicode spaces do not.
pub(crate) fn is_empty(tree: &Tree, node: NodeId) -> bool {
    if tree.is_text(node) {
        return tree
            .text(node)
            .unwrap_or_default()
            .chars()
            .all(|c| matches!(c, ' ' | '\u{0c}' | '\n' | '\r' | '\t' | '\u{0b}' | '\u{a0}'));
    }
    match tree.element(node) {
        Some(element) if !element.attrs.is_empty() => false,
        Some(_) => tree.children(node).into_iter().all(|child| is_empty(tree, child)),
        None => true,
    }
}
