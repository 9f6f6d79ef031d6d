//! List structure repair

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter, element_children, prev_element_sibling};

fn is_list(tree: &Tree, node: NodeId) -> bool {
    tree.is_tag(node, "ol") || tree.is_tag(node, "ul")
}

/// Text directly inside `node`, ignoring its elements.
fn shallow_text(tree: &Tree, node: NodeId) -> String {
    tree.children(node)
        .into_iter()
        .filter_map(|child| tree.text(child).map(str::to_string))
        .collect()
}

/// Merges and flattens lists.
///
/// - A single-item list directly after a list of the same kind joins it.
/// - A nested list alone in an otherwise empty item moves into the previous
///   item, or out in front of its parent list when there is none.
/// - A list directly inside another list moves into the previous item, or
///   is unwrapped.
#[derive(Debug, Default)]
pub struct ListReducer;

impl NodeFilter for ListReducer {
    fn name(&self) -> &'static str {
        "list"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if !is_list(tree, node) {
            return;
        }

        if let Some(prev) = prev_element_sibling(tree, node) {
            if tree.tag_name(prev) == tree.tag_name(node) && element_children(tree, node).len() == 1 {
                tree.move_children(node, prev);
                tree.remove(node);
                return;
            }
        }

        let Some(parent) = tree.parent(node) else {
            return;
        };

        if tree.is_tag(parent, "li")
            && element_children(tree, parent).len() == 1
            && shallow_text(tree, parent).trim().is_empty()
        {
            let parent_list = tree.parent(parent);
            match prev_element_sibling(tree, parent) {
                Some(prev_item) => {
                    tree.append(prev_item, node);
                    tree.remove(parent);
                }
                None => {
                    if let Some(parent_list) = parent_list {
                        tree.insert_before(parent_list, node);
                    }
                }
            }
        }

        if is_list(tree, parent) {
            match prev_element_sibling(tree, node) {
                Some(prev_item) => tree.append(prev_item, node),
                None => tree.unwrap(node),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merges_adjacent_single_item_lists() {
        assert_eq!(
            run(&ListReducer, "<ul><li>One</li></ul><ul><li>Two</li></ul>"),
            "<ul><li>One</li><li>Two</li></ul>"
        );
    }

    #[test]
    fn test_different_kinds_stay_apart() {
        let html = "<ul><li>One</li></ul><ol><li>Two</li></ol>";
        assert_eq!(run(&ListReducer, html), html);
    }

    #[test]
    fn test_nested_list_in_empty_item_joins_previous_item() {
        assert_eq!(
            run(&ListReducer, "<ul><li>One</li><li><ul><li>Sub</li></ul></li></ul>"),
            "<ul><li>One<ul><li>Sub</li></ul></li></ul>"
        );
    }

    #[test]
    fn test_list_directly_in_list_moves_into_item() {
        assert_eq!(
            run(&ListReducer, "<ul><li>One</li><ul><li>Sub</li></ul></ul>"),
            "<ul><li>One<ul><li>Sub</li></ul></li></ul>"
        );
    }
}
