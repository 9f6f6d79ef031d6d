//! Word list paragraphs

use block_html::{NodeId, Tree};
use regex::Regex;
use std::sync::LazyLock;

use crate::filter::{FilterContext, NodeFilter, deep_filter, prev_element_sibling, style_declarations};

static LEVEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)mso-list\s*:[^;]+level([0-9]+)").expect("Invalid list level regex"));

fn has_list_style(tree: &Tree, node: NodeId) -> bool {
    tree.attr(node, "style").is_some_and(|style| style.contains("mso-list"))
}

fn is_list(tree: &Tree, node: NodeId) -> bool {
    tree.is_tag(node, "ol") || tree.is_tag(node, "ul")
}

/// Removes the bullet and numbering runs Word marks with `mso-list: Ignore`.
#[derive(Debug, Default)]
pub struct MsListIgnoreFilter;

impl NodeFilter for MsListIgnoreFilter {
    fn name(&self) -> &'static str {
        "ms-list-ignore"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if !tree.is_element(node) || !has_list_style(tree, node) {
            return;
        }
        let ignored = tree.attr(node, "style").is_some_and(|style| {
            style_declarations(style)
                .iter()
                .any(|(key, value)| key == "mso-list" && value.eq_ignore_ascii_case("ignore"))
        });
        if ignored {
            tree.remove(node);
        }
    }
}

/// Turns Word's list paragraphs into nested `ul`/`ol` lists.
///
/// Word exports every list item as a `p` with an `mso-list` style naming
/// its nesting level. Consecutive items are gathered into the list that
/// precedes them.
#[derive(Debug, Default)]
pub struct MsListFilter;

impl NodeFilter for MsListFilter {
    fn name(&self) -> &'static str {
        "ms-list"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, context: &FilterContext<'_>) {
        if !tree.is_tag(node, "p") || !has_list_style(tree, node) {
            return;
        }

        let list = match prev_element_sibling(tree, node).filter(|prev| is_list(tree, *prev)) {
            Some(list) => list,
            None => {
                let marker = tree.text_content(node).trim().chars().next();
                let list = match marker.filter(|c| matches!(c, '1' | 'i' | 'I' | 'a' | 'A')) {
                    Some(kind) => {
                        tree.create_element_with_attrs("ol", vec![("type".to_string(), kind.to_string())])
                    }
                    None => tree.create_element("ul"),
                };
                tree.insert_before(node, list);
                list
            }
        };
        let list_tag = tree.tag_name(list).unwrap_or("ul").to_string();

        let item = tree.create_element("li");
        tree.move_children(node, item);

        let level = tree
            .attr(node, "style")
            .and_then(|style| LEVEL_PATTERN.captures(style))
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .map_or(0, |level| level.saturating_sub(1));

        let mut receiver = list;
        for _ in 0..level {
            receiver = tree.last_child(receiver).unwrap_or(receiver);
            if is_list(tree, receiver) {
                receiver = tree.last_child(receiver).unwrap_or(receiver);
            }
        }
        if !is_list(tree, receiver) {
            let nested = tree.create_element(&list_tag);
            tree.append(receiver, nested);
            receiver = nested;
        }
        tree.append(receiver, item);
        // The item must be in the tree for the walk to reach its markers.
        deep_filter(tree, item, &[&MsListIgnoreFilter], context);
        tree.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ignored_marker_is_removed() {
        assert_eq!(
            run(&MsListIgnoreFilter, r#"<p><span style="mso-list:Ignore">1.</span>One</p>"#),
            "<p>One</p>"
        );
    }

    #[test]
    fn test_builds_nested_bullet_list() {
        let html = concat!(
            r#"<p style="mso-list:l0 level1 lfo1"><span style="mso-list:Ignore">·</span>One</p>"#,
            r#"<p style="mso-list:l0 level2 lfo1"><span style="mso-list:Ignore">o</span>Two</p>"#,
            r#"<p style="mso-list:l0 level1 lfo1"><span style="mso-list:Ignore">·</span>Three</p>"#,
        );
        assert_eq!(
            run(&MsListFilter, html),
            "<ul><li>One<ul><li>Two</li></ul></li><li>Three</li></ul>"
        );
    }

    #[test]
    fn test_numbered_list_keeps_type() {
        let html = r#"<p style="mso-list:l0 level1 lfo1"><span style="mso-list:Ignore">1.</span>First</p>"#;
        assert_eq!(run(&MsListFilter, html), r#"<ol type="1"><li>First</li></ol>"#);
    }

    #[test]
    fn test_plain_paragraph_untouched() {
        assert_eq!(run(&MsListFilter, "<p>Plain</p>"), "<p>Plain</p>");
    }
}
