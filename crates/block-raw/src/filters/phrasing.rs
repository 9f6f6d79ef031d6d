//! Inline formatting cleanup

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter, style_declarations};

/// Turns presentational inline markup into semantic elements.
///
/// Spans styled bold, italic, struck through or raised are wrapped in the
/// matching element; `b` and `i` become `strong` and `em`. Links opening a
/// new window get a safe `rel`, other links lose `target` and `rel`, and
/// link ids are only kept when something in the fragment points at them.
#[derive(Debug, Default)]
pub struct PhrasingContentReducer;

impl NodeFilter for PhrasingContentReducer {
    fn name(&self) -> &'static str {
        "phrasing"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        match tree.tag_name(node) {
            Some("span") => reduce_span(tree, node),
            Some("b") => {
                tree.rename(node, "strong");
            }
            Some("i") => {
                tree.rename(node, "em");
            }
            Some("a") => reduce_link(tree, node),
            _ => {}
        }
    }
}

fn reduce_span(tree: &mut Tree, node: NodeId) {
    let Some(style) = tree.attr(node, "style") else {
        return;
    };
    let declarations = style_declarations(style);
    let has = |property: &str, accept: fn(&str) -> bool| {
        declarations
            .iter()
            .any(|(key, value)| key == property && accept(&value.to_ascii_lowercase()))
    };

    let mut wrappers = Vec::new();
    if has("font-weight", |v| v == "bold" || v == "700") {
        wrappers.push("strong");
    }
    if has("font-style", |v| v == "italic") {
        wrappers.push("em");
    }
    if has("text-decoration-line", |v| v == "line-through") || has("text-decoration", |v| v.contains("line-through")) {
        wrappers.push("s");
    }
    if has("vertical-align", |v| v == "super") {
        wrappers.push("sup");
    } else if has("vertical-align", |v| v == "sub") {
        wrappers.push("sub");
    }
    for tag in wrappers {
        let wrapper = tree.create_element(tag);
        tree.wrap(node, wrapper);
    }
}

fn reduce_link(tree: &mut Tree, node: NodeId) {
    let opens_window = tree
        .attr(node, "target")
        .is_some_and(|target| target.eq_ignore_ascii_case("_blank"));
    if opens_window {
        tree.set_attr(node, "rel", "noreferrer noopener");
    } else {
        tree.remove_attr(node, "target");
        tree.remove_attr(node, "rel");
    }

    if !tree.has_attr(node, "id") {
        if let Some(name) = tree.attr(node, "name").map(str::to_string) {
            tree.set_attr(node, "id", name);
        }
    }

    if let Some(id) = tree.attr(node, "id").map(str::to_string) {
        let href = format!("#{id}");
        let root = tree.root();
        let referenced = tree
            .descendants(root)
            .into_iter()
            .any(|other| tree.attr(other, "href") == Some(href.as_str()));
        if !referenced {
            tree.remove_attr(node, "id");
        }
    }
}
