//! Media hoisting

use block_html::{NodeId, Tree};
use block_model::ContentSchema;
use block_model::schema::is_text_content;

use crate::filter::{FilterContext, NodeFilter};

const ALIGN_CLASSES: &[&str] = &["alignleft", "alignright", "aligncenter"];

/// Elements a `figure` accepts according to the block content schema.
fn figure_children(schema: &ContentSchema) -> ContentSchema {
    schema
        .get("figure")
        .and_then(|figure| figure.children.as_ref())
        .and_then(|children| children.resolve())
        .unwrap_or_default()
}

fn closest_paragraph_or_div(tree: &Tree, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|id| tree.is_tag(*id, "p") || tree.is_tag(*id, "div"))
}

fn wrap_in_figure(tree: &mut Tree, node: NodeId, before: NodeId) {
    let figure = tree.create_element("figure");
    tree.insert_before(before, figure);
    tree.append(figure, node);
}

/// Moves media out of paragraphs into a `figure` of its own.
///
/// Media inside a paragraph or div is only moved when it is aligned or the
/// wrapper has no text; media at the top level is wrapped in place. A link
/// around nothing but the media travels with it.
#[derive(Debug, Default)]
pub struct FigureContentReducer;

impl NodeFilter for FigureContentReducer {
    fn name(&self) -> &'static str {
        "figure"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, context: &FilterContext<'_>) {
        let Some(tag) = tree.tag_name(node) else {
            return;
        };
        let children = figure_children(context.schema);
        if tag == "figcaption" || is_text_content(tag) || !children.contains_key(tag) {
            return;
        }

        let link_accepts = children
            .get("a")
            .and_then(|link| link.children.as_ref())
            .and_then(|c| c.resolve())
            .is_some_and(|link_children| link_children.contains_key(tag));
        let mut target = node;
        if let Some(parent) = tree.parent(node) {
            if link_accepts && tree.is_tag(parent, "a") && tree.children(parent).len() == 1 {
                target = parent;
            }
        }

        match closest_paragraph_or_div(tree, target) {
            Some(wrapper) => {
                let aligned = ALIGN_CLASSES.iter().any(|class| tree.has_class(node, class));
                if aligned || tree.text_content(wrapper).trim().is_empty() {
                    wrap_in_figure(tree, target, wrapper);
                }
            }
            None => {
                if tree.parent(target) == Some(tree.root()) {
                    wrap_in_figure(tree, target, target);
                }
            }
        }
    }
}
