//! Cleaned markup to blocks.

use block_html::{NodeId, Tree};
use block_model::registry::CLASS_NAME;
use block_model::source::get_block_attributes;
use block_model::{
    Attributes, Block, BlockRegistry, NamedTransform, RawTransformContext, Transform, TransformDirection, create_block,
    find_transform, get_block_transforms,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::filter::element_children;

/// Attributes of `name` sourced from an element's markup.
fn sourced(registry: &BlockRegistry, name: &str, html: &str) -> Attributes {
    registry
        .get(name)
        .map(|block_type| get_block_attributes(&block_type.attributes, html, &Attributes::new()))
        .unwrap_or_default()
}

/// Turns each top-level element of `html` into a block.
///
/// The raw transform with the lowest priority that matches an element
/// claims it. Elements nobody claims become blocks of the registry's raw
/// fallback type, or of its unknown-type handler, holding the element's
/// markup as is. `convert` is handed to custom transforms for nested
/// content.
pub fn html_to_blocks(registry: &BlockRegistry, html: &str, convert: &dyn Fn(&str) -> Vec<Block>) -> Vec<Block> {
    let tree = Tree::parse_fragment(html);
    let transforms = get_block_transforms(registry, TransformDirection::From, None);
    element_children(&tree, tree.root())
        .into_iter()
        .filter_map(|node| element_to_block(registry, &tree, node, &transforms, convert))
        .collect()
}

fn element_to_block(
    registry: &BlockRegistry,
    tree: &Tree,
    node: NodeId,
    transforms: &[NamedTransform<'_>],
    convert: &dyn Fn(&str) -> Vec<Block>,
) -> Option<Block> {
    let outer_html = tree.outer_html(node);
    let claimed = find_transform(transforms, |named| {
        matches!(named.transform, Transform::Raw(raw) if raw.matches(tree, node))
    });

    if let Some(named) = claimed {
        if let Transform::Raw(raw) = named.transform {
            match &raw.transform {
                Some(custom) => {
                    let context = RawTransformContext {
                        registry,
                        tree,
                        node,
                        convert,
                    };
                    if let Some(block) = custom(&context) {
                        return Some(with_element_class(registry, block, tree, node));
                    }
                    debug!(block = named.block_name, "Raw transform declined element");
                }
                None => {
                    let attributes = sourced(registry, named.block_name, &outer_html);
                    return Some(create_block(registry, named.block_name, attributes, Vec::new()));
                }
            }
        }
    }

    fallback_block(registry, &outer_html)
}

/// Carries the element's `class` over to a custom-built block.
fn with_element_class(registry: &BlockRegistry, block: Block, tree: &Tree, node: NodeId) -> Block {
    let accepts_class = registry
        .get(block.name())
        .is_some_and(|block_type| block_type.attributes.contains_key(CLASS_NAME));
    match tree.attr(node, "class").filter(|class| accepts_class && !class.trim().is_empty()) {
        Some(class) => {
            let mut attributes = Attributes::new();
            attributes.insert(CLASS_NAME.to_string(), Value::String(class.to_string()));
            block.merge_attributes(attributes)
        }
        None => block,
    }
}

fn fallback_block(registry: &BlockRegistry, outer_html: &str) -> Option<Block> {
    if let Some(name) = registry.raw_fallback_type().filter(|name| registry.contains(name)) {
        return Some(create_block(registry, name, sourced(registry, name, outer_html), Vec::new()));
    }
    let Some(name) = registry.unknown_type_handler() else {
        warn!("Dropping element no block type accepts");
        return None;
    };
    let mut attributes = sourced(registry, name, outer_html);
    for key in ["originalContent", "originalUndelimitedContent"] {
        attributes.insert(key.to_string(), Value::String(outer_html.to_string()));
    }
    Some(create_block(registry, name, attributes, Vec::new()))
}
