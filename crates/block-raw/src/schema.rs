//! The content schema of everything the registered blocks can take in.

use block_model::schema::merge_schemas;
use block_model::transform::RawTransform;
use block_model::{BlockRegistry, ContentSchema, Transform, TransformDirection, get_block_transforms, phrasing_content_schema};

/// Merges the schemas of every raw transform in the registry.
///
/// Elements of a transform with a predicate only pass when the predicate
/// accepts them. Types supporting `anchor` keep `id` on their elements.
pub fn block_content_schema(registry: &BlockRegistry) -> ContentSchema {
    get_block_transforms(registry, TransformDirection::From, None)
        .into_iter()
        .filter_map(|named| match named.transform {
            Transform::Raw(raw) => Some(transform_schema(registry, named.block_name, raw)),
            _ => None,
        })
        .fold(ContentSchema::new(), merge_schemas)
}

fn transform_schema(registry: &BlockRegistry, block_name: &str, raw: &RawTransform) -> ContentSchema {
    let has_anchor = registry
        .get(block_name)
        .is_some_and(|block_type| block_type.supports("anchor", false));
    if !has_anchor && raw.is_match.is_none() {
        return raw.schema.clone();
    }
    raw.schema
        .iter()
        .map(|(tag, node)| {
            let mut node = node.clone();
            if has_anchor && !node.attributes.iter().any(|a| a == "id") {
                node.attributes.push("id".to_string());
            }
            node.is_match = raw.is_match.clone();
            (tag.clone(), node)
        })
        .collect()
}

/// Block content plus top-level phrasing content, which is wrapped in
/// paragraphs after cleaning.
pub fn paste_schema(block_schema: &ContentSchema) -> ContentSchema {
    merge_schemas(block_schema.clone(), phrasing_content_schema(true))
}
