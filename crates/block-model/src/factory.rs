//! Creating, cloning and converting blocks.

use crate::attribute::{AttributeSource, Attributes};
use crate::block::Block;
use crate::coerce::coerce;
use crate::registry::{BlockRegistry, BlockType};
use crate::transform::{Transform, TransformDirection};
use serde_json::Value;
use tracing::{debug, warn};

/// A transform together with the block type that declares it.
#[derive(Debug, Clone, Copy)]
pub struct NamedTransform<'a> {
    pub block_name: &'a str,
    pub transform: &'a Transform,
}

/// Creates a block with a fresh identity.
///
/// Attributes are limited to the type's schema: unknown keys are dropped,
/// defaults fill gaps and values are coerced to their declared types. Blocks
/// of unregistered types keep the attributes as given.
pub fn create_block(registry: &BlockRegistry, name: &str, attributes: Attributes, inner_blocks: Vec<Block>) -> Block {
    let attributes = match registry.get(name) {
        Some(block_type) => sanitize_attributes(block_type, attributes),
        None => {
            warn!(block = name, "Creating block of unregistered type");
            attributes
        }
    };
    Block::new(name, attributes, inner_blocks)
}

/// Limits `attributes` to what `block_type` declares.
pub fn sanitize_attributes(block_type: &BlockType, mut attributes: Attributes) -> Attributes {
    block_type
        .attributes
        .iter()
        .filter_map(|(key, definition)| {
            let mut value = attributes.remove(key).or_else(|| definition.default.clone());
            if matches!(definition.source, Some(AttributeSource::Children { .. })) {
                value = Some(match value {
                    Some(Value::String(text)) => Value::Array(vec![Value::String(text)]),
                    Some(Value::Array(items)) => Value::Array(items),
                    _ => Value::Array(Vec::new()),
                });
            }
            value.map(|v| (key.clone(), coerce(v, definition.kind)))
        })
        .collect()
}

/// Copies a block under a new identity, merging `attributes` over its own
/// and optionally replacing its inner blocks. Inner blocks that are kept are
/// cloned too.
pub fn clone_block(block: &Block, attributes: Attributes, inner_blocks: Option<Vec<Block>>) -> Block {
    let mut merged = block.attributes().clone();
    merged.extend(attributes);
    let inner = inner_blocks.unwrap_or_else(|| {
        block
            .inner_blocks()
            .iter()
            .map(|inner| clone_block(inner, Attributes::new(), None))
            .collect()
    });
    let mut clone = Block::new(block.name(), merged, inner).with_validation(block.is_valid(), block.validation_issues().to_vec());
    if let Some(original) = block.original_content() {
        clone = clone.with_original_content(original);
    }
    clone
}

/// Transforms in one direction, for one block type or for all of them in
/// registration order.
pub fn get_block_transforms<'a>(
    registry: &'a BlockRegistry,
    direction: TransformDirection,
    name: Option<&str>,
) -> Vec<NamedTransform<'a>> {
    let types: Vec<&BlockType> = match name {
        Some(name) => registry.get(name).into_iter().collect(),
        None => registry.iter().collect(),
    };
    types
        .into_iter()
        .flat_map(|block_type| {
            block_type
                .transforms
                .get(direction)
                .iter()
                .map(move |transform| NamedTransform {
                    block_name: &block_type.name,
                    transform,
                })
        })
        .collect()
}

/// The matching transform with the lowest priority value; ties go to the
/// earliest.
pub fn find_transform<'a>(
    transforms: &[NamedTransform<'a>],
    mut predicate: impl FnMut(&NamedTransform<'a>) -> bool,
) -> Option<NamedTransform<'a>> {
    transforms
        .iter()
        .enumerate()
        .filter(|(_, candidate)| predicate(candidate))
        .min_by_key(|(index, candidate)| (candidate.transform.priority(), *index))
        .map(|(_, candidate)| *candidate)
}

/// Names of the block types the given blocks can be converted to.
pub fn get_possible_block_transformations<'a>(registry: &'a BlockRegistry, blocks: &[Block]) -> Vec<&'a str> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    let source = first.name();
    let same_type = blocks.iter().all(|b| b.name() == source);
    let is_multi = blocks.len() > 1;

    let mut names: Vec<&str> = Vec::new();
    let mut push = |name: &'a str| {
        if name != source && !names.contains(&name) {
            names.push(name);
        }
    };

    for named in get_block_transforms(registry, TransformDirection::From, None) {
        if let Transform::Block(t) = named.transform {
            let multi_ok = !is_multi || (t.is_multi_block && (same_type || t.blocks.iter().any(|b| b == "*")));
            if t.accepts(source) && multi_ok && t.is_match.as_ref().is_none_or(|m| m(blocks)) {
                push(named.block_name);
            }
        }
    }
    for named in get_block_transforms(registry, TransformDirection::To, Some(source)) {
        if let Transform::Block(t) = named.transform {
            let multi_ok = !is_multi || t.is_multi_block;
            if multi_ok && t.is_match.as_ref().is_none_or(|m| m(blocks)) {
                for target in &t.blocks {
                    if let Some(block_type) = registry.get(target) {
                        push(&block_type.name);
                    }
                }
            }
        }
    }
    names
}

/// Converts blocks to type `name` with a declared block transform.
///
/// `to` transforms of the source type are preferred over `from` transforms
/// of the destination. Returns `None` when no transform applies or the
/// result contains no block of type `name`. The first resulting block of
/// type `name` keeps the identity of the first source block.
pub fn switch_to_block_type(registry: &BlockRegistry, blocks: &[Block], name: &str) -> Option<Vec<Block>> {
    let first = blocks.first()?;
    let source = first.name();
    let is_multi = blocks.len() > 1;

    let applies = |named: &NamedTransform<'_>, other: &str| match named.transform {
        Transform::Block(t) => {
            t.accepts(other) && (!is_multi || t.is_multi_block) && t.is_match.as_ref().is_none_or(|m| m(blocks))
        }
        _ => false,
    };

    let to = get_block_transforms(registry, TransformDirection::To, Some(source));
    let from = get_block_transforms(registry, TransformDirection::From, Some(name));
    let chosen = find_transform(&to, |t| applies(t, name)).or_else(|| find_transform(&from, |t| applies(t, source)))?;

    let Transform::Block(transform) = chosen.transform else {
        return None;
    };
    let input = if transform.is_multi_block {
        blocks
    } else {
        std::slice::from_ref(first)
    };
    let results = (transform.transform)(registry, input);

    if results.is_empty() || results.iter().any(|b| !registry.contains(b.name())) {
        debug!(from = source, to = name, "Transform produced unregistered or no blocks");
        return None;
    }
    let switched = results.iter().position(|b| b.name() == name)?;

    Some(
        results
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                if index == switched {
                    block.with_id(first.id())
                } else {
                    block
                }
            })
            .collect(),
    )
}

/// Creates a block from typed text when a pattern transform matches its
/// start, such as `## ` for a heading.
pub fn find_pattern_transform(registry: &BlockRegistry, text: &str) -> Option<Block> {
    let transforms = get_block_transforms(registry, TransformDirection::From, None);
    let chosen = find_transform(&transforms, |named| match named.transform {
        Transform::Pattern(t) => t.regex.find(text).is_some_and(|m| m.start() == 0),
        _ => false,
    })?;
    let Transform::Pattern(pattern) = chosen.transform else {
        return None;
    };
    let captures = pattern.regex.captures(text)?;
    let rest = &text[captures.get(0).map_or(0, |m| m.end())..];
    let attributes = (pattern.transform)(&captures, rest);
    Some(create_block(registry, chosen.block_name, attributes, Vec::new()))
}
