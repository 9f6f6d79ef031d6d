//! Parsing documents into validated blocks.
//!
//! Each segment from the grammar goes through the same steps: normalize
//! its name and inner HTML, rename legacy types, fall back to the
//! freeform or unknown-type handler when needed, source attributes, build
//! inner blocks, validate against the type's save output, and finally try
//! deprecated shapes for content that no longer validates.

use crate::attribute::{Attributes, AttributeDefinition};
use crate::block::{Block, ValidationIssue};
use crate::factory::create_block;
use crate::legacy::convert_legacy_block;
use crate::registry::{BlockRegistry, BlockType, CLASS_NAME};
use crate::serializer::get_save_content;
use crate::source::{SourceDocument, get_block_attribute, get_block_attributes};
use crate::validation::validate_block;
use block_grammar::{BlockNode, Segment, serialize_raw_block};
use block_html::{Tree, autop};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Options for [`parse_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Leave freeform content as written instead of adding paragraphs.
    pub skip_autop: bool,
}

/// Parses a document with default options.
///
/// # Example
/// ```
/// use block_model::{BlockRegistry, parse};
///
/// let registry = BlockRegistry::with_builtins();
/// let blocks = parse(&registry, "<!-- wp:paragraph --><p>Hi</p><!-- /wp:paragraph -->");
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].name(), "core/paragraph");
/// assert!(blocks[0].is_valid());
/// ```
pub fn parse(registry: &BlockRegistry, document: &str) -> Vec<Block> {
    parse_with_options(registry, document, &ParseOptions::default())
}

/// Parses a document into blocks. Never fails: unreadable content ends up
/// in fallback blocks or is dropped when it is empty.
pub fn parse_with_options(registry: &BlockRegistry, document: &str, options: &ParseOptions) -> Vec<Block> {
    block_grammar::parse(document)
        .iter()
        .filter_map(|segment| parse_segment(registry, segment, options))
        .collect()
}

/// Turns one grammar segment into a block.
pub fn parse_segment(registry: &BlockRegistry, segment: &Segment, options: &ParseOptions) -> Option<Block> {
    match segment {
        Segment::Freeform { markup } => parse_freeform(registry, markup, options),
        Segment::Block(node) => parse_raw_block(registry, node, options),
    }
}

fn parse_freeform(registry: &BlockRegistry, markup: &str, options: &ParseOptions) -> Option<Block> {
    let Some(name) = registry.freeform_handler().or(registry.unknown_type_handler()) else {
        debug!("Dropping freeform content: no freeform handler registered");
        return None;
    };
    let mut inner_html = markup.trim().to_string();
    if Some(name) == registry.freeform_handler() && !options.skip_autop {
        inner_html = autop(&inner_html, true).trim().to_string();
    }
    if inner_html.is_empty() {
        return None;
    }
    let block_type = registry.get(name)?;

    let mut header = Attributes::new();
    if Some(name) == registry.unknown_type_handler() {
        header.insert("originalContent".into(), Value::String(inner_html.clone()));
        header.insert("originalUndelimitedContent".into(), Value::String(inner_html.clone()));
    }
    let attributes = get_block_attributes(&block_type.attributes, &inner_html, &header);
    Some(create_block(registry, name, attributes, Vec::new()).with_original_content(inner_html))
}

/// Turns a delimited block from the grammar into a block.
pub fn parse_raw_block(registry: &BlockRegistry, node: &BlockNode, options: &ParseOptions) -> Option<Block> {
    let header = node.attrs.clone().unwrap_or_default();
    let (name, header) = convert_legacy_block(&node.name, header);
    let mut inner_html = node.inner_html.trim().to_string();

    let resolved = registry
        .get(&name)
        .filter(|block_type| !(block_type.explicit_namespace && node.implicit_namespace));
    if resolved.is_none() && registry.contains(&name) {
        debug!(block = %name, "Type requires an explicit namespace");
    }

    let unregistered = resolved.is_none();
    let (block_type, header) = match resolved {
        Some(block_type) => (block_type, header),
        None => {
            let Some(handler) = registry.unknown_type_handler().or(registry.freeform_handler()) else {
                debug!(block = %name, "Dropping block of unregistered type");
                return None;
            };
            let block_type = registry.get(handler)?;
            let original = serialize_raw_block(node, true);
            let mut missing = Attributes::new();
            missing.insert("originalName".into(), Value::String(name.clone()));
            missing.insert("originalContent".into(), Value::String(original.clone()));
            missing.insert(
                "originalUndelimitedContent".into(),
                Value::String(serialize_raw_block(node, false)),
            );
            inner_html = original;
            warn!(block = %name, "Block type is not registered; preserving content");
            (block_type, missing)
        }
    };

    let is_fallback = registry.is_fallback_type(&block_type.name);
    if is_fallback && inner_html.is_empty() {
        return None;
    }
    let is_freeform = registry.freeform_handler() == Some(block_type.name.as_str());
    // Preserved delimiters must reach the fallback untouched.
    if is_freeform && !unregistered && !options.skip_autop {
        inner_html = autop(&inner_html, true).trim().to_string();
    }

    // Freeform content already carries the nested blocks' markup.
    let inner_blocks: Vec<Block> = if is_freeform && unregistered {
        Vec::new()
    } else {
        node.inner_blocks
            .iter()
            .filter_map(|inner| parse_raw_block(registry, inner, options))
            .collect()
    };

    let attributes = get_block_attributes(&block_type.attributes, &inner_html, &header);
    let block = create_block(registry, &block_type.name, attributes, inner_blocks)
        .with_original_content(inner_html.clone());

    if is_fallback {
        return Some(block);
    }

    let block = validate_with_fixes(registry, block_type, block, &inner_html);
    let block = apply_deprecations(registry, block_type, block, &header);
    if !block.is_valid() {
        warn!(block = %block_type.name, "Block contains unexpected or invalid content");
    }
    Some(block)
}

/// Validates a freshly parsed block. When validation fails, retries once
/// with classes found on the saved root element moved into `className`.
fn validate_with_fixes(registry: &BlockRegistry, block_type: &BlockType, block: Block, original: &str) -> Block {
    let (is_valid, issues) = validate_block(registry, block_type, block.attributes(), original);
    if is_valid {
        return block.with_validation(true, issues);
    }

    if let Some(attributes) = fix_custom_class_name(block_type, block.attributes(), original) {
        let (fixed_valid, fixed_issues) = validate_block(registry, block_type, &attributes, original);
        if fixed_valid {
            debug!(block = %block_type.name, "Recovered custom class names");
            return block.with_attributes(attributes).with_validation(true, fixed_issues);
        }
    }
    block.with_validation(false, issues)
}

/// Attributes with the root element's classes that `save` does not produce
/// itself recorded as `className`. `None` when nothing would change.
pub fn fix_custom_class_name(block_type: &BlockType, attributes: &Attributes, original: &str) -> Option<Attributes> {
    if !block_type.attributes.contains_key(CLASS_NAME) {
        return None;
    }
    let parsed = root_classes(original);
    if parsed.is_empty() {
        return None;
    }

    let mut without = attributes.clone();
    without.remove(CLASS_NAME);
    let generated = get_save_content(block_type, &without, "").ok()?;
    let generated = root_classes(&generated);

    let custom: Vec<String> = parsed.into_iter().filter(|c| !generated.contains(c)).collect();
    let mut fixed = without;
    if !custom.is_empty() {
        fixed.insert(CLASS_NAME.to_string(), Value::String(custom.join(" ")));
    }
    (fixed != *attributes).then_some(fixed)
}

fn root_classes(html: &str) -> Vec<String> {
    let tree = Tree::parse_fragment(html);
    let root = tree.root();
    let Some(first) = tree.children(root).into_iter().find(|c| tree.is_element(*c)) else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    tree.element(first)
        .map(|element| {
            element
                .classes()
                .filter(|c| seen.insert(c.to_string()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Tries deprecated shapes of the type in order.
///
/// An invalid block is migrated by the first deprecation whose save output
/// matches the markup; a valid block only by deprecations that declare it
/// eligible.
fn apply_deprecations(registry: &BlockRegistry, block_type: &BlockType, mut block: Block, header: &Attributes) -> Block {
    let original = block.original_content().unwrap_or_default().to_string();

    for (index, deprecation) in block_type.deprecated.iter().enumerate() {
        let eligible = deprecation
            .is_eligible
            .as_ref()
            .is_some_and(|is_eligible| is_eligible(header, block.inner_blocks()));
        if block.is_valid() && !eligible {
            continue;
        }

        let version = block_type.deprecated_version(deprecation);
        let mut attributes = get_block_attributes(&version.attributes, &original, header);
        let (mut is_valid, _) = validate_block(registry, &version, &attributes, &original);
        if !is_valid {
            if let Some(fixed) = fix_custom_class_name(&version, &attributes, &original) {
                is_valid = validate_block(registry, &version, &fixed, &original).0;
                attributes = fixed;
            }
        }
        if !is_valid {
            continue;
        }

        let mut inner_blocks = block.inner_blocks().to_vec();
        if let Some(migrate) = &deprecation.migrate {
            (attributes, inner_blocks) = migrate(attributes, inner_blocks);
        }
        info!(block = %block_type.name, deprecation = index, "Migrated block from a deprecated shape");
        block = block
            .with_attributes(attributes)
            .with_inner_blocks(inner_blocks)
            .with_validation(true, Vec::<ValidationIssue>::new());
    }
    block
}

/// Re-reads one attribute of a block from markup, for callers that need a
/// single value without a full parse.
pub fn source_attribute(definition: &AttributeDefinition, key: &str, html: &str) -> Option<Value> {
    get_block_attribute(key, definition, &SourceDocument::new(html), &Attributes::new())
}
