//! Serializing blocks back to comment-delimited markup.

use crate::attribute::Attributes;
use crate::block::Block;
use crate::error::SaveError;
use crate::registry::{BlockRegistry, BlockType, CLASS_NAME, CUSTOM_CLASS_NAME, INNER_BLOCKS};
use crate::source::{SourceDocument, get_block_attribute};
use block_grammar::comment_delimited_content;
use block_grammar::parser::DEFAULT_NAMESPACE;
use regex::{Captures, Regex};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;
use tracing::warn;

static ROOT_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*<[a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s>/=]+(?:\s*=\s*(?:\x22[^\x22]*\x22|'[^']*'|[^\s>]+))?)*)(\s*/?>)")
        .expect("Invalid root tag regex")
});
static CLASS_ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\sclass\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("Invalid class regex")
});

/// Options for [`serialize_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Write `core/` block names without their namespace.
    pub strip_core_namespace: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            strip_core_namespace: true,
        }
    }
}

/// Runs a type's save function and returns its markup with `inner_blocks`
/// written where nested blocks belong.
///
/// The `className` attribute is merged into the root element's classes for
/// types that support custom class names. A panicking save function is
/// reported as [`SaveError::Panicked`].
pub fn get_save_content(
    block_type: &BlockType,
    attributes: &Attributes,
    inner_blocks: &str,
) -> Result<String, SaveError> {
    render(block_type, attributes).map(|html| html.replace(INNER_BLOCKS, inner_blocks))
}

/// Header attributes for a block: those that cannot be read back from
/// `saved_html`.
///
/// Comment-only attributes are written unless they equal their default.
/// Sourced attributes are written only when sourcing `saved_html` would
/// yield a different value.
pub fn get_comment_attributes(block_type: &BlockType, attributes: &Attributes, saved_html: &str) -> Attributes {
    let document = SourceDocument::new(saved_html);
    let no_header = Attributes::new();
    block_type
        .attributes
        .iter()
        .filter_map(|(key, definition)| {
            let value = attributes.get(key)?;
            let recoverable = if definition.is_comment_attribute() {
                definition.default.as_ref() == Some(value)
            } else {
                get_block_attribute(key, definition, &document, &no_header).as_ref() == Some(value)
            };
            (!recoverable).then(|| (key.clone(), value.clone()))
        })
        .collect()
}

/// Serializes blocks with default options.
///
/// # Example
/// ```
/// use block_model::{BlockRegistry, create_block, serialize};
/// use serde_json::json;
///
/// let registry = BlockRegistry::with_builtins();
/// let attrs = json!({"content": "Hello"}).as_object().unwrap().clone();
/// let block = create_block(&registry, "core/paragraph", attrs, Vec::new());
/// assert_eq!(
///     serialize(&registry, &[block]),
///     "<!-- wp:paragraph -->\n<p>Hello</p>\n<!-- /wp:paragraph -->"
/// );
/// ```
pub fn serialize(registry: &BlockRegistry, blocks: &[Block]) -> String {
    serialize_with_options(registry, blocks, &SerializeOptions::default())
}

/// Serializes top-level blocks, separated by blank lines.
pub fn serialize_with_options(registry: &BlockRegistry, blocks: &[Block], options: &SerializeOptions) -> String {
    serialize_list(registry, blocks, options, false)
}

/// Serializes a single top-level block. `None` when the block cannot be
/// written at all.
pub fn serialize_block(registry: &BlockRegistry, block: &Block, options: &SerializeOptions) -> Option<String> {
    serialize_one(registry, block, options, false)
}

/// The markup between a block's delimiters, inner blocks included.
pub fn get_block_content(registry: &BlockRegistry, block: &Block, options: &SerializeOptions) -> Option<String> {
    let Some(block_type) = registry.get(block.name()) else {
        warn!(block = block.name(), "Skipping block of unregistered type");
        return None;
    };
    content_of(registry, block_type, block, options).map(|(content, _)| content)
}

fn serialize_list(registry: &BlockRegistry, blocks: &[Block], options: &SerializeOptions, is_inner: bool) -> String {
    blocks
        .iter()
        .filter_map(|block| serialize_one(registry, block, options, is_inner))
        .filter(|markup| !markup.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn serialize_one(registry: &BlockRegistry, block: &Block, options: &SerializeOptions, is_inner: bool) -> Option<String> {
    let name = block.name();
    let Some(block_type) = registry.get(name) else {
        warn!(block = name, "Skipping block of unregistered type");
        return None;
    };
    let (content, sourcing_html) = content_of(registry, block_type, block, options)?;

    let is_unknown = registry.unknown_type_handler() == Some(name);
    let is_freeform = registry.freeform_handler() == Some(name);
    if is_unknown || (is_freeform && !is_inner) {
        return Some(content);
    }

    let header = get_comment_attributes(block_type, block.attributes(), &sourcing_html);
    let written_name = match name.strip_prefix(DEFAULT_NAMESPACE) {
        Some(short) if options.strip_core_namespace && !block_type.explicit_namespace => short,
        _ => name,
    };
    Some(comment_delimited_content(written_name, &header, &content))
}

/// Returns the block's content and the markup its attributes are sourced
/// from (the content without inner blocks).
fn content_of(
    registry: &BlockRegistry,
    block_type: &BlockType,
    block: &Block,
    options: &SerializeOptions,
) -> Option<(String, String)> {
    if !block.is_valid() && block.inner_blocks().is_empty() {
        if let Some(original) = block.original_content() {
            return Some((original.to_string(), original.to_string()));
        }
    }

    match render(block_type, block.attributes()) {
        Ok(html) => {
            if !block.inner_blocks().is_empty() && !html.contains(INNER_BLOCKS) {
                warn!(
                    block = block.name(),
                    count = block.inner_blocks().len(),
                    "Save output has no inner blocks placeholder; inner blocks are dropped"
                );
            }
            let inner = serialize_list(registry, block.inner_blocks(), options, true);
            Some((html.replace(INNER_BLOCKS, &inner), html.replace(INNER_BLOCKS, "")))
        }
        Err(e) => {
            warn!(block = block.name(), error = %e, "Save function failed");
            block
                .original_content()
                .map(|original| (original.to_string(), original.to_string()))
        }
    }
}

fn render(block_type: &BlockType, attributes: &Attributes) -> Result<String, SaveError> {
    let Some(save) = &block_type.save else {
        return Err(SaveError::failed(format!(
            "block type \"{}\" has no save function",
            block_type.name
        )));
    };

    let html = catch_unwind(AssertUnwindSafe(|| save(attributes))).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        SaveError::Panicked { message }
    })??;

    if !block_type.supports(CUSTOM_CLASS_NAME, true) {
        return Ok(html);
    }
    match attributes.get(CLASS_NAME) {
        Some(Value::String(class_name)) if !class_name.trim().is_empty() => Ok(add_root_classes(&html, class_name)),
        _ => Ok(html),
    }
}

/// Appends classes to the first element of `html`, skipping ones it
/// already has.
pub fn add_root_classes(html: &str, classes: &str) -> String {
    let Some(caps) = ROOT_TAG_REGEX.captures(html) else {
        return html.to_string();
    };
    let whole = caps.get(0).map_or(0, |m| m.end());
    let open = &caps[1];
    let attrs = &caps[2];
    let close = &caps[3];

    let new_attrs = if CLASS_ATTR_REGEX.is_match(attrs) {
        CLASS_ATTR_REGEX
            .replace(attrs, |c: &Captures<'_>| {
                let existing = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
                format!("{}\"{}\"", &c[1], merge_classes(existing, classes))
            })
            .into_owned()
    } else {
        format!("{attrs} class=\"{}\"", merge_classes("", classes))
    };
    format!("{open}{new_attrs}{close}{}", &html[whole..])
}

fn merge_classes(existing: &str, extra: &str) -> String {
    let mut merged: Vec<&str> = existing.split_ascii_whitespace().collect();
    for class in extra.split_ascii_whitespace() {
        if !merged.contains(&class) {
            merged.push(class);
        }
    }
    html_escape::encode_double_quoted_attribute(&merged.join(" ")).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeDefinition, AttributeSource};
    use crate::factory::create_block;
    use crate::library::PARAGRAPH;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn note_type() -> BlockType {
        BlockType::new("acme/note", "Note")
            .with_category("text")
            .with_attribute(
                "content",
                AttributeDefinition::string().with_source(AttributeSource::html("p")),
            )
            .with_attribute("level", AttributeDefinition::number().with_default(1))
            .with_attribute(CLASS_NAME, AttributeDefinition::string())
            .with_save(|attrs| {
                Ok(format!(
                    "<p>{}</p>",
                    attrs.get("content").and_then(Value::as_str).unwrap_or_default()
                ))
            })
    }

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_comment_attributes_skip_recoverable_values() {
        let header = get_comment_attributes(
            &note_type(),
            &attrs(json!({"content": "Hi", "level": 1})),
            "<p>Hi</p>",
        );
        assert!(header.is_empty());
    }

    #[test]
    fn test_comment_attributes_keep_non_default_and_unrecoverable() {
        let header = get_comment_attributes(
            &note_type(),
            &attrs(json!({"content": "Other", "level": 3})),
            "<p>Hi</p>",
        );
        assert_eq!(header, attrs(json!({"content": "Other", "level": 3})));
    }

    #[test]
    fn test_save_content_adds_class_name() {
        let html = get_save_content(&note_type(), &attrs(json!({"content": "x", "className": "lead"})), "").unwrap();
        assert_eq!(html, r#"<p class="lead">x</p>"#);
    }

    #[test]
    fn test_save_content_replaces_inner_blocks() {
        let block_type = BlockType::new("acme/group", "Group")
            .with_category("design")
            .with_save(|_| Ok(format!("<div>{INNER_BLOCKS}</div>")));
        let html = get_save_content(&block_type, &Attributes::new(), "<p>in</p>").unwrap();
        assert_eq!(html, "<div><p>in</p></div>");
    }

    #[test]
    fn test_save_without_placeholder_drops_inner_blocks() {
        let mut registry = BlockRegistry::with_builtins();
        registry.register(
            BlockType::new("acme/flat", "Flat")
                .with_category("design")
                .with_save(|_| Ok("<div>flat</div>".to_string())),
        );
        let paragraph = create_block(&registry, PARAGRAPH, attrs(json!({"content": "Inner"})), Vec::new());
        let block = create_block(&registry, "acme/flat", Attributes::new(), vec![paragraph]);

        let markup = serialize(&registry, &[block]);
        assert!(markup.contains("<div>flat</div>"), "{markup}");
        assert!(!markup.contains("Inner"), "{markup}");
    }

    #[test]
    fn test_panicking_save_is_contained() {
        let block_type = BlockType::new("acme/bad", "Bad")
            .with_category("text")
            .with_save(|_| panic!("boom"));
        let err = get_save_content(&block_type, &Attributes::new(), "").unwrap_err();
        assert_eq!(err, SaveError::Panicked { message: "boom".into() });
    }

    #[test]
    fn test_add_root_classes() {
        assert_eq!(add_root_classes("<p>x</p>", "a"), r#"<p class="a">x</p>"#);
        assert_eq!(
            add_root_classes(r#"<figure class="wp-block-image"><img src="a"/></figure>"#, "big wp-block-image"),
            r#"<figure class="wp-block-image big"><img src="a"/></figure>"#
        );
        assert_eq!(add_root_classes("<hr/>", "x"), r#"<hr class="x"/>"#);
        assert_eq!(add_root_classes("plain text", "x"), "plain text");
    }
}
