//! Blocks that hold content no other type claims: custom HTML, classic
//! (freeform) content, unregistered types and shortcodes.

use super::{FREEFORM, HTML, MISSING, SHORTCODE, attrs_from, str_attr};
use crate::attribute::{AttributeDefinition, AttributeSource};
use crate::registry::{BlockType, CUSTOM_CLASS_NAME};
use crate::schema::{ContentSchema, SchemaNode};
use crate::transform::Transform;
use serde_json::Value;

/// Runs after every specific shortcode transform.
const CATCH_ALL_PRIORITY: i32 = 20;

fn raw_content() -> AttributeDefinition {
    AttributeDefinition::string().with_source(AttributeSource::Raw)
}

pub(super) fn html() -> BlockType {
    let embed_schema = ContentSchema::from([(
        "figure".to_string(),
        SchemaNode::new().with_require(&["iframe"]).with_child_schema(ContentSchema::from([
            (
                "iframe".to_string(),
                SchemaNode::new().with_attributes(&["src", "allowfullscreen", "height", "width"]),
            ),
            ("figcaption".to_string(), SchemaNode::phrasing()),
        ])),
    )]);

    BlockType::new(HTML, "Custom HTML")
        .with_category("widgets")
        .with_description("Add custom HTML code and preview it as you edit.")
        .with_keywords(&["embed"])
        .with_attribute("content", raw_content())
        .with_support(CUSTOM_CLASS_NAME, false)
        .with_support("className", false)
        .with_support("html", false)
        .with_save(|attrs| Ok(str_attr(attrs, "content").to_string()))
        .with_transform_from(Transform::raw_matching(
            |tree, node| tree.is_tag(node, "figure") && tree.query(node, "iframe").is_some(),
            embed_schema,
        ))
}

pub(super) fn freeform() -> BlockType {
    BlockType::new(FREEFORM, "Classic")
        .with_category("text")
        .with_description("Use the classic editor.")
        .with_attribute("content", raw_content())
        .with_support(CUSTOM_CLASS_NAME, false)
        .with_support("className", false)
        .with_support("html", false)
        .with_save(|attrs| Ok(str_attr(attrs, "content").to_string()))
}

pub(super) fn missing() -> BlockType {
    BlockType::new(MISSING, "Unsupported")
        .with_category("text")
        .with_description("Your site doesn't include support for this block.")
        .with_attribute("originalName", AttributeDefinition::string())
        .with_attribute("originalUndelimitedContent", AttributeDefinition::string())
        .with_attribute("originalContent", raw_content())
        .with_support(CUSTOM_CLASS_NAME, false)
        .with_support("className", false)
        .with_support("inserter", false)
        .with_save(|attrs| Ok(str_attr(attrs, "originalContent").to_string()))
}

pub(super) fn shortcode() -> BlockType {
    BlockType::new(SHORTCODE, "Shortcode")
        .with_category("widgets")
        .with_description("Insert additional custom elements with a WordPress shortcode.")
        .with_attribute("text", raw_content())
        .with_support(CUSTOM_CLASS_NAME, false)
        .with_support("className", false)
        .with_save(|attrs| Ok(str_attr(attrs, "text").to_string()))
        .with_transform_from(
            Transform::shortcode(&["*"], |shortcode| {
                attrs_from([("text", Value::String(shortcode.to_string()))])
            })
            .with_priority(CATCH_ALL_PRIORITY),
        )
}
