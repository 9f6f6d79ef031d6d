//! The table block.

use super::{TABLE, bool_attr, class_list, html_attr, str_attr};
use crate::attribute::{AttributeDefinition, AttributeSchema, AttributeSource, Attributes};
use crate::registry::BlockType;
use crate::schema::{ContentSchema, SchemaNode};
use crate::transform::Transform;
use serde_json::Value;

const SECTIONS: [(&str, &str); 3] = [("head", "thead"), ("body", "tbody"), ("foot", "tfoot")];

fn cell_schema() -> AttributeSchema {
    AttributeSchema::from([
        (
            "content".to_string(),
            AttributeDefinition::string().with_source(AttributeSource::Html {
                selector: None,
                multiline: None,
            }),
        ),
        (
            "tag".to_string(),
            AttributeDefinition::string()
                .with_source(AttributeSource::Tag { selector: None })
                .with_default("td"),
        ),
        (
            "scope".to_string(),
            AttributeDefinition::string().with_source(AttributeSource::Attribute {
                selector: None,
                attribute: "scope".into(),
            }),
        ),
    ])
}

fn section_definition(section: &str) -> AttributeDefinition {
    let rows = AttributeSchema::from([(
        "cells".to_string(),
        AttributeDefinition::array()
            .with_source(AttributeSource::query("td,th", cell_schema()))
            .with_default(Value::Array(Vec::new())),
    )]);
    AttributeDefinition::array()
        .with_source(AttributeSource::query(format!("{section} tr"), rows))
        .with_default(Value::Array(Vec::new()))
}

pub(super) fn table() -> BlockType {
    let cell = SchemaNode::phrasing().with_attributes(&["scope", "colspan", "rowspan"]);
    let row = SchemaNode::new().with_child_schema(ContentSchema::from([
        ("td".to_string(), cell.clone()),
        ("th".to_string(), cell),
    ]));
    let section = SchemaNode::new().with_child_schema(ContentSchema::from([("tr".to_string(), row)]));
    let schema = ContentSchema::from([(
        "table".to_string(),
        SchemaNode::new().with_child_schema(
            SECTIONS
                .iter()
                .map(|(_, tag)| (tag.to_string(), section.clone()))
                .collect(),
        ),
    )]);

    let mut block_type = BlockType::new(TABLE, "Table")
        .with_category("text")
        .with_description("Create structured content in rows and columns to display information.")
        .with_attribute("hasFixedLayout", AttributeDefinition::boolean().with_default(false))
        .with_attribute(
            "caption",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("figcaption"))
                .with_default(""),
        )
        .with_save(|attrs| Ok(save_table(attrs)))
        .with_transform_from(Transform::raw("table", schema));
    for (key, tag) in SECTIONS {
        block_type = block_type.with_attribute(key, section_definition(tag));
    }
    block_type
}

fn save_table(attrs: &Attributes) -> String {
    let sections: String = SECTIONS
        .iter()
        .filter_map(|(key, tag)| {
            let rows = attrs.get(*key).and_then(Value::as_array).filter(|rows| !rows.is_empty())?;
            let rows: String = rows.iter().map(save_row).collect();
            Some(format!("<{tag}>{rows}</{tag}>"))
        })
        .collect();
    let table_class = class_list([bool_attr(attrs, "hasFixedLayout").then(|| "has-fixed-layout".to_string())]);
    let caption = str_attr(attrs, "caption");
    let caption = if caption.is_empty() {
        String::new()
    } else {
        format!("<figcaption>{caption}</figcaption>")
    };
    format!("<figure class=\"wp-block-table\"><table{table_class}>{sections}</table>{caption}</figure>")
}

fn save_row(row: &Value) -> String {
    let cells: String = row
        .get("cells")
        .and_then(Value::as_array)
        .map(|cells| {
            cells
                .iter()
                .filter_map(Value::as_object)
                .map(|cell| {
                    let tag = match str_attr(cell, "tag") {
                        "th" => "th",
                        _ => "td",
                    };
                    format!(
                        "<{tag}{}>{}</{tag}>",
                        html_attr("scope", str_attr(cell, "scope")),
                        str_attr(cell, "content")
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    format!("<tr>{cells}</tr>")
}
