//! Media and design blocks: image and separator.

use super::{IMAGE, SEPARATOR, class_list, html_attr, int_attr, sourced_attributes, str_attr};
use crate::attribute::{AttributeDefinition, AttributeSource, Attributes};
use crate::factory::create_block;
use crate::registry::BlockType;
use crate::schema::{ContentSchema, SchemaNode};
use crate::transform::Transform;
use block_grammar::Shortcode;
use block_html::{NodeId, Tree};
use html_escape::encode_double_quoted_attribute;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SEPARATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}$").expect("Invalid separator pattern"));

const ALIGNMENTS: &[&str] = &["left", "center", "right", "wide", "full"];

pub(super) fn image() -> BlockType {
    BlockType::new(IMAGE, "Image")
        .with_category("media")
        .with_description("Insert an image to make a visual statement.")
        .with_keywords(&["img", "photo", "picture"])
        .with_attribute(
            "url",
            AttributeDefinition::string().with_source(AttributeSource::attribute("img", "src")),
        )
        .with_attribute(
            "alt",
            AttributeDefinition::string()
                .with_source(AttributeSource::attribute("img", "alt"))
                .with_default(""),
        )
        .with_attribute(
            "caption",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("figcaption"))
                .with_default(""),
        )
        .with_attribute(
            "title",
            AttributeDefinition::string().with_source(AttributeSource::attribute("img", "title")),
        )
        .with_attribute(
            "href",
            AttributeDefinition::string().with_source(AttributeSource::attribute("figure > a", "href")),
        )
        .with_attribute(
            "rel",
            AttributeDefinition::string().with_source(AttributeSource::attribute("figure > a", "rel")),
        )
        .with_attribute(
            "linkTarget",
            AttributeDefinition::string().with_source(AttributeSource::attribute("figure > a", "target")),
        )
        .with_attribute("id", AttributeDefinition::number())
        .with_attribute("align", AttributeDefinition::string())
        .with_attribute("width", AttributeDefinition::number())
        .with_attribute("height", AttributeDefinition::number())
        .with_attribute("sizeSlug", AttributeDefinition::string())
        .with_attribute("linkDestination", AttributeDefinition::string())
        .with_save(|attrs| Ok(save_image(attrs)))
        .with_transform_from(
            Transform::raw_matching(
                |tree, node| tree.is_tag(node, "figure") && tree.query(node, "img").is_some(),
                image_schema(),
            )
            .with_raw_transform(|context| {
                let mut attributes = sourced_attributes(context, IMAGE);
                attributes.extend(class_attributes(context.tree, context.node));
                Some(create_block(context.registry, IMAGE, attributes, Vec::new()))
            }),
        )
        .with_transform_from(Transform::shortcode(&["caption"], caption_shortcode))
}

fn save_image(attrs: &Attributes) -> String {
    let align = str_attr(attrs, "align");
    let size = str_attr(attrs, "sizeSlug");
    let width = int_attr(attrs, "width");
    let height = int_attr(attrs, "height");
    let figure_classes = class_list([
        Some("wp-block-image".to_string()),
        (!align.is_empty()).then(|| format!("align{align}")),
        (!size.is_empty()).then(|| format!("size-{size}")),
        (width.is_some() || height.is_some()).then(|| "is-resized".to_string()),
    ]);

    let image = format!(
        "<img src=\"{}\" alt=\"{}\"{}{}{}{}/>",
        encode_double_quoted_attribute(str_attr(attrs, "url")),
        encode_double_quoted_attribute(str_attr(attrs, "alt")),
        class_list([int_attr(attrs, "id").map(|id| format!("wp-image-{id}"))]),
        html_attr("title", str_attr(attrs, "title")),
        html_attr("width", &width.map(|w| w.to_string()).unwrap_or_default()),
        html_attr("height", &height.map(|h| h.to_string()).unwrap_or_default()),
    );

    let href = str_attr(attrs, "href");
    let linked = if href.is_empty() {
        image
    } else {
        format!(
            "<a{}{}{}>{image}</a>",
            html_attr("href", href),
            html_attr("target", str_attr(attrs, "linkTarget")),
            html_attr("rel", str_attr(attrs, "rel")),
        )
    };

    let caption = str_attr(attrs, "caption");
    let caption = if caption.is_empty() {
        String::new()
    } else {
        format!("<figcaption>{caption}</figcaption>")
    };
    format!("<figure{figure_classes}>{linked}{caption}</figure>")
}

fn image_schema() -> ContentSchema {
    let img = SchemaNode::new()
        .with_attributes(&["src", "alt", "title", "width", "height"])
        .with_classes(&["align*", "wp-image-*", "size-*"]);
    let link = SchemaNode::new()
        .with_attributes(&["href", "rel", "target"])
        .with_child_schema(ContentSchema::from([("img".to_string(), img.clone())]));
    let figure = SchemaNode::new()
        .with_classes(&["align*", "wp-block-image", "size-*"])
        .with_require(&["img"])
        .with_child_schema(ContentSchema::from([
            ("a".to_string(), link),
            ("img".to_string(), img),
            ("figcaption".to_string(), SchemaNode::phrasing()),
        ]));
    ContentSchema::from([("figure".to_string(), figure)])
}

/// `align` and `id` recovered from the classes of a figure and its image.
fn class_attributes(tree: &Tree, figure: NodeId) -> Attributes {
    let mut attributes = Attributes::new();
    let mut nodes = vec![figure];
    nodes.extend(tree.query(figure, "img"));
    for node in nodes {
        let Some(element) = tree.element(node) else {
            continue;
        };
        for class in element.classes() {
            if let Some(align) = class.strip_prefix("align").filter(|a| ALIGNMENTS.contains(a)) {
                attributes.insert("align".into(), Value::String(align.to_string()));
            } else if let Some(id) = class.strip_prefix("wp-image-").and_then(|id| id.parse::<i64>().ok()) {
                attributes.insert("id".into(), Value::from(id));
            }
        }
    }
    attributes
}

/// Attributes for `[caption]<img ...> Text[/caption]`.
fn caption_shortcode(shortcode: &Shortcode) -> Attributes {
    let content = shortcode.content.as_deref().unwrap_or_default();
    let mut tree = Tree::parse_fragment(content);
    let root = tree.root();
    let mut attributes = Attributes::new();

    if let Some(img) = tree.query(root, "img") {
        for (attr, key) in [("src", "url"), ("alt", "alt"), ("title", "title")] {
            if let Some(value) = tree.attr(img, attr) {
                attributes.insert(key.into(), Value::String(value.to_string()));
            }
        }
        attributes.extend(class_attributes(&tree, img));
        let linked = tree.parent(img).filter(|parent| tree.is_tag(*parent, "a"));
        if let Some(link) = linked {
            if let Some(href) = tree.attr(link, "href") {
                attributes.insert("href".into(), Value::String(href.to_string()));
            }
        }
        tree.remove(linked.unwrap_or(img));
    }

    let caption = tree.to_html();
    attributes.insert("caption".into(), Value::String(caption.trim().to_string()));
    if let Some(align) = shortcode
        .attrs
        .get("align")
        .and_then(|a| a.strip_prefix("align"))
        .filter(|a| ALIGNMENTS.contains(a))
    {
        attributes.insert("align".into(), Value::String(align.to_string()));
    }
    if let Some(width) = shortcode.attrs.get("width").and_then(|w| w.parse::<i64>().ok()) {
        attributes.insert("width".into(), Value::from(width));
    }
    attributes
}

pub(super) fn separator() -> BlockType {
    BlockType::new(SEPARATOR, "Separator")
        .with_category("design")
        .with_description("Create a break between ideas or sections with a horizontal separator.")
        .with_keywords(&["horizontal-line", "hr", "divider"])
        .with_save(|_| Ok("<hr class=\"wp-block-separator\"/>".to_string()))
        .with_transform_from(Transform::raw(
            "hr",
            ContentSchema::from([("hr".to_string(), SchemaNode::new())]),
        ))
        .with_transform_from(Transform::pattern(SEPARATOR_PATTERN.clone(), |_, _| Attributes::new()))
}
