//! Text blocks: paragraph, heading, list, quote, code and preformatted.

use super::{
    CODE, HEADING, LIST, PARAGRAPH, PREFORMATTED, QUOTE, attrs_from, bool_attr, child_html, class_list, html_attr,
    int_attr, sourced_attributes, str_attr,
};
use crate::attribute::{AttributeDefinition, AttributeSource, Attributes};
use crate::block::Block;
use crate::factory::create_block;
use crate::registry::{BlockRegistry, BlockType, Deprecation};
use crate::schema::{ContentSchema, SchemaChildren, SchemaNode, merge_schemas, phrasing_content_schema};
use crate::transform::Transform;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s").expect("Invalid heading pattern"));
static BULLET_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s").expect("Invalid bullet pattern"));
static NUMBERED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[.)]\s").expect("Invalid numbered pattern"));
static QUOTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s").expect("Invalid quote pattern"));
static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\s*$").expect("Invalid fence pattern"));

/// Deepest list nesting kept when pasting.
const MAX_LIST_DEPTH: usize = 6;

pub(super) fn paragraph() -> BlockType {
    BlockType::new(PARAGRAPH, "Paragraph")
        .with_category("text")
        .with_description("Start with the basic building block of all narrative.")
        .with_keywords(&["text"])
        .with_attribute(
            "content",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("p"))
                .with_default(""),
        )
        .with_attribute("align", AttributeDefinition::string())
        .with_attribute("dropCap", AttributeDefinition::boolean().with_default(false))
        .with_attribute("placeholder", AttributeDefinition::string())
        .with_attribute("direction", AttributeDefinition::string().with_allowed(["ltr", "rtl"]))
        .with_save(|attrs| Ok(save_paragraph(attrs)))
        .with_transform_from(Transform::raw(
            "p",
            ContentSchema::from([("p".to_string(), SchemaNode::phrasing())]),
        ))
        .with_deprecation(Deprecation::new(|attrs| {
            let align = str_attr(attrs, "align");
            let style = if align.is_empty() {
                String::new()
            } else {
                format!("text-align:{align}")
            };
            Ok(format!("<p{}>{}</p>", html_attr("style", &style), str_attr(attrs, "content")))
        }))
}

fn save_paragraph(attrs: &Attributes) -> String {
    let align = str_attr(attrs, "align");
    let classes = class_list([
        (!align.is_empty()).then(|| format!("has-text-align-{align}")),
        bool_attr(attrs, "dropCap").then(|| "has-drop-cap".to_string()),
    ]);
    format!(
        "<p{classes}{}>{}</p>",
        html_attr("dir", str_attr(attrs, "direction")),
        str_attr(attrs, "content")
    )
}

fn paragraph_with(registry: &BlockRegistry, content: &str) -> Block {
    create_block(
        registry,
        PARAGRAPH,
        attrs_from([("content", Value::String(content.to_string()))]),
        Vec::new(),
    )
}

pub(super) fn heading() -> BlockType {
    let heading_tags = ["h1", "h2", "h3", "h4", "h5", "h6"];
    let schema: ContentSchema = heading_tags
        .iter()
        .map(|tag| (tag.to_string(), SchemaNode::phrasing().with_attributes(&["id"])))
        .collect();

    BlockType::new(HEADING, "Heading")
        .with_category("text")
        .with_description("Introduce new sections and organize content.")
        .with_keywords(&["title", "subtitle"])
        .with_attribute(
            "content",
            AttributeDefinition::string()
                .with_source(AttributeSource::html(heading_tags.join(",")))
                .with_default(""),
        )
        .with_attribute("level", AttributeDefinition::number().with_default(2))
        .with_attribute("textAlign", AttributeDefinition::string())
        .with_attribute("placeholder", AttributeDefinition::string())
        .with_save(|attrs| {
            let level = int_attr(attrs, "level").filter(|l| (1..=6).contains(l)).unwrap_or(2);
            let align = str_attr(attrs, "textAlign");
            let classes = class_list([(!align.is_empty()).then(|| format!("has-text-align-{align}"))]);
            Ok(format!("<h{level}{classes}>{}</h{level}>", str_attr(attrs, "content")))
        })
        .with_transform_from(
            Transform::raw(&heading_tags.join(","), schema).with_raw_transform(|context| {
                let mut attributes = sourced_attributes(context, HEADING);
                let level = context
                    .tree
                    .tag_name(context.node)
                    .and_then(|tag| tag.strip_prefix('h'))
                    .and_then(|digit| digit.parse::<i64>().ok())
                    .unwrap_or(2);
                attributes.insert("level".into(), Value::from(level));
                Some(create_block(context.registry, HEADING, attributes, Vec::new()))
            }),
        )
        .with_transform_from(
            Transform::block(&[PARAGRAPH], |registry, blocks| {
                blocks
                    .iter()
                    .map(|block| {
                        let mut attributes = attrs_from([(
                            "content",
                            Value::String(str_attr(block.attributes(), "content").to_string()),
                        )]);
                        if let Some(align) = block.attribute("align") {
                            attributes.insert("textAlign".into(), align.clone());
                        }
                        create_block(registry, HEADING, attributes, Vec::new())
                    })
                    .collect()
            })
            .multi_block(),
        )
        .with_transform_from(Transform::pattern(
            HEADING_PATTERN.clone(),
            |captures, rest| {
                let level = captures.get(1).map_or(2, |m| m.as_str().len());
                attrs_from([
                    ("level", Value::from(level)),
                    ("content", Value::String(rest.to_string())),
                ])
            },
        ))
        .with_transform_to(
            Transform::block(&[PARAGRAPH], |registry, blocks| {
                blocks
                    .iter()
                    .map(|block| paragraph_with(registry, str_attr(block.attributes(), "content")))
                    .collect()
            })
            .multi_block(),
        )
}

/// Allowed markup inside a pasted list, `depth` levels deep.
fn list_schema(depth: usize) -> ContentSchema {
    let mut item_children = phrasing_content_schema(true);
    if depth > 0 {
        item_children = merge_schemas(item_children, list_schema(depth - 1));
    }
    let item = SchemaNode::new().with_children(SchemaChildren::Schema(item_children));
    let list = SchemaNode::new()
        .with_attributes(&["type", "start", "reversed"])
        .with_child_schema(ContentSchema::from([("li".to_string(), item)]));
    ContentSchema::from([("ol".to_string(), list.clone()), ("ul".to_string(), list)])
}

pub(super) fn list() -> BlockType {
    BlockType::new(LIST, "List")
        .with_category("text")
        .with_description("Create a bulleted or numbered list.")
        .with_keywords(&["bullet list", "ordered list", "numbered list"])
        .with_attribute("ordered", AttributeDefinition::boolean().with_default(false))
        .with_attribute(
            "values",
            AttributeDefinition::string()
                .with_source(AttributeSource::multiline("ol,ul", "li"))
                .with_default(""),
        )
        .with_attribute("type", AttributeDefinition::string())
        .with_attribute("start", AttributeDefinition::number())
        .with_attribute("reversed", AttributeDefinition::boolean())
        .with_attribute("placeholder", AttributeDefinition::string())
        .with_save(|attrs| {
            let tag = if bool_attr(attrs, "ordered") { "ol" } else { "ul" };
            let start = int_attr(attrs, "start").map(|s| s.to_string()).unwrap_or_default();
            let reversed = if bool_attr(attrs, "reversed") { " reversed" } else { "" };
            Ok(format!(
                "<{tag}{}{reversed}{}>{}</{tag}>",
                html_attr("start", &start),
                html_attr("type", str_attr(attrs, "type")),
                str_attr(attrs, "values")
            ))
        })
        .with_transform_from(
            Transform::raw("ol,ul", list_schema(MAX_LIST_DEPTH)).with_raw_transform(|context| {
                let mut attributes = sourced_attributes(context, LIST);
                attributes.insert("ordered".into(), Value::Bool(context.tree.is_tag(context.node, "ol")));
                for key in ["start", "type"] {
                    if let Some(value) = context.tree.attr(context.node, key) {
                        attributes.insert(key.into(), Value::String(value.to_string()));
                    }
                }
                if context.tree.has_attr(context.node, "reversed") {
                    attributes.insert("reversed".into(), Value::Bool(true));
                }
                Some(create_block(context.registry, LIST, attributes, Vec::new()))
            }),
        )
        .with_transform_from(
            Transform::block(&[PARAGRAPH], |registry, blocks| {
                let values: String = blocks
                    .iter()
                    .map(|block| format!("<li>{}</li>", str_attr(block.attributes(), "content")))
                    .collect();
                vec![create_block(
                    registry,
                    LIST,
                    attrs_from([("values", Value::String(values))]),
                    Vec::new(),
                )]
            })
            .multi_block(),
        )
        .with_transform_from(Transform::pattern(BULLET_PATTERN.clone(), |_, rest| {
            attrs_from([("values", Value::String(format!("<li>{rest}</li>")))])
        }))
        .with_transform_from(Transform::pattern(NUMBERED_PATTERN.clone(), |_, rest| {
            attrs_from([
                ("ordered", Value::Bool(true)),
                ("values", Value::String(format!("<li>{rest}</li>"))),
            ])
        }))
        .with_transform_to(
            Transform::block(&[PARAGRAPH], |registry, blocks| {
                blocks
                    .iter()
                    .flat_map(|block| child_html(str_attr(block.attributes(), "values"), "li"))
                    .map(|item| paragraph_with(registry, &item))
                    .collect()
            })
            .multi_block(),
        )
}

pub(super) fn quote() -> BlockType {
    let quote_schema = ContentSchema::from([(
        "blockquote".to_string(),
        SchemaNode::new().with_child_schema(ContentSchema::from([
            ("p".to_string(), SchemaNode::phrasing()),
            ("cite".to_string(), SchemaNode::phrasing()),
        ])),
    )]);

    BlockType::new(QUOTE, "Quote")
        .with_category("text")
        .with_description("Give quoted text visual emphasis.")
        .with_keywords(&["blockquote", "cite"])
        .with_attribute(
            "value",
            AttributeDefinition::string()
                .with_source(AttributeSource::multiline("blockquote", "p"))
                .with_default(""),
        )
        .with_attribute(
            "citation",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("cite"))
                .with_default(""),
        )
        .with_attribute("align", AttributeDefinition::string())
        .with_save(|attrs| {
            let align = str_attr(attrs, "align");
            let classes = class_list([
                Some("wp-block-quote".to_string()),
                (!align.is_empty()).then(|| format!("has-text-align-{align}")),
            ]);
            let citation = str_attr(attrs, "citation");
            let cite = if citation.is_empty() {
                String::new()
            } else {
                format!("<cite>{citation}</cite>")
            };
            Ok(format!("<blockquote{classes}>{}{cite}</blockquote>", str_attr(attrs, "value")))
        })
        .with_transform_from(Transform::raw("blockquote", quote_schema))
        .with_transform_from(
            Transform::block(&[PARAGRAPH], |registry, blocks| {
                let value: String = blocks
                    .iter()
                    .map(|block| format!("<p>{}</p>", str_attr(block.attributes(), "content")))
                    .collect();
                vec![create_block(
                    registry,
                    QUOTE,
                    attrs_from([("value", Value::String(value))]),
                    Vec::new(),
                )]
            })
            .multi_block(),
        )
        .with_transform_from(Transform::pattern(QUOTE_PATTERN.clone(), |_, rest| {
            attrs_from([("value", Value::String(format!("<p>{rest}</p>")))])
        }))
        .with_transform_to(Transform::block(&[PARAGRAPH], |registry, blocks| {
            let mut paragraphs: Vec<Block> = Vec::new();
            for block in blocks {
                let attrs = block.attributes();
                paragraphs.extend(
                    child_html(str_attr(attrs, "value"), "p")
                        .iter()
                        .map(|text| paragraph_with(registry, text)),
                );
                let citation = str_attr(attrs, "citation");
                if !citation.is_empty() {
                    paragraphs.push(paragraph_with(registry, citation));
                }
            }
            paragraphs
        }))
}

fn is_code_element(tree: &block_html::Tree, node: block_html::NodeId) -> bool {
    if !tree.is_tag(node, "pre") {
        return false;
    }
    let children: Vec<_> = tree
        .children(node)
        .into_iter()
        .filter(|child| !(tree.is_text(*child) && tree.text_content(*child).trim().is_empty()))
        .collect();
    children.len() == 1 && tree.is_tag(children[0], "code")
}

pub(super) fn code() -> BlockType {
    let code_schema = ContentSchema::from([(
        "pre".to_string(),
        SchemaNode::new().with_child_schema(ContentSchema::from([(
            "code".to_string(),
            SchemaNode::new().with_child_schema(ContentSchema::from([(
                crate::schema::TEXT_NODE.to_string(),
                SchemaNode::new(),
            )])),
        )])),
    )]);

    BlockType::new(CODE, "Code")
        .with_category("text")
        .with_description("Display code snippets that respect your spacing and tabs.")
        .with_attribute(
            "content",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("code"))
                .with_default(""),
        )
        .with_save(|attrs| {
            Ok(format!(
                "<pre class=\"wp-block-code\"><code>{}</code></pre>",
                str_attr(attrs, "content")
            ))
        })
        .with_transform_from(Transform::raw_matching(is_code_element, code_schema))
        .with_transform_from(Transform::pattern(FENCE_PATTERN.clone(), |_, _| Attributes::new()))
        .with_transform_to(Transform::block(&[PARAGRAPH], |registry, blocks| {
            blocks
                .iter()
                .map(|block| paragraph_with(registry, &str_attr(block.attributes(), "content").replace('\n', "<br>")))
                .collect()
        }))
}

pub(super) fn preformatted() -> BlockType {
    BlockType::new(PREFORMATTED, "Preformatted")
        .with_category("text")
        .with_description("Add text that respects your spacing and tabs.")
        .with_attribute(
            "content",
            AttributeDefinition::string()
                .with_source(AttributeSource::html("pre"))
                .with_default(""),
        )
        .with_save(|attrs| {
            Ok(format!(
                "<pre class=\"wp-block-preformatted\">{}</pre>",
                str_attr(attrs, "content")
            ))
        })
        .with_transform_from(
            Transform::raw_matching(
                |tree, node| tree.is_tag(node, "pre") && !is_code_element(tree, node),
                ContentSchema::from([(
                    "pre".to_string(),
                    SchemaNode::phrasing(),
                )]),
            )
            .with_priority(11),
        )
        .with_transform_from(Transform::block(&[CODE, PARAGRAPH], |registry, blocks| {
            blocks
                .iter()
                .map(|block| {
                    create_block(
                        registry,
                        PREFORMATTED,
                        attrs_from([(
                            "content",
                            Value::String(str_attr(block.attributes(), "content").to_string()),
                        )]),
                        Vec::new(),
                    )
                })
                .collect()
        }))
        .with_transform_to(Transform::block(&[PARAGRAPH], |registry, blocks| {
            blocks
                .iter()
                .map(|block| paragraph_with(registry, str_attr(block.attributes(), "content")))
                .collect()
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{find_pattern_transform, switch_to_block_type};
    use crate::parser::parse;
    use crate::serializer::serialize;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn registry() -> BlockRegistry {
        BlockRegistry::with_builtins()
    }

    #[test]
    fn test_paragraph_default_markup() {
        let attrs = attrs_from([("content", json!("Hello"))]);
        assert_eq!(save_paragraph(&attrs), "<p>Hello</p>");
    }

    #[test]
    fn test_paragraph_classes() {
        let attrs = attrs_from([
            ("content", json!("Hi")),
            ("align", json!("center")),
            ("dropCap", json!(true)),
        ]);
        assert_eq!(
            save_paragraph(&attrs),
            r#"<p class="has-text-align-center has-drop-cap">Hi</p>"#
        );
    }

    #[test]
    fn test_paragraph_inline_alignment_migrates() {
        let registry = registry();
        let blocks = parse(
            &registry,
            "<!-- wp:paragraph {\"align\":\"right\"} -->\n<p style=\"text-align:right\">Old</p>\n<!-- /wp:paragraph -->",
        );
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_valid());
        assert_eq!(
            serialize(&registry, &blocks),
            "<!-- wp:paragraph {\"align\":\"right\"} -->\n<p class=\"has-text-align-right\">Old</p>\n<!-- /wp:paragraph -->"
        );
    }

    #[rstest]
    #[case("## Title", 2, "Title")]
    #[case("# Top", 1, "Top")]
    #[case("###### Deep", 6, "Deep")]
    fn test_heading_pattern(#[case] text: &str, #[case] level: i64, #[case] content: &str) {
        let block = find_pattern_transform(&registry(), text).unwrap();
        assert_eq!(block.name(), HEADING);
        assert_eq!(block.attribute("level"), Some(&json!(level)));
        assert_eq!(block.attribute("content"), Some(&json!(content)));
    }

    #[test]
    fn test_list_patterns() {
        let registry = registry();
        let bullet = find_pattern_transform(&registry, "- item").unwrap();
        assert_eq!(bullet.name(), LIST);
        assert_eq!(bullet.attribute("ordered"), Some(&json!(false)));
        assert_eq!(bullet.attribute("values"), Some(&json!("<li>item</li>")));

        let numbered = find_pattern_transform(&registry, "1. first").unwrap();
        assert_eq!(numbered.attribute("ordered"), Some(&json!(true)));
    }

    #[test]
    fn test_heading_round_trip() {
        let registry = registry();
        let markup = "<!-- wp:heading {\"level\":3} -->\n<h3>Section</h3>\n<!-- /wp:heading -->";
        let blocks = parse(&registry, markup);
        assert!(blocks[0].is_valid());
        assert_eq!(blocks[0].attribute("level"), Some(&json!(3)));
        assert_eq!(serialize(&registry, &blocks), markup);
    }

    #[test]
    fn test_paragraphs_to_list_and_back() {
        let registry = registry();
        let paragraphs = vec![paragraph_with(&registry, "a"), paragraph_with(&registry, "b")];
        let list = switch_to_block_type(&registry, &paragraphs, LIST).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].attribute("values"), Some(&json!("<li>a</li><li>b</li>")));

        let back = switch_to_block_type(&registry, &list, PARAGRAPH).unwrap();
        let contents: Vec<_> = back.iter().map(|b| b.attribute("content").cloned()).collect();
        assert_eq!(contents, vec![Some(json!("a")), Some(json!("b"))]);
    }

    #[test]
    fn test_heading_keeps_paragraph_identity() {
        let registry = registry();
        let paragraph = paragraph_with(&registry, "Title");
        let id = paragraph.id();
        let heading = switch_to_block_type(&registry, &[paragraph], HEADING).unwrap();
        assert_eq!(heading[0].id(), id);
        assert_eq!(heading[0].attribute("level"), Some(&json!(2)));
    }

    #[test]
    fn test_quote_to_paragraphs_includes_citation() {
        let registry = registry();
        let quote = create_block(
            &registry,
            QUOTE,
            attrs_from([("value", json!("<p>one</p><p>two</p>")), ("citation", json!("me"))]),
            Vec::new(),
        );
        let paragraphs = switch_to_block_type(&registry, &[quote], PARAGRAPH).unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[2].attribute("content"), Some(&json!("me")));
    }

    #[test]
    fn test_list_round_trip() {
        let registry = registry();
        let markup = "<!-- wp:list {\"ordered\":true} -->\n<ol><li>a</li><li>b</li></ol>\n<!-- /wp:list -->";
        let blocks = parse(&registry, markup);
        assert!(blocks[0].is_valid());
        assert_eq!(blocks[0].attribute("values"), Some(&json!("<li>a</li><li>b</li>")));
        assert_eq!(serialize(&registry, &blocks), markup);
    }

    #[test]
    fn test_code_matches_only_pre_with_code() {
        let tree = block_html::Tree::parse_fragment("<pre><code>x</code></pre><pre>y</pre>");
        let children = tree.children(tree.root());
        assert!(is_code_element(&tree, children[0]));
        assert!(!is_code_element(&tree, children[1]));
    }

    #[test]
    fn test_list_schema_nests() {
        let schema = list_schema(1);
        let item = &schema["ul"].children;
        let Some(SchemaChildren::Schema(items)) = item else {
            panic!("list children should be a schema");
        };
        let Some(SchemaChildren::Schema(inside)) = &items["li"].children else {
            panic!("item children should be a schema");
        };
        assert!(inside.contains_key("ul"));
        assert!(inside.contains_key("strong"));
    }
}
