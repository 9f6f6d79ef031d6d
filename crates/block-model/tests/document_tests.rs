//! Integration tests for parsing and serializing whole documents.

use block_model::library::{BUILTIN_COUNT, FREEFORM, HEADING, MISSING, PARAGRAPH};
use block_model::{
    AttributeDefinition, AttributeSource, Attributes, BlockRegistry, BlockType, Deprecation, is_equivalent_html,
    parse, serialize,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn text_of(attrs: &Attributes, key: &str) -> String {
    attrs.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn test_registry() -> BlockRegistry {
    let mut registry = BlockRegistry::with_builtins();
    registry.register(
        BlockType::new("core/test", "Test")
            .with_category("common")
            .with_attribute(
                "content",
                AttributeDefinition::string().with_source(AttributeSource::Text { selector: None }),
            )
            .with_attribute("smoked", AttributeDefinition::string())
            .with_save(|attrs| Ok(text_of(attrs, "content"))),
    );
    registry
}

#[test]
fn test_comment_and_sourced_attributes() {
    let registry = test_registry();
    let blocks = parse(&registry, r#"<!-- wp:core/test {"smoked":"yes"} -->Brisket<!-- /wp:core/test -->"#);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), "core/test");
    assert_eq!(
        Value::Object(blocks[0].attributes().clone()),
        json!({"content": "Brisket", "smoked": "yes"})
    );
    assert!(blocks[0].is_valid());
}

#[test]
fn test_empty_document() {
    let registry = test_registry();
    assert!(parse(&registry, "").is_empty());
    assert_eq!(serialize(&registry, &[]), "");
}

#[test]
fn test_unknown_type_keeps_delimiters() {
    let registry = test_registry();
    let blocks = parse(&registry, "<!-- wp:acme/unknown {\"x\":1} -->\n<p>Body</p>\n<!-- /wp:acme/unknown -->");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), MISSING);
    let original = text_of(blocks[0].attributes(), "originalContent");
    assert!(original.starts_with("<!-- wp:acme/unknown {\"x\":1} -->"));
    assert!(original.ends_with("<!-- /wp:acme/unknown -->"));
}

#[test]
fn test_unknown_type_without_handler_is_dropped() {
    let mut registry = BlockRegistry::new();
    registry.register(
        BlockType::new("acme/known", "Known")
            .with_category("text")
            .with_save(|_| Ok(String::new())),
    );
    assert!(parse(&registry, "<!-- wp:acme/unknown /-->").is_empty());
}

#[test]
fn test_unknown_type_falls_back_to_freeform_handler() {
    let mut registry = BlockRegistry::with_builtins();
    registry.unregister(MISSING);
    assert_eq!(registry.unknown_type_handler(), None);

    let markup = "<!-- wp:acme/unknown {\"x\":1} -->\n<p>Body</p>\n<!-- /wp:acme/unknown -->";
    let blocks = parse(&registry, markup);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), FREEFORM);
    assert_eq!(blocks[0].attribute("content"), Some(&json!(markup)));
    assert_eq!(serialize(&registry, &blocks), markup);
}

#[test]
fn test_freeform_fallback_keeps_nested_markup_once() {
    let mut registry = BlockRegistry::with_builtins();
    registry.unregister(MISSING);

    let markup = concat!(
        "<!-- wp:acme/box -->\n",
        "<!-- wp:paragraph -->\n<p>In</p>\n<!-- /wp:paragraph -->\n",
        "<!-- /wp:acme/box -->",
    );
    let blocks = parse(&registry, markup);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), FREEFORM);
    assert!(blocks[0].inner_blocks().is_empty());
    assert_eq!(serialize(&registry, &blocks), markup);
}

#[test]
fn test_class_equivalence() {
    assert!(is_equivalent_html(r#"<p class="a b">x</p>"#, r#"<p class="b a">x</p>"#));
    assert!(!is_equivalent_html("<p>x</p>", "<p>y</p>"));
}

#[test]
fn test_deprecated_shape_migrates() {
    let mut registry = BlockRegistry::with_builtins();
    let old_schema = [(
        "text".to_string(),
        AttributeDefinition::string().with_source(AttributeSource::html("p")),
    )]
    .into_iter()
    .collect();
    registry.register(
        BlockType::new("acme/note", "Note")
            .with_category("text")
            .with_attribute(
                "body",
                AttributeDefinition::string().with_source(AttributeSource::html("p")),
            )
            .with_save(|attrs| Ok(format!("<p class=\"note\">{}</p>", text_of(attrs, "body"))))
            .with_deprecation(
                Deprecation::new(|attrs| Ok(format!("<div><p>{}</p></div>", text_of(attrs, "text"))))
                    .with_attributes(old_schema)
                    .with_migrate(|attrs, inner| {
                        let mut migrated = Attributes::new();
                        migrated.insert("body".into(), json!(text_of(&attrs, "text").to_uppercase()));
                        (migrated, inner)
                    }),
            ),
    );

    let blocks = parse(&registry, "<!-- wp:acme/note -->\n<div><p>hi</p></div>\n<!-- /wp:acme/note -->");
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].is_valid());
    assert_eq!(blocks[0].attribute("body"), Some(&json!("HI")));
    assert_eq!(
        serialize(&registry, &blocks),
        "<!-- wp:acme/note -->\n<p class=\"note\">HI</p>\n<!-- /wp:acme/note -->"
    );
}

#[test]
fn test_invalid_block_serializes_original_markup() {
    let registry = BlockRegistry::with_builtins();
    let markup = "<!-- wp:paragraph -->\n<p>Hello <span>there</p>\n<!-- /wp:paragraph -->";
    let blocks = parse(&registry, markup);
    assert_eq!(blocks.len(), 1);
    assert!(!blocks[0].is_valid());
    assert!(!blocks[0].validation_issues().is_empty());
    assert_eq!(blocks[0].original_content(), Some("<p>Hello <span>there</p>"));
    assert!(serialize(&registry, &blocks).contains("<p>Hello <span>there</p>"));
}

#[test]
fn test_mixed_document_round_trip() {
    let registry = BlockRegistry::with_builtins();
    let document = [
        "<!-- wp:heading -->\n<h2>Intro</h2>\n<!-- /wp:heading -->",
        "<!-- wp:paragraph {\"dropCap\":true} -->\n<p class=\"has-drop-cap\">Once upon a time</p>\n<!-- /wp:paragraph -->",
        "<!-- wp:separator -->\n<hr class=\"wp-block-separator\"/>\n<!-- /wp:separator -->",
        "<!-- wp:quote -->\n<blockquote class=\"wp-block-quote\"><p>Quoted</p><cite>Someone</cite></blockquote>\n<!-- /wp:quote -->",
        "<!-- wp:code -->\n<pre class=\"wp-block-code\"><code>let x = 1;</code></pre>\n<!-- /wp:code -->",
    ]
    .join("\n\n");

    let blocks = parse(&registry, &document);
    assert_eq!(blocks.len(), 5);
    assert!(blocks.iter().all(|b| b.is_valid()));
    assert_eq!(blocks[0].name(), HEADING);

    let written = serialize(&registry, &blocks);
    assert_eq!(written, document);

    let reparsed = parse(&registry, &written);
    let names: Vec<_> = reparsed.iter().map(|b| b.name().to_string()).collect();
    let original_names: Vec<_> = blocks.iter().map(|b| b.name().to_string()).collect();
    assert_eq!(names, original_names);
    for (a, b) in blocks.iter().zip(&reparsed) {
        assert_eq!(a.attributes(), b.attributes());
    }
}

#[test]
fn test_nested_blocks_keep_structure() {
    let mut registry = BlockRegistry::with_builtins();
    registry.register(
        BlockType::new("acme/group", "Group")
            .with_category("design")
            .with_save(|_| Ok(format!("<div class=\"group\">{}</div>", block_model::registry::INNER_BLOCKS))),
    );
    let markup = "<!-- wp:acme/group -->\n<div class=\"group\"><!-- wp:paragraph -->\n<p>Inside</p>\n<!-- /wp:paragraph --></div>\n<!-- /wp:acme/group -->";
    let blocks = parse(&registry, markup);
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].is_valid(), "{:?}", blocks[0].validation_issues());
    assert_eq!(blocks[0].inner_blocks().len(), 1);
    assert_eq!(blocks[0].inner_blocks()[0].name(), PARAGRAPH);
    assert_eq!(blocks[0].count(), 2);
    assert_eq!(serialize(&registry, &blocks), markup);
}

#[test]
fn test_freeform_between_blocks() {
    let registry = BlockRegistry::with_builtins();
    let blocks = parse(
        &registry,
        "Loose text\n\n<!-- wp:paragraph -->\n<p>Block</p>\n<!-- /wp:paragraph -->",
    );
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].name(), FREEFORM);
    assert_eq!(blocks[0].attribute("content"), Some(&json!("<p>Loose text</p>")));
}

#[test]
fn test_builtins_are_complete() {
    let registry = BlockRegistry::with_builtins();
    assert_eq!(registry.len(), BUILTIN_COUNT);
    assert_eq!(registry.unknown_type_handler(), Some(MISSING));
    assert_eq!(registry.freeform_handler(), Some(FREEFORM));
}
