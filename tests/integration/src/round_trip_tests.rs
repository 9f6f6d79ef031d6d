//! End-to-end round trips across the grammar, the model and the serializer
//!
//! Documents are split by the grammar, resolved into blocks against the
//! built-in registry and written back.

use block_grammar::{Segment, serialize_raw_block};
use block_model::library::{FREEFORM, MISSING, PARAGRAPH};
use block_model::{BlockRegistry, SerializeOptions, parse, serialize, serialize_with_options, validate_block};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

const POST: &str = concat!(
    "<!-- wp:heading {\"level\":3} -->\n<h3>Release notes</h3>\n<!-- /wp:heading -->\n\n",
    "<!-- wp:paragraph -->\n<p>Highlights of <strong>this</strong> release:</p>\n<!-- /wp:paragraph -->\n\n",
    "<!-- wp:list -->\n<ul><li>Faster parsing</li><li>Fewer <em>surprises</em></li></ul>\n<!-- /wp:list -->\n\n",
    "<!-- wp:image {\"id\":7} -->\n<figure class=\"wp-block-image\"><img src=\"shot.png\" alt=\"Screenshot\" class=\"wp-image-7\"/></figure>\n<!-- /wp:image -->\n\n",
    "<!-- wp:separator -->\n<hr class=\"wp-block-separator\"/>\n<!-- /wp:separator -->",
);

#[test]
fn test_grammar_and_model_agree_on_structure() {
    let registry = BlockRegistry::with_builtins();
    let segments = block_grammar::parse(POST);
    let block_segments: Vec<&Segment> = segments.iter().filter(|s| s.name().is_some()).collect();
    let blocks = parse(&registry, POST);

    assert_eq!(block_segments.len(), blocks.len());
    for (segment, block) in block_segments.iter().zip(&blocks) {
        let name = segment.name().unwrap();
        assert_eq!(block.name(), name);
    }
}

#[test]
fn test_post_round_trips_exactly() {
    let registry = BlockRegistry::with_builtins();
    let blocks = parse(&registry, POST);
    assert!(blocks.iter().all(|b| b.is_valid()), "{blocks:#?}");
    assert_eq!(serialize(&registry, &blocks), POST);
}

#[test]
fn test_reparsed_blocks_validate() {
    let registry = BlockRegistry::with_builtins();
    let blocks = parse(&registry, POST);
    let reparsed = parse(&registry, &serialize(&registry, &blocks));
    for block in &reparsed {
        let block_type = registry.get(block.name()).unwrap();
        let (valid, issues) = validate_block(&registry, block_type, block.attributes(), block.original_content().unwrap_or_default());
        assert!(valid, "{} failed: {issues:?}", block.name());
    }
}

#[test]
fn test_full_names_when_namespace_kept() {
    let registry = BlockRegistry::with_builtins();
    let blocks = parse(&registry, POST);
    let written = serialize_with_options(
        &registry,
        &blocks,
        &SerializeOptions {
            strip_core_namespace: false,
        },
    );
    assert!(written.starts_with("<!-- wp:core/heading {\"level\":3} -->"));

    let reparsed = parse(&registry, &written);
    let summary = |blocks: &[block_model::Block]| {
        blocks
            .iter()
            .map(|b| (b.name().to_string(), b.attributes().clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&reparsed), summary(&blocks));
}

#[test]
fn test_unknown_block_matches_raw_serialization() {
    let registry = BlockRegistry::with_builtins();
    let document = "<!-- wp:acme/chart {\"series\":[1,2,3]} -->\n<div class=\"chart\"></div>\n<!-- /wp:acme/chart -->";
    let Segment::Block(node) = &block_grammar::parse(document)[0] else {
        panic!("expected a block segment");
    };
    let blocks = parse(&registry, document);
    assert_eq!(blocks[0].name(), MISSING);
    assert_eq!(
        blocks[0].attribute("originalContent").and_then(|v| v.as_str()),
        Some(serialize_raw_block(node, true).as_str())
    );
    assert_eq!(serialize(&registry, &blocks), document);
}

#[rstest]
#[case::plain_text("Just some text", FREEFORM)]
#[case::legacy_name("<!-- wp:core/text -->\n<p>Old</p>\n<!-- /wp:core/text -->", PARAGRAPH)]
#[case::unknown("<!-- wp:acme/x /-->", MISSING)]
fn test_resolution(#[case] document: &str, #[case] expected: &str) {
    let registry = BlockRegistry::with_builtins();
    let blocks = parse(&registry, document);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), expected);
}

proptest! {
    #[test]
    fn test_heading_and_paragraph_documents_round_trip(
        parts in prop::collection::vec(("[a-zA-Z][a-zA-Z ]{0,20}", 1u8..=6, any::<bool>()), 1..6)
    ) {
        let document = parts
            .iter()
            .map(|(text, level, heading)| {
                let text = text.trim_end();
                if *heading {
                    let header = if *level == 2 { String::new() } else { format!(" {{\"level\":{level}}}") };
                    format!("<!-- wp:heading{header} -->\n<h{level}>{text}</h{level}>\n<!-- /wp:heading -->")
                } else {
                    format!("<!-- wp:paragraph -->\n<p>{text}</p>\n<!-- /wp:paragraph -->")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let registry = BlockRegistry::with_builtins();
        let blocks = parse(&registry, &document);
        prop_assert_eq!(blocks.len(), parts.len());
        prop_assert!(blocks.iter().all(|b| b.is_valid()));
        prop_assert_eq!(serialize(&registry, &blocks), document);
    }
}
