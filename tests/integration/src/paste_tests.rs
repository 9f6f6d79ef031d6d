//! End-to-end tests for pasted content
//!
//! Content goes through the raw handler, is written as a document and read
//! back; what comes back must be valid and carry the same attributes.

use block_model::library::{HEADING, IMAGE, LIST, PARAGRAPH, QUOTE, SEPARATOR, SHORTCODE, TABLE};
use block_model::{Block, BlockRegistry, parse, serialize};
use block_raw::{RawInput, RawMode, raw_handler};
use pretty_assertions::assert_eq;

fn paste(registry: &BlockRegistry, input: RawInput) -> Vec<Block> {
    raw_handler(registry, &input)
        .into_blocks()
        .expect("pasted content should become blocks")
}

fn assert_survives_round_trip(registry: &BlockRegistry, blocks: &[Block]) {
    let document = serialize(registry, blocks);
    let reparsed = parse(registry, &document);
    assert_eq!(reparsed.len(), blocks.len(), "{document}");
    for (before, after) in blocks.iter().zip(&reparsed) {
        assert!(after.is_valid(), "{} is invalid in:\n{document}\n{:?}", after.name(), after.validation_issues());
        assert_eq!(after.name(), before.name());
        assert_eq!(after.attributes(), before.attributes());
    }
}

#[test]
fn test_rich_page_survives_round_trip() {
    let registry = BlockRegistry::with_builtins();
    let html = concat!(
        "<h2>Results</h2>",
        "<p>We measured <b>three</b> things.</p>",
        "<ul><li>Speed</li><li>Memory</li></ul>",
        "<blockquote>Worth it.</blockquote>",
        "<hr>",
        "<p><img src=\"https://example.com/chart.png\" alt=\"Chart\"></p>",
        "<table><tr><th>Run</th></tr><tr><td>1</td></tr></table>",
    );
    let blocks = paste(&registry, RawInput::html(html));
    let names: Vec<&str> = blocks.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec![HEADING, PARAGRAPH, LIST, QUOTE, SEPARATOR, IMAGE, TABLE]);
    assert_survives_round_trip(&registry, &blocks);
}

#[test]
fn test_markdown_survives_round_trip() {
    let registry = BlockRegistry::with_builtins();
    let markdown = "# Plan\n\nShip the *parser* first.\n\n1. Grammar\n2. Model\n\n> Keep it simple\n\n---\n";
    let blocks = paste(&registry, RawInput::plain_text(markdown));
    let names: Vec<&str> = blocks.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec![HEADING, PARAGRAPH, LIST, QUOTE, SEPARATOR]);
    assert_survives_round_trip(&registry, &blocks);
}

#[test]
fn test_shortcode_block_survives_round_trip() {
    let registry = BlockRegistry::with_builtins();
    let blocks = paste(&registry, RawInput::html("<p>Before</p>\n[newsletter id=\"4\"]\n<p>After</p>"));
    let names: Vec<&str> = blocks.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec![PARAGRAPH, SHORTCODE, PARAGRAPH]);
    assert_survives_round_trip(&registry, &blocks);
}

#[test]
fn test_repasting_a_document_keeps_its_blocks() {
    let registry = BlockRegistry::with_builtins();
    let first = paste(&registry, RawInput::html("<h3>Title</h3><p>Body <em>text</em></p>"));
    let document = serialize(&registry, &first);

    let second = paste(&registry, RawInput::html(document).with_mode(RawMode::Blocks));
    assert_eq!(second.len(), first.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.attributes(), b.attributes());
    }
}

#[test]
fn test_google_docs_wrapper_is_dropped() {
    let registry = BlockRegistry::with_builtins();
    let html = "<b style=\"font-weight:normal;\" id=\"docs-internal-guid-1234\"><p>First</p><p>Second</p></b>";
    let blocks = paste(&registry, RawInput::html(html));
    let contents: Vec<&str> = blocks
        .iter()
        .filter_map(|b| b.attribute("content").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(contents, vec!["First", "Second"]);
}
