//! Integration tests for parsing, editing and re-serializing trees.

use block_html::{Selector, Tree, autop, tokenize};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_edit_pipeline_on_pasted_markup() {
    let mut tree = Tree::parse_fragment(
        r#"<div class="doc"><p><b>Bold</b> and <span style="color:red">red</span></p><script>x()</script></div>"#,
    );
    let root = tree.root();

    for script in tree.query_all(root, "script") {
        tree.remove(script);
    }
    for b in tree.query_all(root, "b") {
        tree.rename(b, "strong");
    }
    for span in tree.query_all(root, "span") {
        tree.unwrap(span);
    }
    let div = tree.query(root, "div.doc").unwrap();
    tree.unwrap(div);
    tree.normalize(root);

    assert_eq!(tree.to_html(), "<p><strong>Bold</strong> and red</p>");
}

#[test]
fn test_text_content_skips_comments() {
    let tree = Tree::parse_fragment("<p>a<!-- hidden -->b<em>c</em></p>");
    let p = tree.first_child(tree.root()).unwrap();
    assert_eq!(tree.text_content(p), "abc");
}

#[test]
fn test_import_copies_between_trees() {
    let source = Tree::parse_fragment("<figure><img src=\"a.png\"><figcaption>Cap</figcaption></figure>");
    let figure = source.first_child(source.root()).unwrap();

    let mut target = Tree::new();
    let copy = target.import(&source, figure);
    let root = target.root();
    target.append(root, copy);
    assert_eq!(target.to_html(), source.to_html());
}

#[test]
fn test_selector_round_trip_string() {
    let selector: Selector = "ul > li".parse().unwrap();
    assert_eq!(selector.as_str(), "ul > li");
}

#[test]
fn test_tokenize_then_autop_content() {
    let html = autop("First line\nSecond line\n\nNew paragraph", true);
    let tokens = tokenize(&html).unwrap();
    let paragraphs = tokens
        .iter()
        .filter(|t| matches!(t, block_html::Token::StartTag { name, .. } if name == "p"))
        .count();
    assert_eq!(paragraphs, 2);
}

proptest! {
    #[test]
    fn test_parse_fragment_never_panics(s in "\\PC*") {
        let tree = Tree::parse_fragment(&s);
        let _ = tree.to_html();
    }

    #[test]
    fn test_serialization_is_a_fixed_point(s in "[a-c<>/= \"'!&;p-]{0,48}") {
        let once = Tree::parse_fragment(&s).to_html();
        let twice = Tree::parse_fragment(&once).to_html();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_selector_parse_never_panics(s in "\\PC{0,24}") {
        let _ = Selector::parse(&s);
    }

    #[test]
    fn test_autop_never_panics(s in "\\PC*") {
        let _ = autop(&s, true);
    }
}
