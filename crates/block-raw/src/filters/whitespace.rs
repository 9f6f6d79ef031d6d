//! Formatting whitespace and trailing line breaks

use block_html::{NodeId, Tree};
use regex::Regex;
use std::sync::LazyLock;

use crate::filter::{FilterContext, NodeFilter, phrasing_sibling};

static FORMATTING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \r\n\t]+").expect("Invalid whitespace regex"));

fn is_formatting_space(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n' | '\t')
}

/// Collapses source formatting whitespace in text outside `pre`.
///
/// Runs of spaces, tabs and newlines become one space. A leading space is
/// dropped at the start of a block, after a `br` or after text that already
/// ends in a space; a trailing space likewise at the end of a block, before
/// a `br` or before text starting with whitespace. Text left empty is
/// removed.
#[derive(Debug, Default)]
pub struct HtmlFormattingRemover;

impl NodeFilter for HtmlFormattingRemover {
    fn name(&self) -> &'static str {
        "formatting"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        let Some(text) = tree.text(node).filter(|_| tree.is_text(node)) else {
            return;
        };
        if tree.ancestors(node).into_iter().any(|id| tree.is_tag(id, "pre")) {
            return;
        }

        let mut data = FORMATTING_SPACE.replace_all(text, " ").into_owned();

        if data.starts_with(' ') {
            let drop = match phrasing_sibling(tree, node, false) {
                None => true,
                Some(prev) => tree.is_tag(prev, "br") || tree.text_content(prev).ends_with(' '),
            };
            if drop {
                data.remove(0);
            }
        }

        if data.ends_with(' ') {
            let drop = match phrasing_sibling(tree, node, true) {
                None => true,
                Some(next) => {
                    tree.is_tag(next, "br")
                        || (tree.is_text(next)
                            && tree.text(next).and_then(|t| t.chars().next()).is_some_and(is_formatting_space))
                }
            };
            if drop {
                data.pop();
            }
        }

        if data.is_empty() {
            tree.remove(node);
        } else {
            tree.set_text(node, data);
        }
    }
}

/// Drops a `br` that ends its block.
#[derive(Debug, Default)]
pub struct BrRemover;

impl NodeFilter for BrRemover {
    fn name(&self) -> &'static str {
        "br"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.is_tag(node, "br") && phrasing_sibling(tree, node, true).is_none() {
            tree.remove(node);
        }
    }
}

/// Drops paragraphs without any child nodes.
#[derive(Debug, Default)]
pub struct EmptyParagraphRemover;

impl NodeFilter for EmptyParagraphRemover {
    fn name(&self) -> &'static str {
        "empty-paragraph"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.is_tag(node, "p") && !tree.has_children(node) {
            tree.remove(node);
        }
    }
}

/// Turns Slack's paragraph-break spans into a double line break.
#[derive(Debug, Default)]
pub struct SlackParagraphCorrector;

impl NodeFilter for SlackParagraphCorrector {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if !tree.is_tag(node, "span") || tree.attr(node, "data-stringify-type") != Some("paragraph-break") {
            return;
        }
        for _ in 0..2 {
            let br = tree.create_element("br");
            tree.insert_before(node, br);
        }
        tree.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::collapses("<p>\n  Hello\n  world\n</p>", "<p>Hello world</p>")]
    #[case::between_elements("<p><strong>a</strong>\n<em>b</em></p>", "<p><strong>a</strong> <em>b</em></p>")]
    #[case::after_break("<p>a<br>\n b</p>", "<p>a<br>b</p>")]
    #[case::pre_untouched("<pre>  keep\n  this</pre>", "<pre>  keep\n  this</pre>")]
    #[case::formatting_only("<ul>\n  <li>x</li>\n</ul>", "<ul><li>x</li></ul>")]
    fn test_formatting_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(run(&HtmlFormattingRemover, input), expected);
    }

    #[test]
    fn test_trailing_break_removed() {
        assert_eq!(run(&BrRemover, "<p>a<br>b<br></p>"), "<p>a<br>b</p>");
    }

    #[test]
    fn test_empty_paragraph_removed() {
        assert_eq!(run(&EmptyParagraphRemover, "<p></p><p>x</p><p> </p>"), "<p>x</p><p> </p>");
    }

    #[test]
    fn test_slack_break() {
        assert_eq!(
            run(&SlackParagraphCorrector, r#"a<span data-stringify-type="paragraph-break"></span>b"#),
            "a<br><br>b"
        );
    }
}
