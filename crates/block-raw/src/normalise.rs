//! Paragraph structure for loose content.

use block_html::Tree;

use crate::filter::{is_empty, is_phrasing_node};

/// Wraps top-level text and inline elements in paragraphs.
///
/// Consecutive inline content shares a paragraph; a double `br` starts a
/// new one. Empty paragraphs and whitespace-only text are dropped, as is a
/// `br` that would open a paragraph. Block elements pass through.
///
/// # Example
/// ```
/// use block_raw::normalise_blocks;
///
/// assert_eq!(
///     normalise_blocks("One<br><br>Two<h2>Title</h2>"),
///     "<p>One</p><p>Two</p><h2>Title</h2>"
/// );
/// ```
pub fn normalise_blocks(html: &str) -> String {
    let mut tree = Tree::parse_fragment(html);
    let source = tree.root();
    let output = tree.create_element("body");

    while let Some(node) = tree.first_child(source) {
        let last_paragraph = tree.last_child(output).filter(|last| tree.is_tag(*last, "p"));

        if tree.is_text(node) {
            if is_empty(&tree, node) {
                tree.remove(node);
                continue;
            }
            let paragraph = last_paragraph.unwrap_or_else(|| append_paragraph(&mut tree, output));
            tree.append(paragraph, node);
        } else if tree.is_tag(node, "br") {
            if let Some(next) = tree.next_sibling(node).filter(|next| tree.is_tag(*next, "br")) {
                append_paragraph(&mut tree, output);
                tree.remove(next);
            }
            let open = tree
                .last_child(output)
                .filter(|last| tree.is_tag(*last, "p") && tree.has_children(*last));
            match open {
                Some(paragraph) => tree.append(paragraph, node),
                None => tree.remove(node),
            }
        } else if tree.is_tag(node, "p") {
            if is_empty(&tree, node) {
                tree.remove(node);
            } else {
                tree.append(output, node);
            }
        } else if tree.is_element(node) {
            if is_phrasing_node(&tree, node) {
                let paragraph = last_paragraph.unwrap_or_else(|| append_paragraph(&mut tree, output));
                tree.append(paragraph, node);
            } else {
                tree.append(output, node);
            }
        } else {
            tree.remove(node);
        }
    }

    tree.inner_html(output)
}

fn append_paragraph(tree: &mut Tree, parent: block_html::NodeId) -> block_html::NodeId {
    let paragraph = tree.create_element("p");
    tree.append(parent, paragraph);
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::text("Hello", "<p>Hello</p>")]
    #[case::inline_run("a <em>b</em> c", "<p>a <em>b</em> c</p>")]
    #[case::single_break("a<br>b", "<p>a<br>b</p>")]
    #[case::double_break("a<br><br>b", "<p>a</p><p>b</p>")]
    #[case::leading_break("<br>a", "<p>a</p>")]
    #[case::block_between("a<ul><li>x</li></ul>b", "<p>a</p><ul><li>x</li></ul><p>b</p>")]
    #[case::empty_paragraph("<p> </p><p>x</p>", "<p>x</p>")]
    #[case::whitespace_text("\n<h2>T</h2>\n", "<h2>T</h2>")]
    #[case::comment("<!-- c --><p>x</p>", "<p>x</p>")]
    fn test_normalise_blocks(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalise_blocks(input), expected);
    }

    #[test]
    fn test_normalise_is_idempotent() {
        let once = normalise_blocks("a<br><br>b<em>c</em><p>d</p>e");
        assert_eq!(normalise_blocks(&once), once);
    }
}
