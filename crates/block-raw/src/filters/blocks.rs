//! Container normalisation

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter, set_inner_html};
use crate::normalise::normalise_blocks;

fn normalise_inner(tree: &mut Tree, node: NodeId) {
    let html = normalise_blocks(&tree.inner_html(node));
    set_inner_html(tree, node, &html);
}

/// Gives the content of a `blockquote` paragraph structure.
#[derive(Debug, Default)]
pub struct BlockquoteNormaliser;

impl NodeFilter for BlockquoteNormaliser {
    fn name(&self) -> &'static str {
        "blockquote"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.is_tag(node, "blockquote") {
            normalise_inner(tree, node);
        }
    }
}

/// Gives the content of a `div` paragraph structure so the div itself can
/// be unwrapped later.
#[derive(Debug, Default)]
pub struct DivNormaliser;

impl NodeFilter for DivNormaliser {
    fn name(&self) -> &'static str {
        "div"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.is_tag(node, "div") {
            normalise_inner(tree, node);
        }
    }
}

/// Collects rows placed directly in a `table` into a `tbody`.
#[derive(Debug, Default)]
pub struct TableNormaliser;

impl NodeFilter for TableNormaliser {
    fn name(&self) -> &'static str {
        "table"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if !tree.is_tag(node, "table") {
            return;
        }
        let rows: Vec<NodeId> = tree
            .children(node)
            .into_iter()
            .filter(|child| tree.is_tag(*child, "tr"))
            .collect();
        let Some(first) = rows.first() else {
            return;
        };
        let body = tree.create_element("tbody");
        tree.insert_before(*first, body);
        for row in rows {
            tree.append(body, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::run;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blockquote_text_becomes_paragraphs() {
        assert_eq!(
            run(&BlockquoteNormaliser, "<blockquote>One<br><br>Two</blockquote>"),
            "<blockquote><p>One</p><p>Two</p></blockquote>"
        );
    }

    #[test]
    fn test_div_content_is_normalised() {
        assert_eq!(
            run(&DivNormaliser, "<div>Loose <em>text</em><p>Para</p></div>"),
            "<div><p>Loose <em>text</em></p><p>Para</p></div>"
        );
    }

    #[test]
    fn test_loose_rows_get_a_body() {
        assert_eq!(
            run(&TableNormaliser, "<table><thead><tr><th>h</th></tr></thead><tr><td>1</td></tr><tr><td>2</td></tr></table>"),
            "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>1</td></tr><tr><td>2</td></tr></tbody></table>"
        );
    }
}
