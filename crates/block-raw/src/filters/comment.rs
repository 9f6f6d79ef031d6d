use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter};

/// Drops HTML comments.
#[derive(Debug, Default)]
pub struct CommentRemover;

impl NodeFilter for CommentRemover {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.is_comment(node) {
            tree.remove(node);
        }
    }
}
