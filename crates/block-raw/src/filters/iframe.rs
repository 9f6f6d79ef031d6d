use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter};

/// Replaces embedded frames with their address unless unfiltered HTML is
/// allowed.
#[derive(Debug, Default)]
pub struct IframeRemover;

impl NodeFilter for IframeRemover {
    fn name(&self) -> &'static str {
        "iframe"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, context: &FilterContext<'_>) {
        if context.allow_unfiltered_html || !tree.is_tag(node, "iframe") {
            return;
        }
        let src = tree.attr(node, "src").unwrap_or_default().to_string();
        let text = tree.create_text(src);
        tree.replace(node, text);
    }
}
