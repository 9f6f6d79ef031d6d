//! Document head and script content

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter};

const REMOVED: &[&str] = &["head", "link", "meta", "noscript", "script", "style", "template", "title"];

/// Drops elements that never carry visible content.
#[derive(Debug, Default)]
pub struct HeadRemover;

impl NodeFilter for HeadRemover {
    fn name(&self) -> &'static str {
        "head"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if tree.tag_name(node).is_some_and(|tag| REMOVED.contains(&tag)) {
            tree.remove(node);
        }
    }
}
