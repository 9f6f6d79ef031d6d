//! Google Docs clipboard wrapper

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter};

const GUID_PREFIX: &str = "docs-internal-guid-";

/// Removes the internal id Google Docs puts on pasted content, and the bold
/// wrapper it sometimes uses to carry it.
#[derive(Debug, Default)]
pub struct GoogleDocsFilter;

impl NodeFilter for GoogleDocsFilter {
    fn name(&self) -> &'static str {
        "google-docs"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        let is_guid = tree.attr(node, "id").is_some_and(|id| id.starts_with(GUID_PREFIX));
        if !is_guid {
            return;
        }
        if tree.is_tag(node, "b") {
            tree.unwrap(node);
        } else {
            tree.remove_attr(node, "id");
        }
    }
}
