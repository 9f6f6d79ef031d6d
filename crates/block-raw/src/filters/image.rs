//! Image artifacts

use block_html::{NodeId, Tree};

use crate::filter::{FilterContext, NodeFilter};

/// Whether a `data:` URL names a media type and carries a payload.
fn is_valid_data_url(src: &str) -> bool {
    let Some((properties, data)) = src.split_once(',') else {
        return false;
    };
    let media_type = properties
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or_default();
    !media_type.is_empty() && !data.is_empty()
}

/// Drops images that cannot be shown: local file references, malformed
/// inline data and one-pixel trackers.
#[derive(Debug, Default)]
pub struct ImageCorrector;

impl NodeFilter for ImageCorrector {
    fn name(&self) -> &'static str {
        "image"
    }

    fn apply(&self, tree: &mut Tree, node: NodeId, _context: &FilterContext<'_>) {
        if !tree.is_tag(node, "img") {
            return;
        }
        let src = tree.attr(node, "src").unwrap_or_default();
        let dead = src.starts_with("file:") || (src.starts_with("data:") && !is_valid_data_url(src));
        let tracker = tree.attr(node, "width") == Some("1") || tree.attr(node, "height") == Some("1");
        if dead || tracker {
            tree.remove(node);
        }
    }
}
