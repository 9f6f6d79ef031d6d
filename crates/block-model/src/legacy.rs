//! Renames of block types that no longer exist under their old names.

use crate::attribute::Attributes;
use serde_json::Value;
use tracing::debug;

const RENAMED: &[(&str, &str)] = &[
    ("core/cover-image", "core/cover"),
    ("core/text", "core/paragraph"),
    ("core/cover-text", "core/paragraph"),
    ("core/comments-query-loop", "core/comments"),
    ("core/post-comment-author", "core/comment-author-name"),
    ("core/post-comment-content", "core/comment-content"),
    ("core/post-comment-date", "core/comment-date"),
];

const SOCIAL_LINK_PREFIX: &str = "core/social-link-";

/// Maps a legacy block name and its header attributes to the current ones.
///
/// Names that were never renamed come back unchanged.
///
/// # Example
/// ```
/// use block_model::{Attributes, convert_legacy_block};
/// use serde_json::json;
///
/// let (name, attrs) = convert_legacy_block("core/social-link-wordpress", Attributes::new());
/// assert_eq!(name, "core/social-link");
/// assert_eq!(attrs["service"], json!("wordpress"));
/// ```
pub fn convert_legacy_block(name: &str, mut attributes: Attributes) -> (String, Attributes) {
    if let Some((_, current)) = RENAMED.iter().find(|(old, _)| *old == name) {
        debug!(from = name, to = current, "Converted legacy block name");
        return (current.to_string(), attributes);
    }

    if let Some(service) = name.strip_prefix(SOCIAL_LINK_PREFIX).filter(|s| !s.is_empty()) {
        attributes.insert("service".to_string(), Value::String(service.to_string()));
        debug!(from = name, "Converted legacy social link block");
        return ("core/social-link".to_string(), attributes);
    }

    (name.to_string(), attributes)
}
