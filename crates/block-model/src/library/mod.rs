//! Built-in block types.

mod fallback;
mod media;
mod table;
mod text;

use crate::attribute::Attributes;
use crate::registry::BlockType;
use crate::source::get_block_attributes;
use crate::transform::RawTransformContext;
use html_escape::encode_double_quoted_attribute;
use serde_json::Value;

pub const PARAGRAPH: &str = "core/paragraph";
pub const HEADING: &str = "core/heading";
pub const LIST: &str = "core/list";
pub const QUOTE: &str = "core/quote";
pub const CODE: &str = "core/code";
pub const PREFORMATTED: &str = "core/preformatted";
pub const IMAGE: &str = "core/image";
pub const SEPARATOR: &str = "core/separator";
pub const TABLE: &str = "core/table";
pub const HTML: &str = "core/html";
pub const FREEFORM: &str = "core/freeform";
pub const MISSING: &str = "core/missing";
pub const SHORTCODE: &str = "core/shortcode";

/// Number of built-in block types.
pub const BUILTIN_COUNT: usize = 13;

/// Returns all built-in block types in registration order.
pub fn builtin_block_types() -> Vec<BlockType> {
    vec![
        text::paragraph(),
        text::heading(),
        text::list(),
        text::quote(),
        media::image(),
        media::separator(),
        text::code(),
        text::preformatted(),
        table::table(),
        fallback::html(),
        fallback::freeform(),
        fallback::missing(),
        fallback::shortcode(),
    ]
}

pub(crate) fn str_attr<'a>(attrs: &'a Attributes, key: &str) -> &'a str {
    attrs.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn bool_attr(attrs: &Attributes, key: &str) -> bool {
    attrs.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn int_attr(attrs: &Attributes, key: &str) -> Option<i64> {
    attrs
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

/// ` class="..."` for the non-empty classes, or nothing.
pub(crate) fn class_list(classes: impl IntoIterator<Item = Option<String>>) -> String {
    let classes: Vec<String> = classes.into_iter().flatten().filter(|c| !c.is_empty()).collect();
    if classes.is_empty() {
        return String::new();
    }
    format!(" class=\"{}\"", encode_double_quoted_attribute(&classes.join(" ")))
}

/// ` name="value"` when the value is non-empty.
pub(crate) fn html_attr(name: &str, value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    format!(" {name}=\"{}\"", encode_double_quoted_attribute(value))
}

/// Attributes of `name` sourced from the element's outer HTML.
pub(crate) fn sourced_attributes(context: &RawTransformContext<'_>, name: &str) -> Attributes {
    let html = context.tree.outer_html(context.node);
    context
        .registry
        .get(name)
        .map(|block_type| get_block_attributes(&block_type.attributes, &html, &Attributes::new()))
        .unwrap_or_default()
}

/// Inner HTML of each top-level `tag` element in a fragment.
pub(crate) fn child_html(html: &str, tag: &str) -> Vec<String> {
    let tree = block_html::Tree::parse_fragment(html);
    tree.children(tree.root())
        .into_iter()
        .filter(|id| tree.is_tag(*id, tag))
        .map(|id| tree.inner_html(id))
        .collect()
}

pub(crate) fn attrs_from<const N: usize>(pairs: [(&str, Value); N]) -> Attributes {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
