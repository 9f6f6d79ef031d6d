//! Block delimiter writing.
//!
//! The inverse of [`crate::parser`]: turns a name, header attributes and
//! inner markup back into comment-delimited text.

use crate::error::{Error, Result};
use crate::parser::{BlockNode, DEFAULT_NAMESPACE, InnerContent};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static NEWLINE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("Invalid newline regex"));

/// Encodes header attributes as JSON that is safe inside an HTML comment.
///
/// `--`, `<`, `>` and `&` are written as unicode escapes so that the JSON can
/// neither end the comment early nor be mistaken for markup. Quotes are left
/// alone; the result still decodes to the same object.
///
/// # Example
/// ```
/// use serde_json::json;
/// use block_grammar::serialize_attributes;
///
/// let attrs = json!({"content": "a -- <b>"});
/// let encoded = serialize_attributes(attrs.as_object().unwrap());
/// assert_eq!(encoded, r#"{"content":"a \u002d\u002d \u003cb\u003e"}"#);
/// ```
pub fn serialize_attributes(attributes: &Map<String, Value>) -> String {
    // Serializing a map of JSON values cannot fail.
    let json = serde_json::to_string(attributes).unwrap_or_else(|_| "{}".to_string());
    json.replace("--", "\\u002d\\u002d")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Encodes header attributes, or returns `None` when there are none to write.
pub fn encode_attributes(attributes: &Map<String, Value>) -> Option<String> {
    (!attributes.is_empty()).then(|| serialize_attributes(attributes))
}

/// Decodes header JSON into an attribute map.
pub fn decode_attributes(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::AttributesNotObject {
            found: other.to_string(),
        }),
    }
}

/// Wraps `content` in block delimiters.
///
/// An empty attribute map writes no JSON; empty content writes a void
/// delimiter. Names in the default namespace should already have had it
/// stripped by the caller if a short form is wanted.
///
/// # Example
/// ```
/// use serde_json::Map;
/// use block_grammar::comment_delimited_content;
///
/// assert_eq!(
///     comment_delimited_content("core/separator", &Map::new(), ""),
///     "<!-- wp:core/separator /-->"
/// );
/// assert_eq!(
///     comment_delimited_content("core/paragraph", &Map::new(), "<p>Hi</p>"),
///     "<!-- wp:core/paragraph -->\n<p>Hi</p>\n<!-- /wp:core/paragraph -->"
/// );
/// ```
pub fn comment_delimited_content(
    name: &str,
    attributes: &Map<String, Value>,
    content: &str,
) -> String {
    let attrs = encode_attributes(attributes)
        .map(|json| format!("{json} "))
        .unwrap_or_default();

    if content.is_empty() {
        return format!("<!-- wp:{name} {attrs}/-->");
    }
    format!("<!-- wp:{name} {attrs}-->\n{content}\n<!-- /wp:{name} -->")
}

/// Reproduces a parsed block without consulting any type information.
///
/// With `delimited` the block keeps its comment delimiters (using the
/// original header JSON when it was present); without, only the inner markup
/// is written. Runs of newlines collapse to one and the result is trimmed.
pub fn serialize_raw_block(node: &BlockNode, delimited: bool) -> String {
    let mut blocks = node.inner_blocks.iter();
    let mut parts: Vec<String> = Vec::with_capacity(node.inner_content.len());
    for item in &node.inner_content {
        match item {
            InnerContent::Html(html) => parts.push(html.clone()),
            InnerContent::Block => {
                if let Some(inner) = blocks.next() {
                    parts.push(serialize_raw_block(inner, delimited));
                }
            }
        }
    }
    let content = parts.join("\n");
    let content = NEWLINE_RUN_REGEX.replace_all(&content, "\n");
    let content = content.trim();

    if !delimited {
        return content.to_string();
    }

    let name = if node.implicit_namespace {
        node.name
            .strip_prefix(DEFAULT_NAMESPACE)
            .unwrap_or(&node.name)
    } else {
        &node.name
    };
    let attrs = node
        .attrs_json
        .as_ref()
        .map(|json| format!("{json} "))
        .unwrap_or_default();

    if content.is_empty() && node.self_closing {
        return format!("<!-- wp:{name} {attrs}/-->");
    }
    format!("<!-- wp:{name} {attrs}-->\n{content}\n<!-- /wp:{name} -->")
}
