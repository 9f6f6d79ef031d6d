//! `[shortcode]` recognition.
//!
//! Shortcodes come in three shapes:
//! ```text
//! [gallery ids="1,2,3"]              single
//! [gallery ids="1,2,3" /]            self-closing
//! [caption align="left"]text[/caption] closed
//! ```
//! A doubled bracket (`[[gallery]]`) escapes the shortcode and is skipped.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Attribute syntax: `name="v"`, `name='v'`, `name=v`, `"v"` or a bare `v`.
static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([\w-]+)\s*=\s*"([^"]*)"(?:\s|$)|([\w-]+)\s*=\s*'([^']*)'(?:\s|$)|([\w-]+)\s*=\s*([^\s'"]+)(?:\s|$)|"([^"]*)"(?:\s|$)|(\S+)(?:\s|$)"#,
    )
    .expect("Invalid shortcode attribute regex")
});

/// How a shortcode was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortcodeKind {
    Single,
    SelfClosing,
    Closed,
}

/// Named and positional shortcode attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShortcodeAttrs {
    /// Named attributes, keys lowercased.
    pub named: BTreeMap<String, String>,
    /// Positional attributes in order of appearance.
    pub numeric: Vec<String>,
}

impl ShortcodeAttrs {
    /// Parses the text between the tag name and the closing bracket.
    pub fn parse(text: &str) -> Self {
        let text = text.replace(['\u{00a0}', '\u{200b}'], " ");
        let mut attrs = Self::default();

        for caps in ATTR_REGEX.captures_iter(&text) {
            let pair = |k: usize, v: usize| {
                caps.get(k)
                    .zip(caps.get(v))
                    .map(|(k, v)| (k.as_str().to_lowercase(), v.as_str().to_string()))
            };
            if let Some((key, value)) = pair(1, 2).or_else(|| pair(3, 4)).or_else(|| pair(5, 6)) {
                attrs.named.insert(key, value);
            } else if let Some(value) = caps.get(7).or_else(|| caps.get(8)) {
                attrs.numeric.push(value.as_str().to_string());
            }
        }
        attrs
    }

    /// Looks up a named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.numeric.is_empty()
    }
}

impl fmt::Display for ShortcodeAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.named {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}=\"{value}\"")?;
            first = false;
        }
        for value in &self.numeric {
            if !first {
                f.write_str(" ")?;
            }
            if value.contains(char::is_whitespace) {
                write!(f, "\"{value}\"")?;
            } else {
                f.write_str(value)?;
            }
            first = false;
        }
        Ok(())
    }
}

/// A parsed shortcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortcode {
    pub tag: String,
    pub attrs: ShortcodeAttrs,
    pub kind: ShortcodeKind,
    /// Enclosed content of a closed shortcode.
    pub content: Option<String>,
}

impl fmt::Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.tag)?;
        if !self.attrs.is_empty() {
            write!(f, " {}", self.attrs)?;
        }
        match self.kind {
            ShortcodeKind::SelfClosing => f.write_str(" /]"),
            ShortcodeKind::Single => f.write_str("]"),
            ShortcodeKind::Closed => write!(
                f,
                "]{}[/{}]",
                self.content.as_deref().unwrap_or_default(),
                self.tag
            ),
        }
    }
}

/// A shortcode found in a larger text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcodeMatch {
    /// Byte offset of the match in the searched text.
    pub index: usize,
    /// The matched text.
    pub content: String,
    pub shortcode: Shortcode,
}

/// Finds the next unescaped `tag` shortcode at or after byte offset `from`.
///
/// # Example
/// ```
/// use block_grammar::shortcode::next;
///
/// let found = next("gallery", "Intro [gallery ids=\"1,2\"] outro", 0).unwrap();
/// assert_eq!(found.index, 6);
/// assert_eq!(found.content, "[gallery ids=\"1,2\"]");
/// assert_eq!(found.shortcode.attrs.get("ids"), Some("1,2"));
/// ```
pub fn next(tag: &str, text: &str, from: usize) -> Option<ShortcodeMatch> {
    let mut search = from;
    while let Some(rel) = text.get(search..)?.find('[') {
        let open = search + rel;
        search = open + 1;

        let Some(raw) = scan_at(tag, text, open) else {
            continue;
        };
        if raw.escaped_open && raw.escaped_close {
            search = raw.end;
            continue;
        }

        let mut start = open;
        let mut end = raw.end;
        if raw.escaped_open {
            start += 1;
        }
        if raw.escaped_close {
            end -= 1;
        }
        return Some(ShortcodeMatch {
            index: start,
            content: text[start..end].to_string(),
            shortcode: raw.shortcode,
        });
    }
    None
}

/// Replaces every `tag` shortcode in `text` with the callback's output.
///
/// Returning `None` from the callback keeps the shortcode as written.
pub fn replace(
    tag: &str,
    text: &str,
    mut callback: impl FnMut(&ShortcodeMatch) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = next(tag, text, cursor) {
        out.push_str(&text[cursor..found.index]);
        match callback(&found) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(&found.content),
        }
        cursor = found.index + found.content.len();
    }
    out.push_str(&text[cursor..]);
    out
}

struct RawMatch {
    escaped_open: bool,
    escaped_close: bool,
    end: usize,
    shortcode: Shortcode,
}

/// Tries to read a `tag` shortcode starting at the `[` at byte `open`.
fn scan_at(tag: &str, text: &str, open: usize) -> Option<RawMatch> {
    let mut pos = open + 1;
    let escaped_open = text[pos..].starts_with('[');
    if escaped_open {
        pos += 1;
    }
    if tag.is_empty() || !text[pos..].starts_with(tag) {
        return None;
    }
    pos += tag.len();

    // The tag must end here: `[gallery-x]` is not `[gallery]`.
    if text[pos..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }

    let attrs_start = pos;
    let bracket = pos + text[pos..].find(']')?;
    let attrs_text = &text[attrs_start..bracket];

    // `[` inside the attribute text means this is not one shortcode.
    if attrs_text.contains('[') {
        return None;
    }

    let (kind, attrs_text, content, mut end) = if let Some(attrs) = attrs_text.strip_suffix('/') {
        (ShortcodeKind::SelfClosing, attrs, None, bracket + 1)
    } else {
        let body_start = bracket + 1;
        let closer = format!("[/{tag}]");
        match text[body_start..].find(&closer) {
            Some(rel) => (
                ShortcodeKind::Closed,
                attrs_text,
                Some(text[body_start..body_start + rel].to_string()),
                body_start + rel + closer.len(),
            ),
            None => (ShortcodeKind::Single, attrs_text, None, body_start),
        }
    };

    let escaped_close = text[end..].starts_with(']');
    if escaped_close {
        end += 1;
    }

    Some(RawMatch {
        escaped_open,
        escaped_close,
        end,
        shortcode: Shortcode {
            tag: tag.to_string(),
            attrs: ShortcodeAttrs::parse(attrs_text),
            kind,
            content,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_single_shortcode() {
        let found = next("gallery", "[gallery ids=\"1,2,3\"]", 0).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.shortcode.kind, ShortcodeKind::Single);
        assert_eq!(found.shortcode.attrs.get("ids"), Some("1,2,3"));
    }

    #[test]
    fn test_self_closing_shortcode() {
        let found = next("video", "x [video src=a.mp4 /] y", 0).unwrap();
        assert_eq!(found.content, "[video src=a.mp4 /]");
        assert_eq!(found.shortcode.kind, ShortcodeKind::SelfClosing);
        assert_eq!(found.shortcode.attrs.get("src"), Some("a.mp4"));
    }

    #[test]
    fn test_closed_shortcode() {
        let found = next("caption", "[caption align='left']Hello[/caption]", 0).unwrap();
        assert_eq!(found.shortcode.kind, ShortcodeKind::Closed);
        assert_eq!(found.shortcode.content.as_deref(), Some("Hello"));
        assert_eq!(found.shortcode.attrs.get("align"), Some("left"));
    }

    #[test]
    fn test_escaped_shortcode_is_skipped() {
        assert!(next("gallery", "[[gallery]]", 0).is_none());
        let found = next("gallery", "[[gallery]] [gallery]", 0).unwrap();
        assert_eq!(found.index, 12);
    }

    #[rstest]
    #[case("[gallery-x]")]
    #[case("[galleryx]")]
    #[case("gallery")]
    fn test_other_tags_do_not_match(#[case] text: &str) {
        assert!(next("gallery", text, 0).is_none());
    }

    #[test]
    fn test_positional_attributes() {
        let attrs = ShortcodeAttrs::parse(" 100 \"two words\" Key=v");
        assert_eq!(attrs.numeric, vec!["100".to_string(), "two words".to_string()]);
        assert_eq!(attrs.get("key"), Some("v"));
    }

    #[test]
    fn test_replace() {
        let out = replace("b", "a [b] c [b x=1] d", |m| {
            Some(format!("<{}>", m.shortcode.attrs.get("x").unwrap_or("-")))
        });
        assert_eq!(out, "a <-> c <1> d");
    }

    #[test]
    fn test_display_round_trip() {
        let found = next("caption", "[caption align=\"left\"]Hi[/caption]", 0).unwrap();
        assert_eq!(found.shortcode.to_string(), "[caption align=\"left\"]Hi[/caption]");
    }
}
