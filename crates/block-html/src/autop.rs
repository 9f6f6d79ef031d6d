//! Paragraph insertion for hand-written HTML.
//!
//! Turns double line breaks into `<p>` paragraphs and, optionally, single line
//! breaks into `<br />`, leaving block-level markup and `<pre>` content alone.

use regex::{Captures, Regex};
use std::sync::LazyLock;

const ALL_BLOCKS: &str = "(?:table|thead|tfoot|caption|col|colgroup|tbody|tr|td|th|div|dl|dd|dt|ul|ol|li|pre|form|map|area|blockquote|address|math|style|p|h[1-6]|hr|fieldset|legend|section|article|aside|hgroup|header|footer|nav|figure|figcaption|details|menu|summary)";

fn block_regex(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("ALL_BLOCKS", ALL_BLOCKS)).expect("Invalid autop regex")
}

static PRE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<pre[^>]*>.*?</pre>").expect("Invalid autop regex"));
static PRE_PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<pre wp-pre-tag-(\d+)></pre>").expect("Invalid autop regex"));
static DOUBLE_BR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>\s*<br\s*/?>").expect("Invalid autop regex"));
static BLOCK_OPEN_REGEX: LazyLock<Regex> = LazyLock::new(|| block_regex(r"(<ALL_BLOCKS[\s/>])"));
static BLOCK_CLOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| block_regex(r"(</ALL_BLOCKS>)"));
static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("Invalid autop regex"));
static EMPTY_P_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*</p>").expect("Invalid autop regex"));
static UNCLOSED_P_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>([^<]+)</(div|address|form)>").expect("Invalid autop regex")
});
static P_AROUND_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| block_regex(r"<p>\s*(</?ALL_BLOCKS[^>]*>)\s*</p>"));
static P_AROUND_LI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>(<li.+?)</p>").expect("Invalid autop regex"));
static P_BLOCKQUOTE_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p><blockquote([^>]*)>").expect("Invalid autop regex"));
static P_BEFORE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| block_regex(r"<p>\s*(</?ALL_BLOCKS[^>]*>)"));
static P_AFTER_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| block_regex(r"(</?ALL_BLOCKS[^>]*>)\s*</p>"));
static BR_VARIANTS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br>|<br/>").expect("Invalid autop regex"));
static NEWLINE_TO_BR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<br />)?\s*\n").expect("Invalid autop regex"));
static BR_AFTER_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| block_regex(r"(</?ALL_BLOCKS[^>]*>)\s*<br />"));
static BR_BEFORE_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<br />(\s*</?(?:p|li|div|dl|dd|dt|th|pre|td|ul|ol)[^>]*>)")
        .expect("Invalid autop regex")
});

/// Wraps loose text in paragraphs.
///
/// With `br`, remaining single newlines inside paragraphs become `<br />`.
/// Returns an empty string for whitespace-only input.
///
/// # Example
/// ```
/// use block_html::autop;
///
/// assert_eq!(autop("One\n\nTwo", true), "<p>One</p>\n<p>Two</p>");
/// assert_eq!(autop("a\nb", true), "<p>a<br />\nb</p>");
/// ```
pub fn autop(text: &str, br: bool) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut text = format!("{text}\n");

    let mut pre_tags: Vec<String> = Vec::new();
    if text.contains("<pre") {
        text = PRE_REGEX
            .replace_all(&text, |caps: &Captures<'_>| {
                let placeholder = format!("<pre wp-pre-tag-{}></pre>", pre_tags.len());
                pre_tags.push(caps[0].to_string());
                placeholder
            })
            .into_owned();
    }

    text = DOUBLE_BR_REGEX.replace_all(&text, "\n\n").into_owned();
    text = BLOCK_OPEN_REGEX.replace_all(&text, "\n\n$1").into_owned();
    text = BLOCK_CLOSE_REGEX.replace_all(&text, "$1\n\n").into_owned();
    text = text.replace("\r\n", "\n").replace('\r', "\n");
    text = BLANK_LINES_REGEX.replace_all(&text, "\n\n").into_owned();

    let mut out = String::new();
    for chunk in text.split("\n\n") {
        let trimmed = chunk.trim_matches('\n');
        if trimmed.trim().is_empty() {
            continue;
        }
        out.push_str("<p>");
        out.push_str(trimmed);
        out.push_str("</p>\n");
    }
    let mut text = out;

    text = EMPTY_P_REGEX.replace_all(&text, "").into_owned();
    text = UNCLOSED_P_REGEX.replace_all(&text, "<p>$1</p></$2>").into_owned();
    text = P_AROUND_BLOCK_REGEX.replace_all(&text, "$1").into_owned();
    text = P_AROUND_LI_REGEX.replace_all(&text, "$1").into_owned();
    text = P_BLOCKQUOTE_OPEN_REGEX
        .replace_all(&text, "<blockquote$1><p>")
        .into_owned();
    text = text.replace("</blockquote></p>", "</p></blockquote>");
    text = P_BEFORE_BLOCK_REGEX.replace_all(&text, "$1").into_owned();
    text = P_AFTER_BLOCK_REGEX.replace_all(&text, "$1").into_owned();

    if br {
        text = BR_VARIANTS_REGEX.replace_all(&text, "<br />").into_owned();
        text = NEWLINE_TO_BR_REGEX
            .replace_all(&text, |caps: &Captures<'_>| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    "<br />\n".to_string()
                }
            })
            .into_owned();
    }

    text = BR_AFTER_BLOCK_REGEX.replace_all(&text, "$1").into_owned();
    text = BR_BEFORE_TAG_REGEX.replace_all(&text, "$1").into_owned();

    if !pre_tags.is_empty() {
        text = PRE_PLACEHOLDER_REGEX
            .replace_all(&text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| pre_tags.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned();
    }

    text.trim_end().to_string()
}
