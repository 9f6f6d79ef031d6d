//! The raw handler: pasted or imported content to blocks or inline markup.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use block_model::library::FREEFORM;
use block_model::{Block, BlockRegistry, ContentSchema, parse};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clean::remove_invalid_html;
use crate::convert::html_to_blocks;
use crate::error::Error;
use crate::filter::{FilterContext, deep_filter_html};
use crate::filters::{BLOCK_FILTERS, CLEANUP_FILTERS, PRE_FILTERS};
use crate::inline::{filter_inline_html, is_inline_content};
use crate::markdown::{is_plain, markdown_to_html};
use crate::normalise::normalise_blocks;
use crate::schema::{block_content_schema, paste_schema};
use crate::shortcode::{Piece, segment_shortcodes};

static META_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<meta[^>]+>").expect("Invalid meta regex"));

static FRAGMENT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*<html[^>]*>\s*<body[^>]*>(?:\s*<!--\s*StartFragment\s*-->)?")
        .expect("Invalid fragment start regex")
});

static FRAGMENT_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:<!--\s*EndFragment\s*-->\s*)?</body>\s*</html>\s*$").expect("Invalid fragment end regex")
});

const BLOCK_DELIMITER: &str = "<!-- wp:";

/// How the raw handler shapes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawMode {
    /// Inline markup when the content fits inside a block, blocks otherwise.
    #[default]
    Auto,
    /// Always inline markup.
    Inline,
    /// Always blocks.
    Blocks,
}

impl FromStr for RawMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(RawMode::Auto),
            "inline" => Ok(RawMode::Inline),
            "blocks" | "block" => Ok(RawMode::Blocks),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for RawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawMode::Auto => write!(f, "auto"),
            RawMode::Inline => write!(f, "inline"),
            RawMode::Blocks => write!(f, "blocks"),
        }
    }
}

/// Content handed to [`raw_handler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInput {
    pub html: String,
    /// Plain-text flavor of the same content, as clipboards provide it.
    pub plain_text: Option<String>,
    pub mode: RawMode,
    /// Tag of the element the content is inserted into, for inline checks.
    pub target_tag: Option<String>,
    /// Keeps iframes that would otherwise be dropped.
    pub allow_unfiltered_html: bool,
}

impl RawInput {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            plain_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_plain_text(mut self, text: impl Into<String>) -> Self {
        self.plain_text = Some(text.into());
        self
    }

    pub fn with_mode(mut self, mode: RawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target_tag(mut self, tag: impl Into<String>) -> Self {
        self.target_tag = Some(tag.into());
        self
    }

    pub fn with_unfiltered_html(mut self, allow: bool) -> Self {
        self.allow_unfiltered_html = allow;
        self
    }
}

/// What [`raw_handler`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Markup to insert inside an existing block.
    Inline(String),
    Blocks(Vec<Block>),
}

impl RawOutput {
    pub fn into_blocks(self) -> Option<Vec<Block>> {
        match self {
            RawOutput::Blocks(blocks) => Some(blocks),
            RawOutput::Inline(_) => None,
        }
    }

    pub fn into_inline(self) -> Option<String> {
        match self {
            RawOutput::Inline(html) => Some(html),
            RawOutput::Blocks(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, RawOutput::Inline(_))
    }
}

fn strip_clipboard_wrappers(html: &str) -> String {
    let html = META_TAG.replace_all(html, "");
    let html = FRAGMENT_START.replace(&html, "");
    FRAGMENT_END.replace(&html, "").into_owned()
}

/// Converts pasted or imported content into blocks or inline markup.
///
/// Content that already carries block delimiters is parsed as a document.
/// Plain text is treated as Markdown when the HTML flavor adds nothing to
/// it. In [`RawMode::Auto`] the result is inline markup when the content
/// holds nothing but phrasing content and no shortcodes; otherwise every
/// HTML piece runs through the block filters, the paste schema, paragraph
/// normalisation and the cleanup filters before its elements are matched
/// against the registry's raw transforms.
///
/// # Example
/// ```
/// use block_model::BlockRegistry;
/// use block_model::library::HEADING;
/// use block_raw::{RawInput, raw_handler};
///
/// let registry = BlockRegistry::with_builtins();
/// let blocks = raw_handler(&registry, &RawInput::plain_text("## Hello\n\nWorld"))
///     .into_blocks()
///     .unwrap();
/// assert_eq!(blocks[0].name(), HEADING);
/// ```
pub fn raw_handler(registry: &BlockRegistry, input: &RawInput) -> RawOutput {
    let mut mode = input.mode;
    let mut html = strip_clipboard_wrappers(&input.html);
    let plain_text = input.plain_text.as_deref().unwrap_or_default();

    if mode != RawMode::Inline {
        let content = if html.is_empty() { plain_text } else { html.as_str() };
        if content.contains(BLOCK_DELIMITER) {
            let blocks = parse(registry, content);
            let single_freeform = blocks.len() == 1 && blocks[0].name() == FREEFORM;
            if !single_freeform {
                debug!(count = blocks.len(), "Parsed delimited content");
                return RawOutput::Blocks(blocks);
            }
        }
    }

    let block_schema = block_content_schema(registry);
    let context = FilterContext {
        schema: &block_schema,
        allow_unfiltered_html: input.allow_unfiltered_html,
    };
    html = deep_filter_html(&html, PRE_FILTERS, &context);

    let is_plain_text = !plain_text.is_empty() && (html.is_empty() || is_plain(&html));
    if is_plain_text {
        html = if plain_text.trim().is_empty() {
            plain_text.to_string()
        } else {
            markdown_to_html(plain_text)
        };
    }

    let pieces = segment_shortcodes(registry, &html);
    let has_shortcodes = pieces.iter().any(|piece| matches!(piece, Piece::Block(_)));

    if is_plain_text && !has_shortcodes && mode == RawMode::Auto {
        let one_liner = !plain_text.contains('\n') && !plain_text.starts_with("<p>");
        if one_liner && html.starts_with("<p>") {
            mode = RawMode::Inline;
        }
    }

    let inline = match mode {
        RawMode::Inline => true,
        RawMode::Auto => !has_shortcodes && is_inline_content(&html, input.target_tag.as_deref()),
        RawMode::Blocks => false,
    };
    if inline {
        debug!(%mode, "Handling content inline");
        return RawOutput::Inline(filter_inline_html(&html, &context));
    }

    let paste = paste_schema(&block_schema);
    let convert = |nested: &str| {
        let nested_input = RawInput::html(nested)
            .with_mode(RawMode::Blocks)
            .with_unfiltered_html(input.allow_unfiltered_html);
        raw_handler(registry, &nested_input).into_blocks().unwrap_or_default()
    };
    let blocks: Vec<Block> = pieces
        .into_iter()
        .flat_map(|piece| match piece {
            Piece::Block(block) => vec![block],
            Piece::Html(piece) => {
                let cleaned = clean_piece(&piece, &context, &paste);
                html_to_blocks(registry, &cleaned, &convert)
            }
        })
        .collect();
    debug!(count = blocks.len(), "Converted content to blocks");
    RawOutput::Blocks(blocks)
}

fn clean_piece(html: &str, context: &FilterContext<'_>, paste: &ContentSchema) -> String {
    let html = deep_filter_html(html, BLOCK_FILTERS, context);
    let html = remove_invalid_html(&html, paste, false);
    let html = normalise_blocks(&html);
    deep_filter_html(&html, CLEANUP_FILTERS, context)
}

/// Runs HTML through the block filter pipeline and returns the cleaned
/// markup without converting it into blocks.
pub fn normalize_html(registry: &BlockRegistry, html: &str, allow_unfiltered_html: bool) -> String {
    let block_schema = block_content_schema(registry);
    let context = FilterContext {
        schema: &block_schema,
        allow_unfiltered_html,
    };
    let html = deep_filter_html(&strip_clipboard_wrappers(html), PRE_FILTERS, &context);
    clean_piece(&html, &context, &paste_schema(&block_schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_model::library::{HEADING, IMAGE, LIST, PARAGRAPH, SHORTCODE};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn blocks(input: RawInput) -> Vec<Block> {
        let registry = BlockRegistry::with_builtins();
        match raw_handler(&registry, &input) {
            RawOutput::Blocks(blocks) => blocks,
            RawOutput::Inline(html) => panic!("expected blocks, got inline {html:?}"),
        }
    }

    fn names(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.name()).collect()
    }

    #[rstest]
    #[case("auto", RawMode::Auto)]
    #[case("INLINE", RawMode::Inline)]
    #[case("Blocks", RawMode::Blocks)]
    #[case("block", RawMode::Blocks)]
    fn test_mode_from_str(#[case] input: &str, #[case] expected: RawMode) {
        assert_eq!(input.parse::<RawMode>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_mode() {
        assert_eq!("paste".parse::<RawMode>(), Err(Error::UnknownMode("paste".into())));
        assert_eq!(RawMode::Blocks.to_string(), "blocks");
    }

    #[test]
    fn test_delimited_content_is_parsed() {
        let result = blocks(RawInput::html("<!-- wp:paragraph -->\n<p>Hi</p>\n<!-- /wp:paragraph -->"));
        assert_eq!(names(&result), vec![PARAGRAPH]);
        assert!(result[0].is_valid());
    }

    #[test]
    fn test_delimiters_in_plain_text() {
        let result = blocks(RawInput::plain_text("<!-- wp:separator -->\n<hr class=\"wp-block-separator\"/>\n<!-- /wp:separator -->"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), block_model::library::SEPARATOR);
    }

    #[test]
    fn test_markdown_becomes_blocks() {
        let result = blocks(RawInput::plain_text("# Title\n\n- one\n- two"));
        assert_eq!(names(&result), vec![HEADING, LIST]);
        assert_eq!(result[0].attribute("level"), Some(&json!(1)));
        assert_eq!(result[0].attribute("content"), Some(&json!("Title")));
    }

    #[test]
    fn test_plain_one_liner_is_inline() {
        let registry = BlockRegistry::with_builtins();
        let output = raw_handler(&registry, &RawInput::plain_text("Just words"));
        let html = output.into_inline().unwrap();
        assert!(html.contains("Just words"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_phrasing_html_is_inline() {
        let registry = BlockRegistry::with_builtins();
        let output = raw_handler(&registry, &RawInput::html("<strong>Bold</strong> text"));
        assert_eq!(output, RawOutput::Inline("<strong>Bold</strong> text".to_string()));
    }

    #[test]
    fn test_word_list() {
        let html = concat!(
            r#"<p class="MsoListParagraph" style="mso-list:l0 level1 lfo1"><span style="mso-list:Ignore">·<span>&nbsp;&nbsp;</span></span>Apples</p>"#,
            r#"<p class="MsoListParagraph" style="mso-list:l0 level1 lfo1"><span style="mso-list:Ignore">·<span>&nbsp;&nbsp;</span></span>Pears</p>"#,
        );
        let result = blocks(RawInput::html(html));
        assert_eq!(names(&result), vec![LIST]);
        let values = result[0].attribute("values").and_then(|v| v.as_str()).unwrap();
        assert!(values.contains("Apples"));
        assert!(values.contains("Pears"));
        assert!(!values.contains('·'));
        assert_eq!(result[0].attribute("ordered"), Some(&json!(false)));
    }

    #[test]
    fn test_unknown_wrapper_unwraps_into_paragraph() {
        let result = blocks(RawInput::html("<aside>Note</aside>").with_mode(RawMode::Blocks));
        assert_eq!(names(&result), vec![PARAGRAPH]);
        assert_eq!(result[0].attribute("content"), Some(&json!("Note")));
    }

    #[test]
    fn test_image_in_paragraph() {
        let result = blocks(RawInput::html(r#"<p><img src="https://example.com/a.png" alt="A"></p>"#));
        assert_eq!(names(&result), vec![IMAGE]);
        assert_eq!(result[0].attribute("url"), Some(&json!("https://example.com/a.png")));
    }

    #[test]
    fn test_shortcode_between_paragraphs() {
        let result = blocks(RawInput::html("<p>Intro</p>\n[contact-form]\n<p>Outro</p>"));
        assert_eq!(names(&result), vec![PARAGRAPH, SHORTCODE, PARAGRAPH]);
        assert_eq!(result[1].attribute("text"), Some(&json!("[contact-form]")));
    }

    #[test]
    fn test_clipboard_wrappers_are_stripped() {
        let html = "<html><body><!--StartFragment--><meta charset=\"utf-8\"><p>Hi</p><!--EndFragment--></body></html>";
        let result = blocks(RawInput::html(html).with_mode(RawMode::Blocks));
        assert_eq!(names(&result), vec![PARAGRAPH]);
        assert_eq!(result[0].attribute("content"), Some(&json!("Hi")));
    }

    #[test]
    fn test_empty_input() {
        assert!(blocks(RawInput::html("").with_mode(RawMode::Blocks)).is_empty());
    }

    #[test]
    fn test_normalize_html() {
        let registry = BlockRegistry::with_builtins();
        assert_eq!(
            normalize_html(&registry, "<div>Loose<br><br>text</div><p><b>Bold</b></p>", false),
            "<p>Loose</p><p>text</p><p><strong>Bold</strong></p>"
        );
    }
}
