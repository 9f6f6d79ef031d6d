//! Plain text and Markdown input.

use pulldown_cmark::{Event, Options, Parser, html};

/// Converts Markdown to HTML.
///
/// Tables and strikethrough are enabled, and single line breaks are kept as
/// `<br>` since pasted plain text rarely relies on soft wrapping.
///
/// # Example
/// ```
/// use block_raw::markdown_to_html;
///
/// assert_eq!(markdown_to_html("# Title"), "<h1>Title</h1>\n");
/// ```
pub fn markdown_to_html(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Whether `html` carries no markup other than line breaks.
pub fn is_plain(html: &str) -> bool {
    html.match_indices('<').all(|(index, _)| {
        let rest = &html[index + 1..];
        let Some(after) = rest.get(..2).filter(|tag| tag.eq_ignore_ascii_case("br")).map(|_| &rest[2..]) else {
            return false;
        };
        matches!(after.chars().next(), Some(' ' | '/' | '>'))
    })
}
