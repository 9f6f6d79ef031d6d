//! Convert command implementation

use std::io::Write;

use block_model::{BlockRegistry, serialize_with_options};
use block_raw::{RawOutput, raw_handler};

use crate::config::Config;
use crate::error::Result;

/// Run the convert command
///
/// Block output is written as a document, or as JSON with `json`. Inline
/// output is written as markup either way.
pub fn run_convert(
    out: &mut dyn Write,
    registry: &BlockRegistry,
    content: String,
    plain: bool,
    config: &Config,
    json: bool,
) -> Result<()> {
    let input = if plain {
        config.raw_input(String::new(), Some(content))
    } else {
        config.raw_input(content, None)
    };
    tracing::debug!(mode = %input.mode, plain, "Converting content");

    match raw_handler(registry, &input) {
        RawOutput::Inline(html) => writeln!(out, "{}", html)?,
        RawOutput::Blocks(blocks) if json => writeln!(out, "{}", serde_json::to_string_pretty(&blocks)?)?,
        RawOutput::Blocks(blocks) => writeln!(
            out,
            "{}",
            serialize_with_options(registry, &blocks, &config.serialize_options())
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::capture;
    use block_raw::RawMode;
    use pretty_assertions::assert_eq;

    fn convert(content: &str, plain: bool, config: &Config, json: bool) -> String {
        let registry = BlockRegistry::with_builtins();
        let (result, output) = capture(|out| run_convert(out, &registry, content.to_string(), plain, config, json));
        result.unwrap();
        output
    }

    #[test]
    fn test_markdown_to_document() {
        let output = convert("## Notes\n\nSome *text*", true, &Config::default(), false);
        assert_eq!(
            output,
            "<!-- wp:heading -->\n<h2>Notes</h2>\n<!-- /wp:heading -->\n\n<!-- wp:paragraph -->\n<p>Some <em>text</em></p>\n<!-- /wp:paragraph -->\n"
        );
    }

    #[test]
    fn test_inline_output() {
        let output = convert("<b>Bold</b> move", false, &Config::default(), false);
        assert_eq!(output, "<strong>Bold</strong> move\n");
    }

    #[test]
    fn test_configured_mode_forces_blocks() {
        let mut config = Config::default();
        config.raw.mode = RawMode::Blocks;
        let output = convert("<b>Bold</b> move", false, &config, false);
        assert!(output.starts_with("<!-- wp:paragraph -->"));
    }

    #[test]
    fn test_json_blocks() {
        let output = convert("<h2>Title</h2><p>Body</p>", false, &Config::default(), true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["name"], "core/heading");
        assert_eq!(value[1]["attributes"]["content"], "Body");
    }
}
