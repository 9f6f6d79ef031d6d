//! Validate command implementation
//!
//! Parses a document and reports every block whose markup differs from
//! what its type saves for the parsed attributes.

use std::io::Write;

use block_model::{Block, BlockRegistry, get_save_content, parse_with_options, serialize_with_options};
use colored::Colorize;
use serde_json::json;
use similar::TextDiff;

use crate::config::Config;
use crate::error::{CliError, Result};

/// An invalid block and the markup its type would have written.
struct Finding<'a> {
    block: &'a Block,
    expected: Option<String>,
}

fn collect<'a>(registry: &BlockRegistry, config: &Config, blocks: &'a [Block], findings: &mut Vec<Finding<'a>>) {
    for block in blocks {
        if !block.is_valid() {
            let expected = registry.get(block.name()).and_then(|block_type| {
                let inner = serialize_with_options(registry, block.inner_blocks(), &config.serialize_options());
                get_save_content(block_type, block.attributes(), &inner).ok()
            });
            findings.push(Finding { block, expected });
        }
        collect(registry, config, block.inner_blocks(), findings);
    }
}

/// One tag per line, so diffs of single-line markup stay readable.
fn split_tags(html: &str) -> String {
    let mut lines = html.replace("><", ">\n<");
    if !lines.ends_with('\n') {
        lines.push('\n');
    }
    lines
}

/// Unified diff from the markup found in the document to the expected markup.
pub fn markup_diff(original: &str, expected: &str) -> String {
    let original = split_tags(original);
    let expected = split_tags(expected);
    TextDiff::from_lines(&original, &expected)
        .unified_diff()
        .context_radius(2)
        .header("document", "expected")
        .to_string()
}

/// Run the validate command
///
/// Fails when at least one block is invalid, so scripts can rely on the
/// exit status.
pub fn run_validate(
    out: &mut dyn Write,
    registry: &BlockRegistry,
    document: &str,
    config: &Config,
    json: bool,
) -> Result<()> {
    let blocks = parse_with_options(registry, document, &config.parse_options());
    let total: usize = blocks.iter().map(Block::count).sum();
    let mut findings = Vec::new();
    collect(registry, config, &blocks, &mut findings);

    if json {
        let report = json!({
            "blocks": total,
            "invalid": findings.iter().map(|finding| json!({
                "name": finding.block.name(),
                "issues": finding.block.validation_issues(),
                "original": finding.block.original_content(),
                "expected": finding.expected,
            })).collect::<Vec<_>>(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        print_findings(out, &findings, total)?;
    }

    if findings.is_empty() {
        Ok(())
    } else {
        Err(CliError::user(format!("{} of {} block(s) are invalid", findings.len(), total)))
    }
}

fn print_findings(out: &mut dyn Write, findings: &[Finding<'_>], total: usize) -> Result<()> {
    if findings.is_empty() {
        writeln!(out, "{} All {} block(s) are valid.", "OK".green().bold(), total)?;
        return Ok(());
    }

    for finding in findings {
        writeln!(out, "{} {}", "Invalid".red().bold(), finding.block.name().yellow())?;
        for issue in finding.block.validation_issues() {
            writeln!(out, "  {} {}", "!".red(), issue)?;
        }
        if let (Some(original), Some(expected)) = (finding.block.original_content(), &finding.expected) {
            writeln!(out)?;
            for line in markup_diff(original, expected).lines() {
                let line = if line.starts_with('+') && !line.starts_with("+++") {
                    line.green()
                } else if line.starts_with('-') && !line.starts_with("---") {
                    line.red()
                } else {
                    line.normal()
                };
                writeln!(out, "    {}", line)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::capture;

    const INVALID: &str = "<!-- wp:paragraph -->\n<p>Hello <span>there</p>\n<!-- /wp:paragraph -->";

    #[test]
    fn test_valid_document() {
        let registry = BlockRegistry::with_builtins();
        let document = "<!-- wp:paragraph -->\n<p>Fine</p>\n<!-- /wp:paragraph -->";
        let (result, output) = capture(|out| run_validate(out, &registry, document, &Config::default(), false));
        result.unwrap();
        assert!(output.contains("All 1 block(s) are valid."));
    }

    #[test]
    fn test_invalid_block_shows_diff() {
        let registry = BlockRegistry::with_builtins();
        let (result, output) = capture(|out| run_validate(out, &registry, INVALID, &Config::default(), false));
        assert_eq!(result.unwrap_err().to_string(), "1 of 1 block(s) are invalid");
        assert!(output.contains("Invalid core/paragraph"));
        assert!(output.contains("--- document"));
        assert!(output.contains("+++ expected"));
    }

    #[test]
    fn test_json_report() {
        let registry = BlockRegistry::with_builtins();
        let (result, output) = capture(|out| run_validate(out, &registry, INVALID, &Config::default(), true));
        assert!(result.is_err());
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["blocks"], 1);
        assert_eq!(report["invalid"][0]["name"], "core/paragraph");
        assert_eq!(report["invalid"][0]["original"], "<p>Hello <span>there</p>");
    }

    #[test]
    fn test_markup_diff_marks_changed_tags() {
        let diff = markup_diff("<p>a</p><p>b</p>", "<p>a</p><p>c</p>");
        assert!(diff.contains("-<p>b</p>"));
        assert!(diff.contains("+<p>c</p>"));
        assert!(!diff.contains("-<p>a</p>"));
    }
}
