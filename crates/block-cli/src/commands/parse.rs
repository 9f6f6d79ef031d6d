//! Parse command implementation

use std::io::Write;

use block_model::{Block, BlockRegistry, parse_with_options};
use colored::Colorize;
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;

/// Run the parse command
///
/// Prints an indented outline of the parsed blocks, or the blocks
/// themselves as JSON.
pub fn run_parse(
    out: &mut dyn Write,
    registry: &BlockRegistry,
    document: &str,
    config: &Config,
    json: bool,
) -> Result<()> {
    let blocks = parse_with_options(registry, document, &config.parse_options());
    tracing::debug!(count = blocks.len(), "Parsed document");

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&blocks)?)?;
        return Ok(());
    }

    if blocks.is_empty() {
        writeln!(out, "{}", "No blocks found.".dimmed())?;
        return Ok(());
    }
    for block in &blocks {
        write_outline(out, block, 0)?;
    }
    let total: usize = blocks.iter().map(Block::count).sum();
    writeln!(out)?;
    writeln!(out, "{} block(s)", total)?;
    Ok(())
}

fn write_outline(out: &mut dyn Write, block: &Block, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    let status = if block.is_valid() {
        "".normal()
    } else {
        " (invalid)".red()
    };
    let attributes = serde_json::to_string(&Value::Object(block.attributes().clone()))?;
    writeln!(out, "{}{}{} {}", indent, block.name().green(), status, attributes.dimmed())?;
    for inner in block.inner_blocks() {
        write_outline(out, inner, depth + 1)?;
    }
    Ok(())
}
