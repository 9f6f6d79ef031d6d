//! Types command implementation

use std::io::Write;

use block_model::{BlockRegistry, BlockTypeSummary};
use colored::Colorize;

use crate::error::{CliError, Result};

/// Run the types command
pub fn run_types(out: &mut dyn Write, registry: &BlockRegistry, category: Option<&str>, json: bool) -> Result<()> {
    if let Some(category) = category {
        if !registry.categories().iter().any(|c| c.slug == category) {
            return Err(CliError::user(format!("Unknown category '{}'", category)));
        }
    }
    let types: Vec<_> = registry
        .iter()
        .filter(|block_type| category.is_none() || block_type.category.as_deref() == category)
        .collect();

    if json {
        let summaries: Vec<BlockTypeSummary<'_>> = types.iter().map(|t| BlockTypeSummary::from(*t)).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
        return Ok(());
    }

    writeln!(out, "{}", "Block Types".bold())?;
    writeln!(out)?;
    let width = types.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for block_type in &types {
        writeln!(
            out,
            "  {:<width$}  {}  {}",
            block_type.name.green(),
            block_type.title,
            format!("[{}]", block_type.category.as_deref().unwrap_or("-")).dimmed(),
            width = width
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{} type(s)", types.len())?;
    Ok(())
}
