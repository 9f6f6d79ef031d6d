//! Block document CLI
//!
//! Command-line access to the block parser, serializer, validator and the
//! raw content converter.

mod cli;
mod commands;
mod config;
mod error;
mod logging;

use std::io::Write;

use block_model::BlockRegistry;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use config::{Config, ConfigResolver};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config = ConfigResolver::new(cwd).with_explicit(cli.config.clone()).resolve()?;
    logging::init(&config.log.level, cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd, config),
        None => {
            // No command provided - show help hint
            println!("{} Block document tools", "blocks".green().bold());
            println!();
            println!("Run {} for available commands.", "blocks --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, mut config: Config) -> Result<()> {
    let registry = BlockRegistry::with_builtins();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match cmd {
        Commands::Parse {
            input,
            json,
            skip_autop,
        } => {
            config.parse.skip_autop |= skip_autop;
            let document = commands::read_input(input.as_deref())?;
            commands::run_parse(&mut out, &registry, &document, &config, json)
        }
        Commands::Serialize {
            input,
            keep_core_namespace,
        } => {
            if keep_core_namespace {
                config.serialize.strip_core_namespace = false;
            }
            let json = commands::read_input(input.as_deref())?;
            commands::run_serialize(&mut out, &registry, &json, &config)
        }
        Commands::Validate { input, json } => {
            let document = commands::read_input(input.as_deref())?;
            commands::run_validate(&mut out, &registry, &document, &config, json)
        }
        Commands::Convert {
            input,
            plain,
            mode,
            target_tag,
            allow_unfiltered_html,
            json,
        } => {
            if let Some(mode) = mode {
                config.raw.mode = mode;
            }
            if target_tag.is_some() {
                config.raw.target_tag = target_tag;
            }
            config.raw.allow_unfiltered_html |= allow_unfiltered_html;
            let content = commands::read_input(input.as_deref())?;
            commands::run_convert(&mut out, &registry, content, plain, &config, json)
        }
        Commands::Types { category, json } => commands::run_types(&mut out, &registry, category.as_deref(), json),
    };

    out.flush()?;
    result
}
