//! CLI argument parsing using clap derive

use std::path::PathBuf;

use block_raw::RawMode;
use clap::{Parser, Subcommand};

/// Parse, validate, serialize and convert block documents
#[derive(Parser, Debug)]
#[command(name = "blocks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file applied over the discovered layers
    #[arg(long, global = true, value_name = "PATH", env = "BLOCKS_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Parse a document into blocks
    ///
    /// Examples:
    ///   blocks parse post.html
    ///   cat post.html | blocks parse --json
    Parse {
        /// Document to read; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Print the blocks as JSON
        #[arg(long)]
        json: bool,

        /// Leave classic content without added paragraphs
        #[arg(long)]
        skip_autop: bool,
    },

    /// Write blocks given as JSON back to a document
    ///
    /// Accepts the output of `blocks parse --json`, or any array of
    /// `{"name", "attributes", "innerBlocks"}` objects.
    Serialize {
        /// JSON to read; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Keep the `core/` namespace in delimiters
        #[arg(long)]
        keep_core_namespace: bool,
    },

    /// Check that every block's markup matches what its type would save
    Validate {
        /// Document to read; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert pasted HTML, Markdown or plain text into blocks
    ///
    /// Examples:
    ///   blocks convert page.html
    ///   blocks convert --plain notes.md
    ///   blocks convert --mode inline snippet.html
    Convert {
        /// Content to read; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Treat the input as plain text or Markdown
        #[arg(long)]
        plain: bool,

        /// Output shape: auto, inline or blocks
        #[arg(long)]
        mode: Option<RawMode>,

        /// Tag of the element the content is pasted into
        #[arg(long)]
        target_tag: Option<String>,

        /// Keep embeds that are dropped by default
        #[arg(long)]
        allow_unfiltered_html: bool,

        /// Print blocks as JSON instead of markup
        #[arg(long)]
        json: bool,
    },

    /// List the registered block types
    Types {
        /// Only list types in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
