//! Normalization of pasted and imported content into blocks.
//!
//! Content from the clipboard or from legacy posts arrives as arbitrary HTML,
//! often with a plain-text flavor alongside. [`raw_handler`] turns it into
//! either inline markup for an existing block or a list of blocks:
//!
//! 1. delimited content is parsed as a document
//! 2. plain text is read as Markdown when the HTML adds no formatting
//! 3. standalone shortcodes are split out into their own blocks
//! 4. the remaining HTML runs through an ordered list of [`NodeFilter`]s,
//!    is cleaned against the schema every block type accepts and gets
//!    paragraph structure
//! 5. each top-level element is claimed by a block type's raw transform,
//!    or kept as a custom HTML block
//!
//! # Example
//!
//! ```
//! use block_model::BlockRegistry;
//! use block_raw::{RawInput, RawMode, raw_handler};
//!
//! let registry = BlockRegistry::with_builtins();
//! let input = RawInput::html("<h2>Title</h2><div>Some <b>bold</b> text</div>").with_mode(RawMode::Blocks);
//! let blocks = raw_handler(&registry, &input).into_blocks().unwrap();
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(blocks[1].attribute("content").unwrap(), "Some <strong>bold</strong> text");
//! ```

pub mod clean;
pub mod convert;
pub mod error;
pub mod filter;
pub mod filters;
pub mod handler;
pub mod inline;
pub mod markdown;
pub mod normalise;
pub mod schema;
pub mod shortcode;

pub use clean::remove_invalid_html;
pub use convert::html_to_blocks;
pub use error::{Error, Result};
pub use filter::{FilterContext, NodeFilter, deep_filter, deep_filter_html};
pub use handler::{RawInput, RawMode, RawOutput, normalize_html, raw_handler};
pub use inline::{filter_inline_html, is_inline_content};
pub use markdown::{is_plain, markdown_to_html};
pub use normalise::normalise_blocks;
pub use schema::{block_content_schema, paste_schema};
pub use shortcode::{Piece, segment_shortcodes};
