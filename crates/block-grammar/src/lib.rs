//! Comment-delimited block grammar.
//!
//! Documents are plain HTML in which blocks are marked with HTML comments:
//!
//! ```text
//! <!-- wp:core/paragraph {"align":"center"} -->
//! <p class="has-text-align-center">Hello</p>
//! <!-- /wp:core/paragraph -->
//!
//! <!-- wp:separator /-->
//! ```
//!
//! This crate knows nothing about block types. It splits a document into
//! [`Segment`]s (freeform HTML and delimited [`BlockNode`]s), writes delimiters
//! back out, and recognizes `[shortcode]` syntax for the raw-handling pipeline.
//!
//! Parsing is total: malformed delimiters degrade to freeform text and never
//! produce an error.

pub mod error;
pub mod parser;
pub mod shortcode;
pub mod writer;

pub use error::{Error, Result};
pub use parser::{BlockNode, InnerContent, MAX_NESTING, Segment, parse};
pub use shortcode::{Shortcode, ShortcodeAttrs, ShortcodeKind, ShortcodeMatch};
pub use writer::{
    comment_delimited_content, decode_attributes, encode_attributes, serialize_attributes,
    serialize_raw_block,
};
