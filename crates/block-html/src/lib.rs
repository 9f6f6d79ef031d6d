//! Owned HTML primitives.
//!
//! Everything the block model needs to look inside markup without a browser:
//!
//! - [`tokenize`]: a flat token stream, used for semantic comparison
//! - [`Tree`]: an arena DOM with parent/child/sibling links by [`NodeId`]
//! - [`Selector`]: the CSS subset used by attribute sources and raw transforms
//! - [`autop`]: paragraph insertion for freeform content

pub mod autop;
pub mod error;
pub mod parse;
pub mod selector;
pub mod serialize;
pub mod tokenizer;
pub mod tree;

pub use autop::autop;
pub use error::{Error, Result};
pub use parse::{MAX_DEPTH, VOID_ELEMENTS, is_void_element};
pub use selector::Selector;
pub use tokenizer::{Token, tokenize, tokenize_lenient};
pub use tree::{ElementData, NodeData, NodeId, Tree};
