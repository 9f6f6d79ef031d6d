//! Block type registry
//!
//! Holds every known block type, the categories they belong to, and the
//! names of the types used for content nothing else claims.

mod store;
mod types;

pub use store::{BlockRegistry, DEFAULT_CATEGORIES, MAX_KEYWORDS};
pub use types::{
    BlockCategory, BlockType, BlockTypeSummary, CLASS_NAME, CUSTOM_CLASS_NAME, Deprecation,
    EligibleFn, INNER_BLOCKS, MigrateFn, SaveFn,
};
