//! The block content model.
//!
//! A post is a sequence of blocks written as HTML with comment delimiters:
//!
//! ```text
//! <!-- wp:heading {"level":3} -->
//! <h3>Section</h3>
//! <!-- /wp:heading -->
//! ```
//!
//! This crate turns that markup into typed [`Block`] values and back:
//!
//! - [`registry`]: block types, their attribute schemas, save functions,
//!   transforms and deprecations
//! - [`source`] and [`coerce()`]: reading attribute values out of saved markup
//! - [`parser`]: grammar output to validated blocks, with legacy names,
//!   unknown types and deprecated markup handled
//! - [`validation`]: semantic HTML comparison between saved and expected markup
//! - [`serializer`]: blocks back to markup with minimal comment headers
//! - [`factory`]: creating, cloning and converting blocks
//! - [`library`]: the built-in block types
//!
//! # Example
//!
//! ```
//! use block_model::{BlockRegistry, parse, serialize};
//!
//! let registry = BlockRegistry::with_builtins();
//! let markup = "<!-- wp:paragraph -->\n<p>Hello</p>\n<!-- /wp:paragraph -->";
//! let blocks = parse(&registry, markup);
//! assert!(blocks[0].is_valid());
//! assert_eq!(serialize(&registry, &blocks), markup);
//! ```

pub mod attribute;
pub mod block;
pub mod coerce;
pub mod error;
pub mod factory;
pub mod legacy;
pub mod library;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod source;
pub mod transform;
pub mod validation;

pub use attribute::{AttributeDefinition, AttributeSchema, AttributeSource, AttributeType, Attributes};
pub use block::{Block, BlockId, IssueLevel, ValidationIssue};
pub use coerce::{coerce, is_of_type};
pub use error::{Error, RegistrationError, Result, SaveError};
pub use factory::{
    NamedTransform, clone_block, create_block, find_pattern_transform, find_transform, get_block_transforms,
    get_possible_block_transformations, switch_to_block_type,
};
pub use legacy::convert_legacy_block;
pub use parser::{ParseOptions, parse, parse_with_options};
pub use registry::{BlockCategory, BlockRegistry, BlockType, BlockTypeSummary, Deprecation};
pub use schema::{ContentSchema, SchemaChildren, SchemaNode, TEXT_NODE, phrasing_content_schema};
pub use serializer::{
    SerializeOptions, get_block_content, get_comment_attributes, get_save_content, serialize, serialize_block,
    serialize_with_options,
};
pub use transform::{RawTransformContext, Transform, TransformDirection, Transforms};
pub use validation::{is_equivalent_html, validate_block};
