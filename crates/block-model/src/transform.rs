//! Transform declarations.
//!
//! A block type lists the ways other content can become it (`from`) and the
//! ways it can become other blocks (`to`).

use crate::attribute::Attributes;
use crate::block::Block;
use crate::registry::BlockRegistry;
use crate::schema::ContentSchema;
use block_grammar::Shortcode;
use block_html::{NodeId, Tree};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;

/// Priority of transforms that do not set one. Lower runs first.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Predicate over an element of a parsed fragment.
pub type NodeMatchFn = Arc<dyn Fn(&Tree, NodeId) -> bool + Send + Sync>;

/// Converts one or more blocks into new blocks.
pub type BlockTransformFn = Arc<dyn Fn(&BlockRegistry, &[Block]) -> Vec<Block> + Send + Sync>;

/// Decides whether a block transform applies to the given blocks.
pub type BlockMatchFn = Arc<dyn Fn(&[Block]) -> bool + Send + Sync>;

/// Builds a block from a pasted element.
pub type RawTransformFn = Arc<dyn Fn(&RawTransformContext<'_>) -> Option<Block> + Send + Sync>;

/// Derives block attributes from a shortcode.
pub type ShortcodeTransformFn = Arc<dyn Fn(&Shortcode) -> Attributes + Send + Sync>;

/// Decides whether a shortcode transform applies.
pub type ShortcodeMatchFn = Arc<dyn Fn(&Shortcode) -> bool + Send + Sync>;

/// Derives block attributes from a matched text pattern and the text after it.
pub type PatternTransformFn = Arc<dyn Fn(&Captures<'_>, &str) -> Attributes + Send + Sync>;

/// What a raw transform sees of the element it converts.
pub struct RawTransformContext<'a> {
    pub registry: &'a BlockRegistry,
    pub tree: &'a Tree,
    pub node: NodeId,
    /// Converts nested HTML into blocks with the full raw pipeline.
    pub convert: &'a dyn Fn(&str) -> Vec<Block>,
}

/// Direction of a transform relative to the block type declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformDirection {
    From,
    To,
}

/// Conversion between blocks.
#[derive(Clone)]
pub struct BlockTransform {
    /// Block names on the other side; `*` matches any.
    pub blocks: Vec<String>,
    pub transform: BlockTransformFn,
    /// Receives all selected blocks at once instead of one at a time.
    pub is_multi_block: bool,
    pub is_match: Option<BlockMatchFn>,
    pub priority: i32,
}

/// Creation from a pasted HTML element.
#[derive(Clone)]
pub struct RawTransform {
    pub selector: Option<String>,
    pub is_match: Option<NodeMatchFn>,
    /// Custom conversion; without one the element's outer HTML is sourced
    /// with the block's attribute schema.
    pub transform: Option<RawTransformFn>,
    pub schema: ContentSchema,
    pub priority: i32,
}

/// Creation from a standalone shortcode.
#[derive(Clone)]
pub struct ShortcodeTransform {
    pub tags: Vec<String>,
    pub transform: ShortcodeTransformFn,
    pub is_match: Option<ShortcodeMatchFn>,
    pub priority: i32,
}

/// Creation from a typed text pattern such as `## `.
#[derive(Clone)]
pub struct PatternTransform {
    pub regex: Regex,
    pub transform: PatternTransformFn,
    pub priority: i32,
}

/// A declared conversion.
#[derive(Clone)]
pub enum Transform {
    Block(BlockTransform),
    Raw(RawTransform),
    Shortcode(ShortcodeTransform),
    Pattern(PatternTransform),
}

impl Transform {
    /// A one-at-a-time block transform.
    pub fn block<F>(blocks: &[&str], transform: F) -> Self
    where
        F: Fn(&BlockRegistry, &[Block]) -> Vec<Block> + Send + Sync + 'static,
    {
        Self::Block(BlockTransform {
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            transform: Arc::new(transform),
            is_multi_block: false,
            is_match: None,
            priority: DEFAULT_PRIORITY,
        })
    }

    /// A raw transform matching elements by selector.
    pub fn raw(selector: &str, schema: ContentSchema) -> Self {
        Self::Raw(RawTransform {
            selector: Some(selector.to_string()),
            is_match: None,
            transform: None,
            schema,
            priority: DEFAULT_PRIORITY,
        })
    }

    /// A raw transform matching elements by predicate.
    pub fn raw_matching<F>(is_match: F, schema: ContentSchema) -> Self
    where
        F: Fn(&Tree, NodeId) -> bool + Send + Sync + 'static,
    {
        Self::Raw(RawTransform {
            selector: None,
            is_match: Some(Arc::new(is_match)),
            transform: None,
            schema,
            priority: DEFAULT_PRIORITY,
        })
    }

    pub fn shortcode<F>(tags: &[&str], transform: F) -> Self
    where
        F: Fn(&Shortcode) -> Attributes + Send + Sync + 'static,
    {
        Self::Shortcode(ShortcodeTransform {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            transform: Arc::new(transform),
            is_match: None,
            priority: DEFAULT_PRIORITY,
        })
    }

    pub fn pattern<F>(regex: Regex, transform: F) -> Self
    where
        F: Fn(&Captures<'_>, &str) -> Attributes + Send + Sync + 'static,
    {
        Self::Pattern(PatternTransform {
            regex,
            transform: Arc::new(transform),
            priority: DEFAULT_PRIORITY,
        })
    }

    pub fn with_priority(mut self, value: i32) -> Self {
        match &mut self {
            Self::Block(t) => t.priority = value,
            Self::Raw(t) => t.priority = value,
            Self::Shortcode(t) => t.priority = value,
            Self::Pattern(t) => t.priority = value,
        }
        self
    }

    /// Makes a block transform receive all selected blocks at once.
    pub fn multi_block(mut self) -> Self {
        if let Self::Block(t) = &mut self {
            t.is_multi_block = true;
        }
        self
    }

    /// Sets a custom conversion on a raw transform.
    pub fn with_raw_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&RawTransformContext<'_>) -> Option<Block> + Send + Sync + 'static,
    {
        if let Self::Raw(t) = &mut self {
            t.transform = Some(Arc::new(transform));
        }
        self
    }

    /// Adds a predicate to a block transform.
    pub fn with_block_match<F>(mut self, is_match: F) -> Self
    where
        F: Fn(&[Block]) -> bool + Send + Sync + 'static,
    {
        if let Self::Block(t) = &mut self {
            t.is_match = Some(Arc::new(is_match));
        }
        self
    }

    /// Adds a predicate to a shortcode transform.
    pub fn with_shortcode_match<F>(mut self, is_match: F) -> Self
    where
        F: Fn(&Shortcode) -> bool + Send + Sync + 'static,
    {
        if let Self::Shortcode(t) = &mut self {
            t.is_match = Some(Arc::new(is_match));
        }
        self
    }

    pub fn priority(&self) -> i32 {
        match self {
            Self::Block(t) => t.priority,
            Self::Raw(t) => t.priority,
            Self::Shortcode(t) => t.priority,
            Self::Pattern(t) => t.priority,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Block(_) => "block",
            Self::Raw(_) => "raw",
            Self::Shortcode(_) => "shortcode",
            Self::Pattern(_) => "pattern",
        }
    }
}

impl RawTransform {
    /// Whether the element is handled by this transform.
    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        if let Some(is_match) = &self.is_match {
            return is_match(tree, node);
        }
        self.selector
            .as_deref()
            .is_some_and(|selector| tree.matches_selector(node, selector))
    }
}

impl BlockTransform {
    /// Whether this transform accepts blocks named `name`.
    pub fn accepts(&self, name: &str) -> bool {
        self.blocks.iter().any(|b| b == "*" || b == name)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(t) => f
                .debug_struct("Block")
                .field("blocks", &t.blocks)
                .field("is_multi_block", &t.is_multi_block)
                .field("priority", &t.priority)
                .finish_non_exhaustive(),
            Self::Raw(t) => f
                .debug_struct("Raw")
                .field("selector", &t.selector)
                .field("schema", &t.schema)
                .field("priority", &t.priority)
                .finish_non_exhaustive(),
            Self::Shortcode(t) => f
                .debug_struct("Shortcode")
                .field("tags", &t.tags)
                .field("priority", &t.priority)
                .finish_non_exhaustive(),
            Self::Pattern(t) => f
                .debug_struct("Pattern")
                .field("regex", &t.regex.as_str())
                .field("priority", &t.priority)
                .finish_non_exhaustive(),
        }
    }
}

/// Transforms declared by a block type.
#[derive(Debug, Clone, Default)]
pub struct Transforms {
    pub from: Vec<Transform>,
    pub to: Vec<Transform>,
}

impl Transforms {
    pub fn get(&self, direction: TransformDirection) -> &[Transform] {
        match direction {
            TransformDirection::From => &self.from,
            TransformDirection::To => &self.to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }
}
