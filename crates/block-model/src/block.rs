//! Block instances.

use crate::attribute::Attributes;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Opaque unique identity of a block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Warning,
    Error,
}

/// A reason recorded while validating a block against its saved markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            IssueLevel::Warning => "warning",
            IssueLevel::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// A block in memory.
///
/// Blocks are values: they are built by the factory or the parser and
/// replaced rather than edited. The identity survives only the operations
/// documented to preserve it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    client_id: BlockId,
    name: String,
    attributes: Attributes,
    inner_blocks: Vec<Block>,
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    validation_issues: Vec<ValidationIssue>,
}

impl Block {
    pub(crate) fn new(name: impl Into<String>, attributes: Attributes, inner_blocks: Vec<Block>) -> Self {
        Self {
            client_id: BlockId::new(),
            name: name.into(),
            attributes,
            inner_blocks,
            is_valid: true,
            original_content: None,
            validation_issues: Vec::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn inner_blocks(&self) -> &[Block] {
        &self.inner_blocks
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Markup the block was parsed from, if it came from a document.
    pub fn original_content(&self) -> Option<&str> {
        self.original_content.as_deref()
    }

    pub fn validation_issues(&self) -> &[ValidationIssue] {
        &self.validation_issues
    }

    /// Returns the block with `attributes` merged over its own, keeping its
    /// identity.
    pub fn merge_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub(crate) fn with_id(mut self, id: BlockId) -> Self {
        self.client_id = id;
        self
    }

    pub(crate) fn with_original_content(mut self, content: impl Into<String>) -> Self {
        self.original_content = Some(content.into());
        self
    }

    pub(crate) fn with_validation(mut self, is_valid: bool, issues: Vec<ValidationIssue>) -> Self {
        self.is_valid = is_valid;
        self.validation_issues = issues;
        self
    }

    pub(crate) fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub(crate) fn with_inner_blocks(mut self, inner_blocks: Vec<Block>) -> Self {
        self.inner_blocks = inner_blocks;
        self
    }

    /// Total number of blocks in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.inner_blocks.iter().map(Block::count).sum::<usize>()
    }
}
