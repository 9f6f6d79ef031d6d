//! Block type registry storage

use super::types::{BlockCategory, BlockType, CLASS_NAME, CUSTOM_CLASS_NAME};
use crate::attribute::AttributeDefinition;
use crate::error::RegistrationError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, error};

static BLOCK_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*/[a-z][a-z0-9-]*$").expect("Invalid block name regex")
});

/// Most keywords a block type may declare.
pub const MAX_KEYWORDS: usize = 3;

/// Categories every registry starts with.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("text", "Text"),
    ("media", "Media"),
    ("design", "Design"),
    ("widgets", "Widgets"),
    ("theme", "Theme"),
    ("embed", "Embeds"),
    ("common", "Common blocks"),
    ("formatting", "Formatting"),
    ("layout", "Layout elements"),
];

/// Central registry of block types.
///
/// Besides the types themselves it records which types stand in for
/// unrecognized content: the freeform handler (HTML outside delimiters), the
/// unknown-type handler (delimiters naming unregistered types), the default
/// type, and the fallback for pasted elements no raw transform claims.
pub struct BlockRegistry {
    types: HashMap<String, BlockType>,
    order: Vec<String>,
    categories: Vec<BlockCategory>,
    freeform_handler: Option<String>,
    unknown_type_handler: Option<String>,
    default_type: Option<String>,
    raw_fallback_type: Option<String>,
}

impl BlockRegistry {
    /// Create a registry with the default categories and no block types.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            order: Vec::new(),
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(slug, title)| BlockCategory::new(*slug, *title))
                .collect(),
            freeform_handler: None,
            unknown_type_handler: None,
            default_type: None,
            raw_fallback_type: None,
        }
    }

    /// Create a registry pre-populated with the built-in block library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for block_type in crate::library::builtin_block_types() {
            registry.register(block_type);
        }
        registry.set_freeform_handler(crate::library::FREEFORM);
        registry.set_unknown_type_handler(crate::library::MISSING);
        registry.set_default_type(crate::library::PARAGRAPH);
        registry.set_raw_fallback_type(crate::library::HTML);
        registry
    }

    /// Register a block type, rejecting malformed definitions.
    pub fn try_register(&mut self, mut block_type: BlockType) -> Result<&BlockType, RegistrationError> {
        let name = block_type.name.clone();
        if !BLOCK_NAME_REGEX.is_match(&name) {
            return Err(RegistrationError::InvalidName { name });
        }
        if self.types.contains_key(&name) {
            return Err(RegistrationError::AlreadyRegistered { name });
        }
        if block_type.save.is_none() {
            return Err(RegistrationError::MissingSave { name });
        }
        if let Some((key, _)) = block_type
            .supports
            .iter()
            .find(|(_, value)| !matches!(value, Value::Bool(_) | Value::Object(_)))
        {
            return Err(RegistrationError::InvalidSupport {
                name,
                key: key.clone(),
            });
        }
        if block_type.keywords.len() > MAX_KEYWORDS {
            return Err(RegistrationError::TooManyKeywords {
                count: block_type.keywords.len(),
                name,
            });
        }
        let Some(category) = block_type.category.clone() else {
            return Err(RegistrationError::MissingCategory { name });
        };
        if !self.categories.iter().any(|c| c.slug == category) {
            return Err(RegistrationError::UnknownCategory { name, category });
        }
        if block_type.title.trim().is_empty() {
            return Err(RegistrationError::MissingTitle { name });
        }

        if block_type.supports(CUSTOM_CLASS_NAME, true) {
            block_type
                .attributes
                .entry(CLASS_NAME.to_string())
                .or_insert_with(AttributeDefinition::string);
        }

        debug!(block = %name, "Registered block type");
        self.order.push(name.clone());
        Ok(self.types.entry(name).or_insert(block_type))
    }

    /// Register a block type, logging and returning `None` if it is refused.
    pub fn register(&mut self, block_type: BlockType) -> Option<&BlockType> {
        match self.try_register(block_type) {
            Ok(registered) => Some(registered),
            Err(e) => {
                error!("{e}");
                None
            }
        }
    }

    /// Remove a block type, returning it.
    pub fn unregister(&mut self, name: &str) -> Option<BlockType> {
        let Some(removed) = self.types.remove(name) else {
            error!("{}", RegistrationError::NotRegistered { name: name.to_string() });
            return None;
        };
        self.order.retain(|n| n != name);
        for handler in [
            &mut self.freeform_handler,
            &mut self.unknown_type_handler,
            &mut self.default_type,
            &mut self.raw_fallback_type,
        ] {
            if handler.as_deref() == Some(name) {
                *handler = None;
            }
        }
        Some(removed)
    }

    /// Get a block type by name.
    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.types.get(name)
    }

    /// Check if a block type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Get the number of registered block types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// List registered block names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Iterate over block types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// List block names in a category (sorted).
    pub fn by_category(&self, category: &str) -> Vec<&str> {
        let mut names: Vec<_> = self
            .types
            .values()
            .filter(|t| t.category.as_deref() == Some(category))
            .map(|t| t.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Add a category; an existing slug is replaced.
    pub fn register_category(&mut self, category: BlockCategory) {
        match self.categories.iter_mut().find(|c| c.slug == category.slug) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    pub fn categories(&self) -> &[BlockCategory] {
        &self.categories
    }

    pub fn set_freeform_handler(&mut self, name: impl Into<String>) {
        self.freeform_handler = Some(name.into());
    }

    /// Type that holds HTML found outside block delimiters.
    pub fn freeform_handler(&self) -> Option<&str> {
        self.freeform_handler.as_deref()
    }

    pub fn set_unknown_type_handler(&mut self, name: impl Into<String>) {
        self.unknown_type_handler = Some(name.into());
    }

    /// Type that preserves blocks whose type is not registered.
    pub fn unknown_type_handler(&self) -> Option<&str> {
        self.unknown_type_handler.as_deref()
    }

    pub fn set_default_type(&mut self, name: impl Into<String>) {
        self.default_type = Some(name.into());
    }

    pub fn default_type(&self) -> Option<&str> {
        self.default_type.as_deref()
    }

    pub fn set_raw_fallback_type(&mut self, name: impl Into<String>) {
        self.raw_fallback_type = Some(name.into());
    }

    /// Type pasted elements become when no raw transform claims them.
    pub fn raw_fallback_type(&self) -> Option<&str> {
        self.raw_fallback_type.as_deref()
    }

    /// Whether `name` is the freeform or the unknown-type handler.
    pub fn is_fallback_type(&self, name: &str) -> bool {
        self.freeform_handler() == Some(name) || self.unknown_type_handler() == Some(name)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
