//! Core types for the block type registry

use crate::attribute::{AttributeDefinition, AttributeSchema, Attributes};
use crate::block::Block;
use crate::error::SaveError;
use crate::transform::{Transform, Transforms};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Renders a block's attributes to its saved HTML.
///
/// Output may contain [`INNER_BLOCKS`] where nested blocks belong.
pub type SaveFn = Arc<dyn Fn(&Attributes) -> Result<String, SaveError> + Send + Sync>;

/// Rewrites attributes and inner blocks parsed with an older shape.
pub type MigrateFn = Arc<dyn Fn(Attributes, Vec<Block>) -> (Attributes, Vec<Block>) + Send + Sync>;

/// Opts a valid block into a deprecation's migration.
pub type EligibleFn = Arc<dyn Fn(&Attributes, &[Block]) -> bool + Send + Sync>;

/// Placeholder a save function writes where nested blocks go.
pub const INNER_BLOCKS: &str = "\u{e000}inner-blocks\u{e000}";

/// Support flag that adds a `className` attribute to a type.
pub const CUSTOM_CLASS_NAME: &str = "customClassName";

/// Attribute holding extra classes for a block's root element.
pub const CLASS_NAME: &str = "className";

/// A block category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockCategory {
    pub slug: String,
    pub title: String,
}

impl BlockCategory {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
        }
    }
}

/// A previous shape of a block type, kept so old content still parses.
#[derive(Clone)]
pub struct Deprecation {
    /// Schema of the old shape; `None` reuses the current one.
    pub attributes: Option<AttributeSchema>,
    pub save: SaveFn,
    pub migrate: Option<MigrateFn>,
    pub is_eligible: Option<EligibleFn>,
}

impl Deprecation {
    pub fn new<F>(save: F) -> Self
    where
        F: Fn(&Attributes) -> Result<String, SaveError> + Send + Sync + 'static,
    {
        Self {
            attributes: None,
            save: Arc::new(save),
            migrate: None,
            is_eligible: None,
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSchema) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_migrate<F>(mut self, migrate: F) -> Self
    where
        F: Fn(Attributes, Vec<Block>) -> (Attributes, Vec<Block>) + Send + Sync + 'static,
    {
        self.migrate = Some(Arc::new(migrate));
        self
    }

    pub fn with_eligibility<F>(mut self, is_eligible: F) -> Self
    where
        F: Fn(&Attributes, &[Block]) -> bool + Send + Sync + 'static,
    {
        self.is_eligible = Some(Arc::new(is_eligible));
        self
    }
}

impl fmt::Debug for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deprecation")
            .field("attributes", &self.attributes)
            .field("migrate", &self.migrate.is_some())
            .field("is_eligible", &self.is_eligible.is_some())
            .finish_non_exhaustive()
    }
}

/// A registered kind of block.
#[derive(Clone)]
pub struct BlockType {
    /// `namespace/name`
    pub name: String,
    pub title: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub attributes: AttributeSchema,
    /// Feature flags; each value is a boolean or an object of options.
    pub supports: BTreeMap<String, Value>,
    pub transforms: Transforms,
    /// Previous shapes, most recent first.
    pub deprecated: Vec<Deprecation>,
    pub save: Option<SaveFn>,
    /// Only resolvable by its fully written name, never from an unprefixed
    /// delimiter.
    pub explicit_namespace: bool,
}

impl BlockType {
    /// Create a block type with no attributes and no save function.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            category: None,
            description: None,
            keywords: Vec::new(),
            attributes: AttributeSchema::new(),
            supports: BTreeMap::new(),
            transforms: Transforms::default(),
            deprecated: Vec::new(),
            save: None,
            explicit_namespace: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, definition: AttributeDefinition) -> Self {
        self.attributes.insert(key.into(), definition);
        self
    }

    pub fn with_support(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.supports.insert(key.into(), value.into());
        self
    }

    pub fn with_save<F>(mut self, save: F) -> Self
    where
        F: Fn(&Attributes) -> Result<String, SaveError> + Send + Sync + 'static,
    {
        self.save = Some(Arc::new(save));
        self
    }

    pub fn with_transform_from(mut self, transform: Transform) -> Self {
        self.transforms.from.push(transform);
        self
    }

    pub fn with_transform_to(mut self, transform: Transform) -> Self {
        self.transforms.to.push(transform);
        self
    }

    pub fn with_deprecation(mut self, deprecation: Deprecation) -> Self {
        self.deprecated.push(deprecation);
        self
    }

    pub fn with_explicit_namespace(mut self) -> Self {
        self.explicit_namespace = true;
        self
    }

    /// Whether a support flag is enabled. Absent flags use `default`.
    pub fn supports(&self, key: &str, default: bool) -> bool {
        match self.supports.get(key) {
            Some(Value::Bool(enabled)) => *enabled,
            Some(Value::Object(_)) => true,
            _ => default,
        }
    }

    /// The shape a deprecation describes: this type with the deprecation's
    /// schema and save function swapped in.
    ///
    /// A `className` attribute added by the registry carries over.
    pub fn deprecated_version(&self, deprecation: &Deprecation) -> BlockType {
        let mut attributes = deprecation
            .attributes
            .clone()
            .unwrap_or_else(|| self.attributes.clone());
        if let Some(class_name) = self.attributes.get(CLASS_NAME) {
            attributes
                .entry(CLASS_NAME.to_string())
                .or_insert_with(|| class_name.clone());
        }
        BlockType {
            attributes,
            save: Some(Arc::clone(&deprecation.save)),
            deprecated: Vec::new(),
            transforms: Transforms::default(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockType")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("keywords", &self.keywords)
            .field("attributes", &self.attributes)
            .field("supports", &self.supports)
            .field("transforms", &self.transforms)
            .field("deprecated", &self.deprecated)
            .field("save", &self.save.is_some())
            .field("explicit_namespace", &self.explicit_namespace)
            .finish()
    }
}

/// Serializable description of a block type, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct BlockTypeSummary<'a> {
    pub name: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub keywords: &'a [String],
    pub attributes: &'a AttributeSchema,
    pub supports: &'a BTreeMap<String, Value>,
    pub transforms: Vec<String>,
    pub deprecations: usize,
}

impl<'a> From<&'a BlockType> for BlockTypeSummary<'a> {
    fn from(block_type: &'a BlockType) -> Self {
        let transforms = block_type
            .transforms
            .from
            .iter()
            .map(|t| format!("from:{}", t.kind()))
            .chain(block_type.transforms.to.iter().map(|t| format!("to:{}", t.kind())))
            .collect();
        Self {
            name: &block_type.name,
            title: &block_type.title,
            category: block_type.category.as_deref(),
            description: block_type.description.as_deref(),
            keywords: &block_type.keywords,
            attributes: &block_type.attributes,
            supports: &block_type.supports,
            transforms,
            deprecations: block_type.deprecated.len(),
        }
    }
}
