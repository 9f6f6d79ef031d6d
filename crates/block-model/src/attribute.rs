//! Attribute schemas: declared types, markup sources and defaults.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A block's attribute values, keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Attribute schema of a block type, keyed by attribute name.
pub type AttributeSchema = BTreeMap<String, AttributeDefinition>;

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Boolean,
    Object,
    Null,
    Array,
    Integer,
    Number,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Null => "null",
            Self::Array => "array",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "null" => Ok(Self::Null),
            "array" => Ok(Self::Array),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            other => Err(format!("Unknown attribute type: {other}")),
        }
    }
}

/// Where in a block's saved markup an attribute value lives.
///
/// Selectors are evaluated against the block's inner HTML; a missing
/// selector means the fragment itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum AttributeSource {
    /// An HTML attribute. For boolean attributes, its presence.
    Attribute {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        attribute: String,
    },
    /// A DOM-style property such as `textContent` or `nodeName`.
    Property {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        property: String,
    },
    /// Text content, without markup.
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    /// Inner HTML. With `multiline`, only the outer HTML of child elements
    /// with that tag, concatenated.
    Html {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        multiline: Option<String>,
    },
    /// Child nodes as a structured element tree.
    Children {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    /// The matched node as a structured element tree.
    Node {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    /// One object per matched element, built from a nested schema.
    Query {
        selector: String,
        query: AttributeSchema,
    },
    /// Lowercase tag name of the matched element.
    Tag {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    /// The block's inner HTML exactly as written.
    Raw,
}

impl AttributeSource {
    pub fn attribute(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::Attribute {
            selector: Some(selector.into()),
            attribute: attribute.into(),
        }
    }

    pub fn property(selector: impl Into<String>, property: impl Into<String>) -> Self {
        Self::Property {
            selector: Some(selector.into()),
            property: property.into(),
        }
    }

    pub fn text(selector: impl Into<String>) -> Self {
        Self::Text {
            selector: Some(selector.into()),
        }
    }

    pub fn html(selector: impl Into<String>) -> Self {
        Self::Html {
            selector: Some(selector.into()),
            multiline: None,
        }
    }

    pub fn multiline(selector: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::Html {
            selector: Some(selector.into()),
            multiline: Some(tag.into()),
        }
    }

    pub fn children(selector: impl Into<String>) -> Self {
        Self::Children {
            selector: Some(selector.into()),
        }
    }

    pub fn node(selector: impl Into<String>) -> Self {
        Self::Node {
            selector: Some(selector.into()),
        }
    }

    pub fn query(selector: impl Into<String>, query: AttributeSchema) -> Self {
        Self::Query {
            selector: selector.into(),
            query,
        }
    }

    pub fn tag(selector: impl Into<String>) -> Self {
        Self::Tag {
            selector: Some(selector.into()),
        }
    }

    /// Short name of the source kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Attribute { .. } => "attribute",
            Self::Property { .. } => "property",
            Self::Text { .. } => "text",
            Self::Html { .. } => "html",
            Self::Children { .. } => "children",
            Self::Node { .. } => "node",
            Self::Query { .. } => "query",
            Self::Tag { .. } => "tag",
            Self::Raw => "raw",
        }
    }

    /// Whether values from this source are element trees rather than scalars.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Children { .. } | Self::Node { .. })
    }
}

/// Declaration of one attribute of a block type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDefinition {
    #[serde(rename = "type")]
    pub kind: AttributeType,

    /// `None` stores the value in the comment header.
    #[serde(flatten)]
    pub source: Option<AttributeSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values. Anything else falls back to the default.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl AttributeDefinition {
    pub fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            source: None,
            default: None,
            allowed: None,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn boolean() -> Self {
        Self::new(AttributeType::Boolean)
    }

    pub fn number() -> Self {
        Self::new(AttributeType::Number)
    }

    pub fn integer() -> Self {
        Self::new(AttributeType::Integer)
    }

    pub fn array() -> Self {
        Self::new(AttributeType::Array)
    }

    pub fn object() -> Self {
        Self::new(AttributeType::Object)
    }

    pub fn with_source(mut self, source: AttributeSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the value is stored in the comment header.
    pub fn is_comment_attribute(&self) -> bool {
        self.source.is_none()
    }

    pub fn is_allowed(&self, value: &Value) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.contains(value))
    }
}
