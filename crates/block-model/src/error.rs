//! Error types for block-model

/// Result type for block-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in block-model operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("HTML error: {0}")]
    Html(#[from] block_html::Error),

    #[error("Grammar error: {0}")]
    Grammar(#[from] block_grammar::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a block type is refused by the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error(
        "Block names must contain a namespace prefix, include only lowercase alphanumeric characters or dashes, and start with a letter. Example: my-plugin/my-custom-block (got {name:?})"
    )]
    InvalidName { name: String },

    #[error("Block \"{name}\" is already registered.")]
    AlreadyRegistered { name: String },

    #[error("Block \"{name}\" is not registered.")]
    NotRegistered { name: String },

    #[error("The \"save\" property of block \"{name}\" must be a valid function.")]
    MissingSave { name: String },

    #[error("The block \"{name}\" has an invalid \"{key}\" support flag; expected a boolean or an object.")]
    InvalidSupport { name: String, key: String },

    #[error("The block \"{name}\" can have a maximum of 3 keywords, found {count}.")]
    TooManyKeywords { name: String, count: usize },

    #[error("The block \"{name}\" must have a category.")]
    MissingCategory { name: String },

    #[error("The block \"{name}\" must have a registered category (got \"{category}\").")]
    UnknownCategory { name: String, category: String },

    #[error("The block \"{name}\" must have a title.")]
    MissingTitle { name: String },
}

/// Failure of a block type's save function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("Save function failed: {message}")]
    Failed { message: String },

    #[error("Save function panicked: {message}")]
    Panicked { message: String },

    #[error("Block type \"{name}\" is not registered")]
    UnknownType { name: String },
}

impl SaveError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
