//! Error types for block-grammar

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Block attributes must be a JSON object, found: {found}")]
    AttributesNotObject { found: String },
}
