//! Error types for block-raw

/// Result type for block-raw operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in block-raw operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unknown raw handling mode {0:?}; expected auto, inline or blocks")]
    UnknownMode(String),
}
