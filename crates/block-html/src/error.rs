//! Error types for block-html

/// Result type for block-html operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in block-html operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("Unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

impl Error {
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
