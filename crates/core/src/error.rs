//! Error types for Agora.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM backends, knowledge indexing
//! and retrieval, and debate orchestration.

use thiserror::Error;

/// Unified error type for Agora.
///
/// Library functions return `Result<T, AppError>`. The soft-failure
/// boundaries (search, completion, debate) log and degrade instead of
/// surfacing these to the end user.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM backend errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Corpus, embedding, and vector index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Debate orchestration errors
    #[error("Debate error: {0}")]
    Debate(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
