//! Error types for the kvdemos crate.

use thiserror::Error;

/// Main error type for kvdemos operations.
#[derive(Error, Debug)]
pub enum KvDemoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors returned by the key-value store or its client
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for KvDemoError {
    fn from(e: ::config::ConfigError) -> Self {
        KvDemoError::Config(e.to_string())
    }
}

/// Result type alias for kvdemos operations.
pub type Result<T> = std::result::Result<T, KvDemoError>;
