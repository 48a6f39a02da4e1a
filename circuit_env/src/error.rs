//! Error types for the circuit environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The data source does not exist or cannot be reached
    #[error("Source unreachable: {0}")]
    SourceUnreachable(String),
    
    /// Reading the data source failed
    #[error("I/O error on {source_name}: {message}")]
    Io {
        source_name: String,
        message: String,
    },
}

impl EnvError {
    /// Creates an unreachable error.
    pub fn unreachable(source: impl std::fmt::Display) -> Self {
        Self::SourceUnreachable(source.to_string())
    }
    
    /// Creates an I/O error for the given source.
    pub fn io(source: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io {
            source_name: source.to_string(),
            message: err.to_string(),
        }
    }
}
