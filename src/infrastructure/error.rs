//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure reported by a child source while lazily loading a node.
///
/// Always recoverable: the node falls back to Collapsed-Unloaded and the
/// user may toggle it again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("children of {node_id} unavailable: {reason}")]
    Unavailable { node_id: String, reason: String },

    #[error("fetching children of {node_id} timed out after {after_ms}ms")]
    TimedOut { node_id: String, after_ms: u64 },

    #[error("child source failed: {0}")]
    Backend(String),
}

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
