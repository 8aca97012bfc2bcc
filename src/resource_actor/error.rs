//! Error types for the Resource registry.

use thiserror::Error;

/// Errors that can occur during resource registry operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource data provided is invalid.
    #[error("{0}")]
    ValidationError(String),

    /// An error occurred while communicating with the registry actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
