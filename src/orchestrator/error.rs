use thiserror::Error;

use crate::tagging::TagError;

/// Why a tag-apply request did not complete.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// No applier could be built; nothing was sent to the remote service.
    #[error("tagging not configured: {0}")]
    Configuration(#[source] TagError),

    #[error("remote operation failed: {0}")]
    RemoteOperation(#[source] TagError),

    #[error("registry unavailable: {0}")]
    Registry(String),
}
