//! Error types for tag appliers.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while constructing a tag applier or applying tags.
#[derive(Debug, Error)]
pub enum TagError {
    /// The subscription the applier should act under is not configured.
    #[error("AZURE_SUBSCRIPTION_ID is missing")]
    MissingSubscription,

    /// The resource-provider API version is not configured.
    #[error("AZURE_RESOURCE_API_VERSION is missing")]
    MissingApiVersion,

    /// No usable credential, or the token endpoint refused it.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Connection, TLS or protocol failure talking to the remote service.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("remote service returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// The long-running operation reached a terminal, unsuccessful state.
    #[error("operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    /// The remote service answered with something that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The caller stopped waiting for the operation.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl TagError {
    /// Whether this error reflects deployment setup rather than a failed call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingSubscription | Self::MissingApiVersion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(TagError::MissingSubscription.is_configuration());
        assert!(TagError::MissingApiVersion.is_configuration());
        assert!(!TagError::Authentication("no credential".into()).is_configuration());
        assert!(!TagError::DeadlineExceeded(Duration::from_secs(15)).is_configuration());
    }
}
