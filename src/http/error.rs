//! Error type for the HTTP boundary.
//!
//! Every failure leaves the service as `{"error": "<message>"}` with the
//! status code chosen by [`ApiError::status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::orchestrator::ApplyError;
use crate::resource_actor::ResourceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid json")]
    InvalidJson,

    #[error("{0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("azure not configured: {0}")]
    NotConfigured(String),

    #[error("azure error: {0}")]
    Remote(String),

    #[error("request timeout")]
    Timeout,

    /// The detail is logged, never returned to the caller.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::Validation(_) | Self::NotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Remote(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(%detail, "Request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ResourceError> for ApiError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::NotFound(_) => Self::NotFound,
            ResourceError::ValidationError(msg) => Self::Validation(msg),
            ResourceError::ActorCommunicationError(msg) => Self::Internal(msg),
        }
    }
}

impl From<ApplyError> for ApiError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::NotFound(_) => Self::NotFound,
            ApplyError::Validation(msg) => Self::Validation(msg),
            ApplyError::Configuration(cause) => Self::NotConfigured(cause.to_string()),
            ApplyError::RemoteOperation(cause) => Self::Remote(cause.to_string()),
            ApplyError::Registry(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagging::TagError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ApplyError::Configuration(TagError::MissingSubscription)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ApplyError::RemoteOperation(TagError::DeadlineExceeded(
                Duration::from_secs(15)
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::from(ApplyError::Configuration(TagError::MissingSubscription)).to_string(),
            "azure not configured: AZURE_SUBSCRIPTION_ID is missing"
        );
        assert_eq!(
            ApiError::from(ApplyError::RemoteOperation(TagError::Remote {
                status: 403,
                body: "denied".into()
            }))
            .to_string(),
            "azure error: remote service returned 403: denied"
        );
        assert_eq!(
            ApiError::from(ResourceError::ActorCommunicationError("Actor closed".into()))
                .to_string(),
            "internal error"
        );
    }
}
