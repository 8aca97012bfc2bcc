//! # HTTP Surface
//!
//! JSON REST API over the registry and the tag orchestrator.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | `GET` | `/health` | [`handlers::health`] |
//! | `POST` | `/v1/resources` | [`handlers::create_resource`] |
//! | `GET` | `/v1/resources` | [`handlers::list_resources`] |
//! | `GET` | `/v1/resources/:id` | [`handlers::get_resource`] |
//! | `DELETE` | `/v1/resources/:id` | [`handlers::delete_resource`] |
//! | `POST` | `/v1/resources/:id/apply-tags` | [`handlers::apply_tags`] |
//!
//! Every request runs inside a `request` span carrying the method, path and
//! request id. The id is taken from `x-request-id` when the caller sends one
//! and generated otherwise; either way it is echoed on the response. A handler
//! that panics is answered with 500 `{"error":"internal error"}` and the
//! process keeps serving.

pub mod error;
pub mod handlers;

pub use error::ApiError;
pub use handlers::AppState;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::FutureExt;
use tokio::time::timeout;
use tracing::{error, info, info_span, warn, Instrument};

/// Upper bound on the time spent serving one request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .route(
            "/resources",
            post(handlers::create_resource).get(handlers::list_resources),
        )
        .route(
            "/resources/:id",
            get(handlers::get_resource).delete(handlers::delete_resource),
        )
        .route("/resources/:id/apply-tags", post(handlers::apply_tags));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/v1", v1)
        .with_state(state)
        .layer(middleware::from_fn(request_context))
}

/// Request id, trace span, timeout and panic recovery for every route.
async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    );

    async move {
        let started = Instant::now();
        let handled = AssertUnwindSafe(next.run(req)).catch_unwind();
        let mut response = match timeout(REQUEST_TIMEOUT, handled).await {
            Ok(Ok(response)) => response,
            Ok(Err(panic)) => {
                error!(panic = %panic_message(&*panic), "Handler panicked");
                ApiError::Internal("handler panicked".to_string()).into_response()
            }
            Err(_) => {
                warn!(timeout = ?REQUEST_TIMEOUT, "Request timed out");
                ApiError::Timeout.into_response()
            }
        };
        if let Some(value) = header {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
