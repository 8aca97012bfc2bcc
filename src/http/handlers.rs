use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::ApiError;
use crate::clients::{RegistryClient, ResourceRegistry};
use crate::model::{Resource, ResourceCreate, ResourceId, TagSet};
use crate::orchestrator::{ApplyTagsOutcome, TagOrchestrator};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: ResourceRegistry,
    pub orchestrator: TagOrchestrator,
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceBody {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "azureId")]
    pub azure_id: String,
    #[serde(default)]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyTagsBody {
    #[serde(default)]
    pub tags: Option<TagSet>,
}

// Bodies are decoded by hand so a malformed payload is always a 400.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected body");
        ApiError::InvalidJson
    })
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn create_resource(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body: CreateResourceBody = parse_body(&body)?;
    let params = ResourceCreate::new(body.name, body.azure_id, body.tags.unwrap_or_default());
    params.validate()?;

    let resource = state.registry.create_resource(params).await?;
    info!(resource_id = %resource.id, "Resource registered");
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn list_resources(State(state): State<AppState>) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(state.registry.list().await?))
}

pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    Ok(Json(state.registry.fetch(ResourceId::from(id)).await?))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(ResourceId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn apply_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApplyTagsOutcome>, ApiError> {
    let id = ResourceId::from(id);
    let body: ApplyTagsBody = match parse_body(&body) {
        Ok(body) => body,
        Err(invalid) => {
            // An unknown id wins over a malformed body.
            state.registry.fetch(id).await?;
            return Err(invalid);
        }
    };

    let outcome = state
        .orchestrator
        .apply_tags_to_resource(id, body.tags)
        .await?;
    Ok(Json(outcome))
}
