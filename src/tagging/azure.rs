//! # Azure Resource Manager Tagger
//!
//! The production [`TagApplier`]. It issues an update-by-id `PATCH` against
//! Azure Resource Manager carrying only the `tags` property, then follows the
//! long-running operation protocol until the remote side reports a terminal
//! state.
//!
//! ## Configuration
//!
//! Read from the environment every time a tagger is built (see
//! [`AzureSettings::from_env`]):
//!
//! | Variable | Required | Purpose |
//! |---|---|---|
//! | `AZURE_SUBSCRIPTION_ID` | yes | Subscription the tagger acts under |
//! | `AZURE_RESOURCE_API_VERSION` | yes | `api-version` for the resource provider (e.g. `2021-04-01`) |
//! | `AZURE_ACCESS_TOKEN` | no | Pre-issued bearer token |
//! | `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` | no | Service principal (client-credentials flow) |
//! | `AZURE_FEDERATED_TOKEN_FILE` | no | Workload identity assertion, with tenant and client id |
//! | `IDENTITY_ENDPOINT`, `IDENTITY_HEADER` | no | Managed identity on App Service and Container Apps |
//! | `AZURE_MANAGEMENT_ENDPOINT` | no | Defaults to `https://management.azure.com` |
//! | `AZURE_AUTHORITY_HOST` | no | Defaults to `https://login.microsoftonline.com` |
//!
//! The first credential whose variables are all present wins, in the order
//! above. With none of them set the tagger falls back to managed identity
//! through the instance metadata service, passing `AZURE_CLIENT_ID` along for
//! a user-assigned identity.
//!
//! Credentials are resolved on each call, never cached, so rotated secrets
//! take effect on the next request.
//!
//! ## Long-running operations
//!
//! A `202 Accepted` answer, or a `201 Created` carrying a polling header, is
//! followed by polling, preferring the
//! `Azure-AsyncOperation` URL (JSON `status` field) over the `Location` URL
//! (`202` while running). `Retry-After` sets the pause between polls.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AsHeaderName, HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{TagApplier, TagError};
use crate::model::TagSet;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);
const JWT_BEARER_ASSERTION: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
const IMDS_API_VERSION: &str = "2018-02-01";
const IDENTITY_ENDPOINT_API_VERSION: &str = "2019-08-01";

// =============================================================================
// SETTINGS
// =============================================================================

/// Where the bearer token for Resource Manager comes from.
#[derive(Clone, PartialEq)]
pub enum Credential {
    AccessToken(String),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Federated token file exchanged as a client assertion (AKS workload identity).
    WorkloadIdentity {
        tenant_id: String,
        client_id: String,
        token_file: PathBuf,
    },
    /// `client_id` selects a user-assigned identity; `None` means system-assigned.
    ManagedIdentity {
        client_id: Option<String>,
        source: ManagedIdentitySource,
    },
}

/// Token endpoint a managed identity is served from.
#[derive(Clone, PartialEq)]
pub enum ManagedIdentitySource {
    /// `IDENTITY_ENDPOINT` plus its shared-secret `IDENTITY_HEADER`.
    IdentityEndpoint { endpoint: String, header: String },
    /// Instance metadata service.
    Imds { endpoint: String },
}

impl Default for ManagedIdentitySource {
    fn default() -> Self {
        Self::Imds {
            endpoint: IMDS_TOKEN_ENDPOINT.to_string(),
        }
    }
}

impl fmt::Debug for ManagedIdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityEndpoint { endpoint, .. } => f
                .debug_struct("IdentityEndpoint")
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            Self::Imds { endpoint } => f.debug_struct("Imds").field("endpoint", endpoint).finish(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::WorkloadIdentity {
                tenant_id,
                client_id,
                token_file,
            } => f
                .debug_struct("WorkloadIdentity")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("token_file", token_file)
                .finish(),
            Self::ManagedIdentity { client_id, source } => f
                .debug_struct("ManagedIdentity")
                .field("client_id", client_id)
                .field("source", source)
                .finish(),
        }
    }
}

/// Snapshot of the Azure configuration at the time a tagger is built.
#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub subscription_id: Option<String>,
    pub api_version: Option<String>,
    pub management_endpoint: String,
    pub authority_host: String,
    pub credential: Credential,
}

impl AzureSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credential = match var("AZURE_ACCESS_TOKEN") {
            Some(token) => Credential::AccessToken(token),
            None => match (
                var("AZURE_TENANT_ID"),
                var("AZURE_CLIENT_ID"),
                var("AZURE_CLIENT_SECRET"),
                var("AZURE_FEDERATED_TOKEN_FILE"),
            ) {
                (Some(tenant_id), Some(client_id), Some(client_secret), _) => {
                    Credential::ClientSecret {
                        tenant_id,
                        client_id,
                        client_secret,
                    }
                }
                (Some(tenant_id), Some(client_id), None, Some(token_file)) => {
                    Credential::WorkloadIdentity {
                        tenant_id,
                        client_id,
                        token_file: PathBuf::from(token_file),
                    }
                }
                (_, client_id, _, _) => Credential::ManagedIdentity {
                    client_id,
                    source: match (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
                        (Some(endpoint), Some(header)) => {
                            ManagedIdentitySource::IdentityEndpoint { endpoint, header }
                        }
                        _ => ManagedIdentitySource::default(),
                    },
                },
            },
        };

        Self {
            subscription_id: var("AZURE_SUBSCRIPTION_ID"),
            api_version: var("AZURE_RESOURCE_API_VERSION"),
            management_endpoint: var("AZURE_MANAGEMENT_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string()),
            authority_host: var("AZURE_AUTHORITY_HOST")
                .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
            credential,
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct TagPatch<'a> {
    tags: &'a TagSet,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatusBody {
    status: String,
    #[serde(default)]
    error: Option<OperationErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OperationErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, PartialEq, Eq)]
enum OperationState {
    Succeeded,
    Failed { status: String, message: String },
    InProgress,
}

impl OperationState {
    fn from_body(body: OperationStatusBody) -> Self {
        let status = body.status;
        if status.eq_ignore_ascii_case("Succeeded") {
            return Self::Succeeded;
        }
        let terminal = ["Failed", "Canceled", "Cancelled"]
            .iter()
            .any(|s| status.eq_ignore_ascii_case(s));
        if !terminal {
            return Self::InProgress;
        }
        let message = match body.error {
            Some(e) if !e.code.is_empty() => format!("{}: {}", e.code, e.message),
            Some(e) => e.message,
            None => String::new(),
        };
        Self::Failed { status, message }
    }
}

/// The URL to poll for a long-running update.
#[derive(Debug, Clone, PartialEq)]
enum PendingOperation {
    AsyncOperation(String),
    Location(String),
}

impl PendingOperation {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        header_str(headers, ASYNC_OPERATION_HEADER)
            .map(Self::AsyncOperation)
            .or_else(|| header_str(headers, LOCATION).map(Self::Location))
    }

    fn url(&self) -> &str {
        match self {
            Self::AsyncOperation(url) | Self::Location(url) => url,
        }
    }
}

fn header_str<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_POLL_INTERVAL))
}

/// Sends a token request. Every failure here is an authentication failure.
async fn request_token(request: RequestBuilder) -> Result<String, TagError> {
    let response = request
        .send()
        .await
        .map_err(|e| TagError::Authentication(format!("token request failed: {e}")))?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(TagError::Authentication(format!(
            "token endpoint returned {status}: {body}"
        )));
    }
    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| TagError::Authentication(e.to_string()))?;
    Ok(token.access_token)
}

async fn remote_error(response: Response) -> TagError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TagError::Remote { status, body }
}

// =============================================================================
// THE TAGGER
// =============================================================================

/// Applies tags through Azure Resource Manager.
pub struct AzureTagger {
    http: Client,
    subscription_id: String,
    api_version: String,
    management_endpoint: String,
    authority_host: String,
    credential: Credential,
}

impl AzureTagger {
    /// Builds a tagger, failing with a configuration error if the
    /// subscription or API version is absent.
    pub fn new(settings: AzureSettings) -> Result<Self, TagError> {
        let subscription_id = settings
            .subscription_id
            .ok_or(TagError::MissingSubscription)?;
        let api_version = settings.api_version.ok_or(TagError::MissingApiVersion)?;
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            subscription_id,
            api_version,
            management_endpoint: settings.management_endpoint,
            authority_host: settings.authority_host,
            credential: settings.credential,
        })
    }

    fn resource_url(&self, remote_id: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.management_endpoint.trim_end_matches('/'),
            remote_id.trim_start_matches('/'),
            self.api_version
        )
    }

    fn authority_token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            tenant_id
        )
    }

    async fn acquire_token(&self) -> Result<String, TagError> {
        let resource = self.management_endpoint.trim_end_matches('/');
        let scope = format!("{resource}/.default");

        let request = match &self.credential {
            Credential::AccessToken(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => {
                debug!(%tenant_id, "Requesting token with client secret");
                self.http.post(self.authority_token_url(tenant_id)).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", scope.as_str()),
                ])
            }
            Credential::WorkloadIdentity {
                tenant_id,
                client_id,
                token_file,
            } => {
                let assertion = tokio::fs::read_to_string(token_file).await.map_err(|e| {
                    TagError::Authentication(format!(
                        "cannot read federated token file {}: {e}",
                        token_file.display()
                    ))
                })?;
                debug!(%tenant_id, "Requesting token with federated assertion");
                self.http.post(self.authority_token_url(tenant_id)).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_assertion_type", JWT_BEARER_ASSERTION),
                    ("client_assertion", assertion.trim()),
                    ("scope", scope.as_str()),
                ])
            }
            Credential::ManagedIdentity { client_id, source } => {
                let (request, api_version) = match source {
                    ManagedIdentitySource::IdentityEndpoint { endpoint, header } => (
                        self.http.get(endpoint).header("X-IDENTITY-HEADER", header),
                        IDENTITY_ENDPOINT_API_VERSION,
                    ),
                    ManagedIdentitySource::Imds { endpoint } => {
                        (self.http.get(endpoint).header("Metadata", "true"), IMDS_API_VERSION)
                    }
                };
                debug!(?source, "Requesting managed identity token");
                let mut query = vec![("api-version", api_version), ("resource", resource)];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                request.query(&query)
            }
        };

        request_token(request).await
    }

    async fn poll_until_done(
        &self,
        operation: PendingOperation,
        token: &str,
        mut delay: Duration,
    ) -> Result<(), TagError> {
        debug!(?operation, "Waiting for long-running operation");
        loop {
            tokio::time::sleep(delay).await;
            let response = self
                .http
                .get(operation.url())
                .bearer_auth(token)
                .send()
                .await?;
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(DEFAULT_POLL_INTERVAL);

            match operation {
                PendingOperation::AsyncOperation(_) => {
                    if !status.is_success() {
                        return Err(remote_error(response).await);
                    }
                    let body: OperationStatusBody = response
                        .json()
                        .await
                        .map_err(|e| TagError::InvalidResponse(e.to_string()))?;
                    match OperationState::from_body(body) {
                        OperationState::Succeeded => return Ok(()),
                        OperationState::Failed { status, message } => {
                            return Err(TagError::OperationFailed { status, message })
                        }
                        OperationState::InProgress => debug!("Operation still running"),
                    }
                }
                PendingOperation::Location(_) => {
                    if status == StatusCode::ACCEPTED {
                        debug!("Operation still running");
                    } else if status.is_success() {
                        return Ok(());
                    } else {
                        return Err(remote_error(response).await);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl TagApplier for AzureTagger {
    #[instrument(skip(self, tags), fields(subscription = %self.subscription_id, tag_count = tags.len()))]
    async fn apply_tags(&self, remote_id: &str, tags: &TagSet) -> Result<(), TagError> {
        let token = self.acquire_token().await?;
        let url = self.resource_url(remote_id);
        debug!(%url, "Submitting tag update");

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&token)
            .json(&TagPatch { tags })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(response).await);
        }

        // 201 may also hand back a long-running operation
        let pending = if status == StatusCode::ACCEPTED || status == StatusCode::CREATED {
            PendingOperation::from_headers(response.headers())
        } else {
            None
        };
        match pending {
            Some(operation) => {
                let delay = retry_after(response.headers()).unwrap_or(DEFAULT_POLL_INTERVAL);
                self.poll_until_done(operation, &token, delay).await?;
            }
            None if status == StatusCode::ACCEPTED => {
                warn!("Accepted without a polling url, treating as complete");
            }
            None => {}
        }

        info!("Tags applied");
        Ok(())
    }
}
