//! # Tag Applier Capability
//!
//! The single capability the orchestrator depends on. Anything that can push a
//! [`TagSet`] onto a remote resource implements [`TagApplier`]; the orchestrator
//! never sees a concrete remote-service client.

use std::sync::Arc;

use async_trait::async_trait;

use super::azure::{AzureSettings, AzureTagger};
use super::TagError;
use crate::model::TagSet;

/// Applies tags to a remote resource and waits for the remote side to finish.
///
/// Implementations do not impose a deadline of their own. Callers bound the
/// wait (e.g. with `tokio::time::timeout`); dropping the returned future stops
/// the wait but does not cancel the remote operation.
#[async_trait]
pub trait TagApplier: Send + Sync {
    async fn apply_tags(&self, remote_id: &str, tags: &TagSet) -> Result<(), TagError>;
}

/// Builds a [`TagApplier`] for one request.
///
/// Called once per tag-apply request so that configuration and credentials
/// are picked up fresh every time.
pub type TagApplierFactory =
    Arc<dyn Fn() -> Result<Arc<dyn TagApplier>, TagError> + Send + Sync>;

/// Factory for the production applier, configured from the process environment.
pub fn azure_factory() -> TagApplierFactory {
    Arc::new(|| {
        let tagger = AzureTagger::new(AzureSettings::from_env())?;
        Ok(Arc::new(tagger) as Arc<dyn TagApplier>)
    })
}
