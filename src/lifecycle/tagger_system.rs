use std::time::Duration;

use axum::Router;
use tracing::{error, info};

use crate::clients::ResourceRegistry;
use crate::http::{self, AppState};
use crate::orchestrator::{TagOrchestrator, DEFAULT_APPLY_DEADLINE};
use crate::tagging::TagApplierFactory;

/// The running service: registry actor plus the orchestrator built on it.
///
/// # Example
///
/// ```ignore
/// let system = TaggerSystem::new(azure_factory());
/// let app = system.router();
/// axum::serve(listener, app).await?;
/// system.shutdown().await?;
/// ```
pub struct TaggerSystem {
    pub registry: ResourceRegistry,
    pub orchestrator: TagOrchestrator,

    /// Task handles for running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TaggerSystem {
    /// Starts the system with the default apply deadline.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(applier_factory: TagApplierFactory) -> Self {
        Self::with_deadline(applier_factory, DEFAULT_APPLY_DEADLINE)
    }

    pub fn with_deadline(applier_factory: TagApplierFactory, deadline: Duration) -> Self {
        let (registry_actor, registry_handle) = crate::resource_actor::new();
        let registry_task = tokio::spawn(registry_actor.run());

        let registry = ResourceRegistry::new(registry_handle);
        let orchestrator =
            TagOrchestrator::new(registry.clone(), applier_factory).with_deadline(deadline);

        info!(deadline = ?deadline, "Tagger system started");
        Self {
            registry,
            orchestrator,
            handles: vec![registry_task],
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            registry: self.registry.clone(),
            orchestrator: self.orchestrator.clone(),
        }
    }

    pub fn router(&self) -> Router {
        http::router(self.app_state())
    }

    /// Drops the system's clients and waits for the actor tasks to finish.
    ///
    /// Returns an error if any actor task panicked.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        drop(self.orchestrator);
        drop(self.registry);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::RegistryClient;
    use crate::model::{ResourceCreate, TagSet};
    use crate::tagging::FakeTagApplier;

    #[tokio::test]
    async fn test_start_use_and_shutdown() {
        let fake = FakeTagApplier::succeeding();
        let system = TaggerSystem::new(fake.factory());
        assert_eq!(system.orchestrator.deadline(), DEFAULT_APPLY_DEADLINE);

        let created = system
            .registry
            .create_resource(ResourceCreate::new("vm-1", "/subscriptions/x/vm-1", TagSet::new()))
            .await
            .unwrap();
        assert_eq!(system.registry.list().await.unwrap(), vec![created]);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_router_to_drop() {
        let system = TaggerSystem::new(FakeTagApplier::succeeding().factory());
        let router = system.router();
        drop(router);

        tokio::time::timeout(Duration::from_secs(5), system.shutdown())
            .await
            .expect("shutdown should not hang once the router is gone")
            .unwrap();
    }
}
