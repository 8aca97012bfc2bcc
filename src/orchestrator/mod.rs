//! # Tag Orchestrator
//!
//! Turns a tag-apply intent bound to a registry entry into one bounded call to
//! a [`TagApplier`](crate::tagging::TagApplier), and shapes the outcome.
//!
//! A request moves through `Received -> Resolved -> Validated -> Applying`
//! and ends in either `Succeeded` or `Failed`. Nothing is retried, and the
//! registry record is never modified.

pub mod error;

pub use error::ApplyError;

use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::clients::ResourceRegistry;
use crate::model::{ResourceId, TagSet};
use crate::resource_actor::ResourceError;
use crate::tagging::{TagApplierFactory, TagError};

/// How long a single tag-apply waits for the remote side.
pub const DEFAULT_APPLY_DEADLINE: Duration = Duration::from_secs(15);

/// Successful result of a tag-apply request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyTagsOutcome {
    pub message: String,
    /// Remote identifier the tags were applied to.
    pub resource: String,
    pub tags: TagSet,
}

#[derive(Clone)]
pub struct TagOrchestrator {
    registry: ResourceRegistry,
    applier_factory: TagApplierFactory,
    deadline: Duration,
}

impl TagOrchestrator {
    pub fn new(registry: ResourceRegistry, applier_factory: TagApplierFactory) -> Self {
        Self {
            registry,
            applier_factory,
            deadline: DEFAULT_APPLY_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Applies `requested_tags` to the remote resource registered under `id`.
    ///
    /// An unknown `id` is reported before the tags are looked at. The applier
    /// is built fresh for this call and is only invoked once the record and
    /// the tags have both checked out.
    #[instrument(skip_all, fields(resource_id = %id))]
    pub async fn apply_tags_to_resource(
        &self,
        id: ResourceId,
        requested_tags: Option<TagSet>,
    ) -> Result<ApplyTagsOutcome, ApplyError> {
        debug!("Received");

        let record = self.registry.fetch(id).await.map_err(|e| match e {
            ResourceError::NotFound(id) => ApplyError::NotFound(id),
            other => ApplyError::Registry(other.to_string()),
        })?;
        debug!(remote_id = %record.remote_id, "Resolved");

        let tags = match requested_tags {
            Some(tags) if !tags.is_empty() => tags,
            _ => {
                debug!("Rejected: no tags");
                return Err(ApplyError::Validation("tags required".to_string()));
            }
        };
        debug!(tag_count = tags.len(), "Validated");

        let applier = (self.applier_factory)().map_err(|e| {
            warn!(error = %e, "Tag applier unavailable");
            ApplyError::Configuration(e)
        })?;

        debug!(deadline = ?self.deadline, "Applying");
        let result = timeout(self.deadline, applier.apply_tags(&record.remote_id, &tags)).await;
        match result {
            Ok(Ok(())) => {
                info!(remote_id = %record.remote_id, "Succeeded");
                Ok(ApplyTagsOutcome {
                    message: "tags applied".to_string(),
                    resource: record.remote_id,
                    tags,
                })
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed");
                Err(ApplyError::RemoteOperation(e))
            }
            Err(_) => {
                warn!(deadline = ?self.deadline, "Failed: deadline exceeded");
                Err(ApplyError::RemoteOperation(TagError::DeadlineExceeded(
                    self.deadline,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::FrameworkError;
    use crate::model::Resource;
    use crate::tagging::FakeTagApplier;
    use std::time::Instant;

    const REMOTE_ID: &str =
        "/subscriptions/x/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1";

    fn sample(id: &str) -> Resource {
        Resource {
            id: ResourceId::from(id),
            name: "vm-1".into(),
            tags: TagSet::new(),
            remote_id: REMOTE_ID.into(),
            created_at: 1_700_000_000,
        }
    }

    fn owner_tags() -> TagSet {
        let mut tags = TagSet::new();
        tags.insert("owner".into(), "a".into());
        tags
    }

    fn orchestrator(mock: &MockClient<Resource>, fake: &FakeTagApplier) -> TagOrchestrator {
        TagOrchestrator::new(ResourceRegistry::new(mock.client()), fake.factory())
    }

    #[tokio::test]
    async fn test_applies_tags_to_remote_id() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        let fake = FakeTagApplier::succeeding();

        let outcome = orchestrator(&mock, &fake)
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(owner_tags()))
            .await
            .unwrap();

        assert_eq!(outcome.message, "tags applied");
        assert_eq!(outcome.resource, REMOTE_ID);
        assert_eq!(outcome.tags, owner_tags());

        let calls = fake.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].remote_id, REMOTE_ID);
        assert_eq!(calls[0].tags, owner_tags());
        mock.verify();
    }

    #[tokio::test]
    async fn test_empty_or_absent_tags_never_reach_applier() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        let fake = FakeTagApplier::succeeding();
        let orchestrator = orchestrator(&mock, &fake);

        let empty = orchestrator
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(TagSet::new()))
            .await;
        assert!(matches!(empty, Err(ApplyError::Validation(ref m)) if m == "tags required"));

        let absent = orchestrator
            .apply_tags_to_resource(ResourceId::from("res_1"), None)
            .await;
        assert!(matches!(absent, Err(ApplyError::Validation(_))));

        assert_eq!(fake.factory_invocations(), 0);
        assert!(fake.calls().await.is_empty());
        mock.verify();
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_without_invoking_applier() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("missing")).return_ok(None);
        let fake = FakeTagApplier::succeeding();

        let result = orchestrator(&mock, &fake)
            .apply_tags_to_resource(ResourceId::from("missing"), Some(owner_tags()))
            .await;

        assert!(matches!(result, Err(ApplyError::NotFound(ref id)) if id == "missing"));
        assert!(fake.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_factory_failure_is_configuration_error() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        let fake = FakeTagApplier::unconfigured();

        let result = orchestrator(&mock, &fake)
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(owner_tags()))
            .await;

        match result {
            Err(ApplyError::Configuration(cause)) => assert!(cause.is_configuration()),
            other => panic!("expected configuration error, got {:?}", other),
        }
        assert!(fake.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_passed_through() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        let fake = FakeTagApplier::failing(409, "ScopeLocked");

        let result = orchestrator(&mock, &fake)
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(owner_tags()))
            .await;

        assert!(matches!(
            result,
            Err(ApplyError::RemoteOperation(TagError::Remote { status: 409, .. }))
        ));
    }

    #[tokio::test]
    async fn test_hanging_applier_hits_deadline() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        let fake = FakeTagApplier::hanging();
        let deadline = Duration::from_millis(100);

        let started = Instant::now();
        let result = orchestrator(&mock, &fake)
            .with_deadline(deadline)
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(owner_tags()))
            .await;
        let elapsed = started.elapsed();

        assert!(matches!(
            result,
            Err(ApplyError::RemoteOperation(TagError::DeadlineExceeded(d))) if d == deadline
        ));
        assert!(elapsed >= deadline);
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(fake.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_failure_is_not_not_found() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_get(ResourceId::from("res_1"))
            .return_err(FrameworkError::ActorClosed);
        let fake = FakeTagApplier::succeeding();

        let result = orchestrator(&mock, &fake)
            .apply_tags_to_resource(ResourceId::from("res_1"), Some(owner_tags()))
            .await;

        assert!(matches!(result, Err(ApplyError::Registry(_))));
    }

    #[test]
    fn test_default_deadline() {
        assert_eq!(DEFAULT_APPLY_DEADLINE, Duration::from_secs(15));
    }
}
