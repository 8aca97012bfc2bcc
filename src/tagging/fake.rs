//! # Recording Tag Applier
//!
//! An in-process [`TagApplier`] for tests. It records every invocation and
//! answers according to a scripted [`FakeBehavior`], so orchestration and HTTP
//! tests can run without Azure. An [`unconfigured`](FakeTagApplier::unconfigured)
//! fake fails in its factory instead, so no applier is ever built.
//!
//! ```ignore
//! let fake = FakeTagApplier::succeeding();
//! let orchestrator = TagOrchestrator::new(registry, fake.factory());
//! // ...
//! assert_eq!(fake.calls().await.len(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{TagApplier, TagApplierFactory, TagError};
use crate::model::TagSet;

/// How a built applier answers `apply_tags`.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    Succeed,
    /// Fails every call with [`TagError::Remote`].
    FailRemote { status: u16, body: String },
    /// Never completes.
    Hang,
}

/// One recorded `apply_tags` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTags {
    pub remote_id: String,
    pub tags: TagSet,
}

#[derive(Clone)]
pub struct FakeTagApplier {
    behavior: FakeBehavior,
    /// When false the factory fails as if the subscription were not set.
    configured: bool,
    calls: Arc<Mutex<Vec<AppliedTags>>>,
    built: Arc<AtomicUsize>,
}

impl FakeTagApplier {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            configured: true,
            calls: Arc::new(Mutex::new(Vec::new())),
            built: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FakeBehavior::Succeed)
    }

    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::new(FakeBehavior::FailRemote {
            status,
            body: body.into(),
        })
    }

    pub fn hanging() -> Self {
        Self::new(FakeBehavior::Hang)
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::succeeding()
        }
    }

    /// A factory handing out this fake. Every applier it builds shares the call log.
    pub fn factory(&self) -> TagApplierFactory {
        let fake = self.clone();
        Arc::new(move || {
            fake.built.fetch_add(1, Ordering::SeqCst);
            if !fake.configured {
                return Err(TagError::MissingSubscription);
            }
            Ok(Arc::new(fake.clone()) as Arc<dyn TagApplier>)
        })
    }

    pub async fn calls(&self) -> Vec<AppliedTags> {
        self.calls.lock().await.clone()
    }

    /// How many times the factory was asked for an applier.
    pub fn factory_invocations(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagApplier for FakeTagApplier {
    async fn apply_tags(&self, remote_id: &str, tags: &TagSet) -> Result<(), TagError> {
        self.calls.lock().await.push(AppliedTags {
            remote_id: remote_id.to_string(),
            tags: tags.clone(),
        });

        match &self.behavior {
            FakeBehavior::Succeed => Ok(()),
            FakeBehavior::FailRemote { status, body } => Err(TagError::Remote {
                status: *status,
                body: body.clone(),
            }),
            FakeBehavior::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> TagSet {
        let mut tags = TagSet::new();
        tags.insert("env".into(), "dev".into());
        tags
    }

    #[tokio::test]
    async fn test_records_calls_through_factory() {
        let fake = FakeTagApplier::succeeding();
        let factory = fake.factory();

        let applier = factory().unwrap();
        applier.apply_tags("/subscriptions/x/vm-1", &tags()).await.unwrap();

        assert_eq!(fake.factory_invocations(), 1);
        assert_eq!(
            fake.calls().await,
            vec![AppliedTags {
                remote_id: "/subscriptions/x/vm-1".into(),
                tags: tags()
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_returns_remote_error() {
        let fake = FakeTagApplier::failing(409, "locked");
        let applier = fake.factory()().unwrap();

        let err = applier.apply_tags("/x", &tags()).await.unwrap_err();
        assert!(matches!(err, TagError::Remote { status: 409, .. }));
        assert_eq!(fake.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_factory_fails() {
        let fake = FakeTagApplier::unconfigured();
        let result = fake.factory()();

        assert!(matches!(result, Err(TagError::MissingSubscription)));
        assert_eq!(fake.factory_invocations(), 1);
        assert!(fake.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_applier_is_recorded_before_it_stalls() {
        let fake = FakeTagApplier::hanging();
        let applier = fake.factory()().unwrap();

        let stalled = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            applier.apply_tags("/x", &tags()),
        )
        .await;

        assert!(stalled.is_err());
        assert_eq!(fake.calls().await.len(), 1);
    }
}
