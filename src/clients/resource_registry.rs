//! # Resource Registry Client
//!
//! Provides a high-level API for the `Resource` registry actor.
//! It wraps a `RegistryHandle<Resource>` and exposes domain-specific methods.
use crate::clients::registry_client::RegistryClient;
use crate::framework::{FrameworkError, RegistryHandle};
use crate::model::{Resource, ResourceCreate, ResourceId};
use crate::resource_actor::ResourceError;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Resource registry.
#[derive(Clone)]
pub struct ResourceRegistry {
    inner: RegistryHandle<Resource>,
}

impl ResourceRegistry {
    pub fn new(inner: RegistryHandle<Resource>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RegistryClient<Resource> for ResourceRegistry {
    type Error = ResourceError;

    fn inner(&self) -> &RegistryHandle<Resource> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => ResourceError::NotFound(id),
            other => ResourceError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl ResourceRegistry {
    /// Stores a new resource and returns the full record, including its generated id.
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_resource(&self, params: ResourceCreate) -> Result<Resource, ResourceError> {
        debug!(?params, "Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Like [`RegistryClient::get`], but absence is an error.
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: ResourceId) -> Result<Resource, ResourceError> {
        let missing = id.to_string();
        self.get(id)
            .await?
            .ok_or(ResourceError::NotFound(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_client, expect_delete, expect_get};
    use crate::model::TagSet;

    fn sample(id: &str) -> Resource {
        Resource {
            id: ResourceId::from(id),
            name: "vm-1".into(),
            tags: TagSet::new(),
            remote_id: "/subscriptions/x/vm-1".into(),
            created_at: 1,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_record() {
        let (client, mut receiver) = create_mock_client::<Resource>(10);
        let registry = ResourceRegistry::new(client);

        let fetch_task =
            tokio::spawn(async move { registry.fetch(ResourceId::from("res_1")).await });

        let (id, responder) = expect_get(&mut receiver)
            .await
            .expect("Expected Get request");
        assert_eq!(id, ResourceId::from("res_1"));
        responder.send(Ok(Some(sample("res_1")))).unwrap();

        let result = fetch_task.await.unwrap();
        assert_eq!(result.unwrap(), sample("res_1"));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let (client, mut receiver) = create_mock_client::<Resource>(10);
        let registry = ResourceRegistry::new(client);

        let fetch_task =
            tokio::spawn(async move { registry.fetch(ResourceId::from("missing")).await });

        let (_, responder) = expect_get(&mut receiver)
            .await
            .expect("Expected Get request");
        responder.send(Ok(None)).unwrap();

        let result = fetch_task.await.unwrap();
        assert_eq!(result, Err(ResourceError::NotFound("missing".into())));
    }

    #[tokio::test]
    async fn test_delete_maps_not_found() {
        let (client, mut receiver) = create_mock_client::<Resource>(10);
        let registry = ResourceRegistry::new(client);

        let delete_task =
            tokio::spawn(async move { registry.delete(ResourceId::from("gone")).await });

        let (id, responder) = expect_delete(&mut receiver)
            .await
            .expect("Expected Delete request");
        responder
            .send(Err(FrameworkError::NotFound(id.to_string())))
            .unwrap();

        let result = delete_task.await.unwrap();
        assert_eq!(result, Err(ResourceError::NotFound("gone".into())));
    }

    #[tokio::test]
    async fn test_stopped_actor_is_communication_error() {
        let (client, receiver) = create_mock_client::<Resource>(10);
        drop(receiver);
        let registry = ResourceRegistry::new(client);

        let result = registry.list().await;
        assert!(matches!(
            result,
            Err(ResourceError::ActorCommunicationError(_))
        ));
    }
}
