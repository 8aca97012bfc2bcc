//! # Mock Framework
//!
//! Utilities for testing registry clients in isolation.
//!
//! Use [`MockClient`] for the fluent expectation API, or [`create_mock_client`]
//! to get a handle plus the raw receiver and answer requests by hand with
//! helpers like [`expect_get`] or [`expect_create`].
//!
//! ## When to use Mocks vs the Real Actor
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | No real state (expectations) | Real table |
//! | **Use Case** | Logic *around* the registry (orchestration) | The registry itself, full system |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires a stopped actor) |

use crate::framework::{FrameworkError, RegistryEntity, RegistryHandle, RegistryRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the canned response for it.
enum Expectation<T: RegistryEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock registry with ordered expectation tracking.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<Resource>::new();
/// mock.expect_get(id.clone()).return_ok(Some(resource));
///
/// let registry = ResourceRegistry::new(mock.client());
/// // Use registry in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
///
/// A request that does not match the next expectation (wrong kind, wrong id,
/// or no expectation left) panics the mock task, which surfaces to the caller
/// as [`FrameworkError::ActorDropped`].
pub struct MockClient<T: RegistryEntity> {
    client: RegistryHandle<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: RegistryEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RegistryEntity> MockClient<T> {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<RegistryRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        RegistryRequest::Get { id, respond_to },
                        Some(Expectation::Get {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "get called with unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (
                        RegistryRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (RegistryRequest::List { respond_to }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        RegistryRequest::Delete { id, respond_to },
                        Some(Expectation::Delete {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "delete called with unexpected id");
                        let _ = respond_to.send(response);
                    }
                    _ => {
                        panic!("Unexpected request or expectation mismatch");
                    }
                }
            }
        });

        Self {
            client: RegistryHandle::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the handle for use in tests.
    pub fn client(&self) -> RegistryHandle<T> {
        self.client.clone()
    }

    /// Expects a `get` operation for `id`.
    pub fn expect_get(&mut self, id: T::Id) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> CreateExpectationBuilder<T> {
        CreateExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `list` operation.
    pub fn expect_list(&mut self) -> ListExpectationBuilder<T> {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `delete` operation for `id`.
    pub fn expect_delete(&mut self, id: T::Id) -> DeleteExpectationBuilder<T> {
        DeleteExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder for `get` expectations.
pub struct GetExpectationBuilder<T: RegistryEntity> {
    id: T::Id,
    expectations: Expectations<T>,
}

impl<T: RegistryEntity> GetExpectationBuilder<T> {
    pub fn return_ok(self, value: Option<T>) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Option<T>, FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Get {
                id: self.id,
                response,
            });
    }
}

/// Builder for `create` expectations.
pub struct CreateExpectationBuilder<T: RegistryEntity> {
    expectations: Expectations<T>,
}

impl<T: RegistryEntity> CreateExpectationBuilder<T> {
    pub fn return_ok(self, record: T) {
        self.push(Ok(record));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Create { response });
    }
}

/// Builder for `list` expectations.
pub struct ListExpectationBuilder<T: RegistryEntity> {
    expectations: Expectations<T>,
}

impl<T: RegistryEntity> ListExpectationBuilder<T> {
    pub fn return_ok(self, records: Vec<T>) {
        self.push(Ok(records));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Vec<T>, FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::List { response });
    }
}

/// Builder for `delete` expectations.
pub struct DeleteExpectationBuilder<T: RegistryEntity> {
    id: T::Id,
    expectations: Expectations<T>,
}

impl<T: RegistryEntity> DeleteExpectationBuilder<T> {
    pub fn return_ok(self) {
        self.push(Ok(()));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<(), FrameworkError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Delete {
                id: self.id,
                response,
            });
    }
}

// =============================================================================
// RAW CHANNEL HELPERS
// =============================================================================

/// Creates a handle wired to a receiver the test controls.
///
/// The test inspects each message arriving on `receiver` and answers through
/// its `respond_to` channel, which makes it possible to assert on the exact
/// payload sent and to simulate delays.
pub fn create_mock_client<T: RegistryEntity>(
    buffer_size: usize,
) -> (RegistryHandle<T>, mpsc::Receiver<RegistryRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RegistryHandle::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request.
pub async fn expect_create<T: RegistryEntity>(
    receiver: &mut mpsc::Receiver<RegistryRequest<T>>,
) -> Option<(T::Create, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(RegistryRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request.
pub async fn expect_get<T: RegistryEntity>(
    receiver: &mut mpsc::Receiver<RegistryRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(RegistryRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request.
pub async fn expect_delete<T: RegistryEntity>(
    receiver: &mut mpsc::Receiver<RegistryRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<(), FrameworkError>>)> {
    match receiver.recv().await {
        Some(RegistryRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, ResourceCreate, ResourceId, TagSet};

    fn sample(id: &str) -> Resource {
        Resource {
            id: ResourceId::from(id),
            name: "vm-1".to_string(),
            remote_id: "/subscriptions/x/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1"
                .to_string(),
            tags: TagSet::new(),
            created_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_raw_mock_client() {
        let (client, mut receiver) = create_mock_client::<Resource>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(ResourceCreate::new("vm-1", "/subscriptions/x/vm-1", TagSet::new()))
                .await
        });

        let (payload, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(payload.name, "vm-1");
        responder.send(Ok(sample("res_1"))).unwrap();

        let created = create_task.await.unwrap().unwrap();
        assert_eq!(created.id, ResourceId::from("res_1"));
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_list().return_ok(vec![sample("res_1")]);
        mock.expect_get(ResourceId::from("res_1"))
            .return_ok(Some(sample("res_1")));
        mock.expect_delete(ResourceId::from("res_1"))
            .return_err(FrameworkError::NotFound("res_1".into()));

        let client = mock.client();
        assert_eq!(client.list().await.unwrap().len(), 1);
        assert!(client.get(ResourceId::from("res_1")).await.unwrap().is_some());
        assert!(matches!(
            client.delete(ResourceId::from("res_1")).await,
            Err(FrameworkError::NotFound(_))
        ));

        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_mismatch_surfaces_as_dropped() {
        let mut mock = MockClient::<Resource>::new();
        mock.expect_list().return_ok(vec![]);

        let result = mock.client().get(ResourceId::from("res_1")).await;
        assert!(matches!(result, Err(FrameworkError::ActorDropped)));
    }
}
