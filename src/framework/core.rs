//! # Core Registry Framework
//!
//! This module defines the generic building blocks for the in-memory registry.
//!
//! ## Key Types
//!
//! - [`RegistryEntity`]: The trait that every stored record type must implement.
//! - [`RegistryActor`]: The generic actor that owns the record table.
//! - [`RegistryHandle`]: The generic, cloneable handle for talking to the actor.
//! - [`FrameworkError`]: Common errors (e.g., ActorClosed, NotFound).

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any record type must implement to be stored by a [`RegistryActor`].
///
/// # Architecture Note
/// The actor loop is written *once* against this contract. Associated types pin
/// the identifier and creation payload to the record type, so a `Resource`
/// table can only ever be fed a `ResourceCreate` payload.
///
/// Records are immutable once stored. The framework offers no update path: a
/// state change is a delete followed by a create.
pub trait RegistryEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this record (e.g., a UUID newtype).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new record (DTO - Data Transfer Object).
    type Create: Send + Sync + Debug;

    /// The error type for this record.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full record from the freshly generated ID and the payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the registry framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Message type sent to the actor to request an operation.
///
/// The variants cover the whole record lifecycle: a record is created, read
/// any number of times (singly or as part of a listing) and finally deleted.
#[derive(Debug)]
pub enum RegistryRequest<T: RegistryEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that owns a table of records.
///
/// # Concurrency Model
/// The actor is the only owner of `store`. Every request is a message that is
/// processed to completion before the next one is received, so readers never
/// observe a half-applied write and writers are serialized without a lock.
/// Nothing in the loop performs I/O, which keeps every "critical section"
/// bounded to in-memory work.
///
/// A `Create` whose reply has been received is visible to every request sent
/// afterwards, from any handle clone.
pub struct RegistryActor<T: RegistryEntity> {
    receiver: mpsc::Receiver<RegistryRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: RegistryEntity> RegistryActor<T> {
    /// Creates a new actor and its associated handle.
    ///
    /// `next_id_fn` is called once per `Create`; it is re-invoked if it ever
    /// yields an identifier that is already live.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, RegistryHandle<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, RegistryHandle::new(sender))
    }

    fn fresh_id(&self) -> T::Id {
        loop {
            let id = (self.next_id_fn)();
            if !self.store.contains_key(&id) {
                return id;
            }
        }
    }

    /// Runs the actor's event loop until every handle has been dropped.
    pub async fn run(mut self) {
        // Extract just the type name (e.g., "Resource" instead of the full path)
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RegistryRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = self.fresh_id();
                    match T::from_create_params(id.clone(), params) {
                        Ok(item) => {
                            self.store.insert(id.clone(), item.clone());
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(item));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                RegistryRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                RegistryRequest::List { respond_to } => {
                    let snapshot: Vec<T> = self.store.values().cloned().collect();
                    debug!(entity_type, size = snapshot.len(), "List");
                    let _ = respond_to.send(Ok(snapshot));
                }
                RegistryRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    if self.store.remove(&id).is_some() {
                        info!(entity_type, %id, size = self.store.len(), "Deleted");
                        let _ = respond_to.send(Ok(()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC HANDLE
// =============================================================================

/// A type-safe, cheaply cloneable handle for a [`RegistryActor`].
///
/// Holds only the sending half of the channel; every method is one round trip.
pub struct RegistryHandle<T: RegistryEntity> {
    sender: mpsc::Sender<RegistryRequest<T>>,
}

impl<T: RegistryEntity> Clone for RegistryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: RegistryEntity> RegistryHandle<T> {
    pub fn new(sender: mpsc::Sender<RegistryRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, params: T::Create) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryRequest::Create { params, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryRequest::List { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryRequest::Delete { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Note {
        id: String,
        body: String,
    }

    #[derive(Debug)]
    struct NoteCreate {
        body: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("empty note")]
    struct EmptyNote;

    impl RegistryEntity for Note {
        type Id = String;
        type Create = NoteCreate;
        type Error = EmptyNote;

        fn from_create_params(id: String, params: NoteCreate) -> Result<Self, EmptyNote> {
            if params.body.is_empty() {
                return Err(EmptyNote);
            }
            Ok(Self {
                id,
                body: params.body,
            })
        }
    }

    fn counter_ids() -> impl Fn() -> String + Send + Sync + 'static {
        let counter = Arc::new(AtomicU64::new(1));
        move || format!("note_{}", counter.fetch_add(1, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_registry_actor_lifecycle() {
        let (actor, handle) = RegistryActor::<Note>::new(10, counter_ids());
        tokio::spawn(actor.run());

        let created = handle
            .create(NoteCreate { body: "hello".into() })
            .await
            .unwrap();
        assert_eq!(created.id, "note_1");

        let fetched = handle.get(created.id.clone()).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));
        assert_eq!(handle.list().await.unwrap().len(), 1);

        handle.delete(created.id.clone()).await.unwrap();
        assert!(handle.get(created.id.clone()).await.unwrap().is_none());
        assert!(matches!(
            handle.delete(created.id).await,
            Err(FrameworkError::NotFound(_))
        ));
        assert!(handle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entity_error_is_not_stored() {
        let (actor, handle) = RegistryActor::<Note>::new(10, counter_ids());
        tokio::spawn(actor.run());

        let result = handle.create(NoteCreate { body: String::new() }).await;
        assert!(matches!(result, Err(FrameworkError::EntityError(_))));
        assert!(handle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_colliding_id_is_regenerated() {
        let sequence = Arc::new(AtomicU64::new(0));
        // Yields "a", "a", "b", ...
        let next_id = move || match sequence.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => "a".to_string(),
            _ => "b".to_string(),
        };
        let (actor, handle) = RegistryActor::<Note>::new(10, next_id);
        tokio::spawn(actor.run());

        let first = handle.create(NoteCreate { body: "x".into() }).await.unwrap();
        let second = handle.create(NoteCreate { body: "y".into() }).await.unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(second.id, "b");
    }

    #[tokio::test]
    async fn test_closed_actor_reports_actor_closed() {
        let (actor, handle) = RegistryActor::<Note>::new(10, counter_ids());
        drop(actor);

        let result = handle.list().await;
        assert!(matches!(result, Err(FrameworkError::ActorClosed)));
    }
}
