//! # RegistryClient Trait
//!
//! Common interface for record-specific clients, adding default `get`, `list`
//! and `delete` methods built on top of a generic [`RegistryHandle`].
use crate::framework::{FrameworkError, RegistryEntity, RegistryHandle};
use async_trait::async_trait;

/// Trait for record-specific clients to inherit the standard read/delete operations.
///
/// Implementors only supply access to the inner handle and an error mapping;
/// creation stays on the concrete client because it usually needs payload
/// conversion.
#[async_trait]
pub trait RegistryClient<T: RegistryEntity>: Send + Sync {
    /// The record-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic handle.
    fn inner(&self) -> &RegistryHandle<T>;

    /// Map framework errors to the record-specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Snapshot of every stored record, in no particular order.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }

    /// Delete a record by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
