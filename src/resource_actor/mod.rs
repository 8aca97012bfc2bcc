//! # Resource Registry Actor
//!
//! The concurrency-safe, in-memory table of [`Resource`] records.
//!
//! ## Structure
//!
//! - [`entity`] - [`RegistryEntity`](crate::framework::RegistryEntity) implementation for [`Resource`]
//! - [`error`] - [`ResourceError`] type for type-safe error handling
//! - [`new()`] - Factory function that creates the actor and its handle
//!
//! The registry knows nothing about tagging and never calls outward. Each
//! record gets a random UUID at creation time.
//!
//! ## Usage
//!
//! ```rust
//! use azure_tagger::clients::ResourceRegistry;
//! use azure_tagger::model::{ResourceCreate, TagSet};
//! use azure_tagger::resource_actor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, handle) = resource_actor::new();
//!     tokio::spawn(actor.run());
//!
//!     let registry = ResourceRegistry::new(handle);
//!     let created = registry
//!         .create_resource(ResourceCreate::new("vm-1", "/subscriptions/x/vm-1", TagSet::new()))
//!         .await?;
//!     let fetched = registry.fetch(created.id.clone()).await?;
//!     assert_eq!(fetched, created);
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod error;

pub use error::*;

use crate::framework::{RegistryActor, RegistryHandle};
use crate::model::{Resource, ResourceId};

/// Capacity of the registry's request channel.
const REGISTRY_BUFFER: usize = 64;

/// Creates a new Resource registry actor and its handle.
pub fn new() -> (RegistryActor<Resource>, RegistryHandle<Resource>) {
    RegistryActor::new(REGISTRY_BUFFER, ResourceId::generate)
}
