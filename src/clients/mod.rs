//! Type-safe wrappers around [`RegistryHandle`](crate::framework::RegistryHandle).

pub mod registry_client;
pub mod resource_registry;

pub use registry_client::*;
pub use resource_registry::*;
