//! Pure data structures (DTOs) implementing the [`RegistryEntity`](crate::framework::RegistryEntity) trait.

pub mod resource;

pub use resource::*;
