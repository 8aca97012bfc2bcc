//! Applying tags to remote resources.
//!
//! - [`TagApplier`] - the capability the orchestrator depends on
//! - [`AzureTagger`] - Azure Resource Manager implementation
//! - [`FakeTagApplier`] - recording implementation for tests

pub mod applier;
pub mod azure;
pub mod error;
pub mod fake;

pub use applier::{azure_factory, TagApplier, TagApplierFactory};
pub use azure::{AzureSettings, AzureTagger, Credential, ManagedIdentitySource};
pub use error::TagError;
pub use fake::{AppliedTags, FakeBehavior, FakeTagApplier};
