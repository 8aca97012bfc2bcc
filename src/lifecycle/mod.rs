//! # System Lifecycle
//!
//! Starts, wires and stops the pieces of the service.
//!
//! [`TaggerSystem::new`] spawns the registry actor, wraps its handle in a
//! [`ResourceRegistry`](crate::clients::ResourceRegistry) and builds the
//! [`TagOrchestrator`](crate::orchestrator::TagOrchestrator) on top of it with
//! the supplied applier factory. The HTTP router is derived from the system
//! with [`TaggerSystem::router`].
//!
//! ## Graceful Shutdown
//!
//! 1. Stop serving HTTP (the router owns client clones)
//! 2. [`TaggerSystem::shutdown`] drops the system's own clients
//! 3. The registry actor sees its channel close and exits
//! 4. Its task handle is awaited
//!
//! Every clone of the registry client keeps the actor alive, so shutdown only
//! completes once all routers built from the system have been dropped.

pub mod tagger_system;
pub mod tracing;

pub use tagger_system::*;
pub use self::tracing::*;
