//! Generic actor framework for the in-memory registry.
//!
//! This module provides the building blocks for a concurrency-safe record table
//! owned by a single task and driven through message passing.
//!
//! # Main Components
//!
//! - [`RegistryEntity`] - Trait that record types implement to be stored
//! - [`RegistryActor`] - Generic actor that owns the table
//! - [`RegistryHandle`] - Type-safe, cloneable handle for sending requests
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning the actor.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
