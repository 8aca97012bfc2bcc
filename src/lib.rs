//! # Azure Tagger
//!
//! > **Register Azure resources, then tag them through Resource Manager.**
//!
//! A small REST service pairing a concurrency-safe in-memory registry of
//! resource records with an orchestrator that turns "apply these tags" into one
//! bounded call against Azure Resource Manager.
//!
//! ## 🏗️ Design
//!
//! ### The registry is an actor
//! The record table is owned by a single Tokio task ([`framework::RegistryActor`]).
//! Callers talk to it through cloneable handles; every operation is a message
//! processed to completion before the next one, so there are no locks and no
//! half-applied writes.
//!
//! ### Tagging is a capability
//! The orchestrator only knows the [`tagging::TagApplier`] trait. Production
//! wires in [`tagging::AzureTagger`], tests wire in [`tagging::FakeTagApplier`].
//! A fresh applier is built per request from a [`tagging::TagApplierFactory`],
//! so Azure configuration and credentials are always read at call time.
//!
//! ### Bounded waits
//! Each tag-apply gets a fixed deadline ([`orchestrator::DEFAULT_APPLY_DEADLINE`]).
//! When it elapses the wait is abandoned; the remote operation is not cancelled.
//!
//! ## 🗺️ Module Tour
//!
//! - [`framework`] - generic registry actor, handle and mocks
//! - [`model`] - [`Resource`](model::Resource) and its creation payload
//! - [`resource_actor`] - the registry instance for resources and its error type
//! - [`clients`] - [`ResourceRegistry`](clients::ResourceRegistry), the typed client
//! - [`tagging`] - the applier capability and its implementations
//! - [`orchestrator`] - [`TagOrchestrator`](orchestrator::TagOrchestrator)
//! - [`http`] - axum router, handlers and the error-to-response mapping
//! - [`lifecycle`] - [`TaggerSystem`](lifecycle::TaggerSystem) and tracing setup
//! - [`config`] - listen address
//!
//! ## 🚀 Running
//!
//! ```bash
//! export AZURE_SUBSCRIPTION_ID=... AZURE_RESOURCE_API_VERSION=2021-04-01
//! export AZURE_TENANT_ID=... AZURE_CLIENT_ID=... AZURE_CLIENT_SECRET=...
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod config;
pub mod framework;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod resource_actor;
pub mod tagging;
