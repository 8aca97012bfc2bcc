//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the process-wide `tracing` subscriber.
//!
//! The level comes from `RUST_LOG` and defaults to `info`. Output is compact
//! with module paths hidden, so spans read inline:
//!
//! ```text
//! INFO request: Resource registered method=POST path=/v1/resources request_id=... resource_id=...
//! INFO request:apply_tags_to_resource: Succeeded resource_id=... remote_id=/subscriptions/...
//! ```
//!
//! ```bash
//! RUST_LOG=debug cargo run   # registry messages, LRO polling, rejected bodies
//! ```

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Later calls are no-ops, so tests may call it freely.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
