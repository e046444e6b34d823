//! Tracing setup for binaries and tests embedding the store
//!
//! The library itself only emits `tracing` events; installing a subscriber is left to
//! the embedding application. `init_tracing` installs the usual fmt subscriber with an
//! `EnvFilter` read from `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG` (falling back to
/// `default_directive`, e.g. `"info"` or `"drafttree_core=debug"`)
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the directive is invalid.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
