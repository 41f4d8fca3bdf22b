//! Argon2 password hashing delegated to an isolated computation engine.
//!
//! The host never runs Argon2 itself. It normalises parameters, copies the
//! inputs into the engine's private linear memory, invokes the engine's
//! `hash` export, copies the tag back out and releases every region it
//! allocated, on success and failure alike.
//!
//! ```rust,ignore
//! use argon2_sandbox::{HashParameters, Variant, hash};
//!
//! let params = HashParameters::new().variant(Variant::Argon2i);
//! let tag = hash(b"password", b"somesalt", Some(&params))?;
//! ```

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod params;
pub mod state;
pub mod worker;

use tracing_subscriber::EnvFilter;

pub use crate::config::{Config, EngineConfig};
pub use crate::error::HashError;
pub use crate::hasher::{Hasher, generate_salt, hash};
pub use crate::params::{HashParameters, Normalized, Variant, Version};
pub use crate::state::SharedHasher;
pub use crate::worker::{WorkerHandle, WorkerPool};

/// Starts the worker pool described by `config`.
pub fn start(config: &Config) -> Result<(WorkerHandle, WorkerPool), HashError> {
    worker::run_pool(&config.engine, config.workers)
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by `log_level` when
/// that is unset. Does nothing if a subscriber is already installed.
pub fn init_tracing(log_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .try_init();
}
