use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::engine::sandbox::SandboxEngine;
use crate::error::HashError;
use crate::hasher::Hasher;
use crate::params::HashParameters;

/// One engine instance shared between threads. Every call takes the lock
/// for its whole duration, so invocations never overlap on the engine heap.
pub struct SharedHasher<E: Engine = SandboxEngine> {
    inner: Arc<Mutex<Hasher<E>>>,
}

impl<E: Engine> Clone for SharedHasher<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedHasher<SandboxEngine> {
    pub fn new(config: &EngineConfig) -> Result<Self, HashError> {
        Ok(Self::from_hasher(Hasher::new(config)?))
    }
}

impl<E: Engine> SharedHasher<E> {
    pub fn from_hasher(hasher: Hasher<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(hasher)),
        }
    }

    pub fn hash(
        &self,
        password: &[u8],
        salt: &[u8],
        params: Option<&HashParameters>,
    ) -> Result<Vec<u8>, HashError> {
        self.with(|hasher| hasher.hash(password, salt, params))
    }

    pub fn verify(
        &self,
        password: &[u8],
        salt: &[u8],
        expected: &[u8],
        params: Option<&HashParameters>,
    ) -> Result<bool, HashError> {
        self.with(|hasher| hasher.verify(password, salt, expected, params))
    }

    /// Runs `f` with exclusive access to the hasher.
    pub fn with<T>(
        &self,
        f: impl FnOnce(&mut Hasher<E>) -> Result<T, HashError>,
    ) -> Result<T, HashError> {
        let mut hasher = self.inner.lock().map_err(|_| {
            HashError::Unavailable("engine lock poisoned by an earlier panic".to_string())
        })?;
        f(&mut hasher)
    }
}
