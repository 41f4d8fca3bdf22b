use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::boundary::{BoundaryAllocator, Invocation, dispatch, panic, transfer};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::engine::sandbox::SandboxEngine;
use crate::error::HashError;
use crate::params::HashParameters;

/// Computes Argon2 hashes through one engine instance.
///
/// Calls take `&mut self`, so a `Hasher` serves one operation at a time.
/// Share it with [`crate::state::SharedHasher`] or run several through
/// [`crate::worker::run_pool`].
pub struct Hasher<E: Engine = SandboxEngine> {
    engine: E,
}

impl Hasher<SandboxEngine> {
    /// Instantiates a fresh sandbox engine wired to the host panic bridge.
    pub fn new(config: &EngineConfig) -> Result<Self, HashError> {
        let engine = SandboxEngine::instantiate(config, panic::imports())?;
        Ok(Self { engine })
    }
}

impl<E: Engine> Hasher<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Hashes `password` with `salt`. Unset parameters take the defaults
    /// documented on [`HashParameters`].
    pub fn hash(
        &mut self,
        password: &[u8],
        salt: &[u8],
        params: Option<&HashParameters>,
    ) -> Result<Vec<u8>, HashError> {
        let defaults = HashParameters::default();
        let params = params.unwrap_or(&defaults).normalize()?;

        let mut allocator = BoundaryAllocator::new(&mut self.engine);

        let password = transfer::push(&mut allocator, Some(password))?;
        let salt = transfer::push(&mut allocator, Some(salt))?;
        let secret = transfer::push(&mut allocator, params.secret)?;
        let associated_data = transfer::push(&mut allocator, params.associated_data)?;
        let output = allocator.allocate(params.output_length)?;

        dispatch::invoke(
            &mut allocator,
            Invocation {
                password: &password,
                salt: &salt,
                secret: &secret,
                associated_data: &associated_data,
                output: &output,
            },
            &params,
        )?;

        let tag = transfer::pull(&allocator, &output)?;

        allocator.release(password)?;
        allocator.release(salt)?;
        allocator.release(secret)?;
        allocator.release(associated_data)?;
        allocator.release(output)?;

        tracing::debug!(len = tag.len(), "Hash computed");
        Ok(tag)
    }

    /// Recomputes the hash and compares it with `expected` in constant time.
    pub fn verify(
        &mut self,
        password: &[u8],
        salt: &[u8],
        expected: &[u8],
        params: Option<&HashParameters>,
    ) -> Result<bool, HashError> {
        let actual = self.hash(password, salt, params)?;
        if actual.len() != expected.len() {
            return Ok(false);
        }
        Ok(bool::from(actual.ct_eq(expected)))
    }
}

/// Hashes on a throwaway engine instance created for this call alone.
pub fn hash(
    password: &[u8],
    salt: &[u8],
    params: Option<&HashParameters>,
) -> Result<Vec<u8>, HashError> {
    Hasher::new(&EngineConfig::default())?.hash(password, salt, params)
}

/// Random salt of `len` bytes from the thread-local CSPRNG.
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::rng().fill_bytes(&mut salt);
    salt
}
