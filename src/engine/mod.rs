//! The computation engine contract.
//!
//! An engine owns a private linear memory and exposes three exports:
//! `alloc`, `dealloc` and `hash`. The host only ever touches engine memory
//! through [`Linear`], and only ever starts a computation through
//! [`Engine::hash`]. Fatal problems inside the engine are reported through
//! the host-supplied `panic` import (see [`Imports`]) and surface as a
//! [`Trap`] from whichever export was running.

pub mod memory;
pub mod sandbox;

use crate::error::HashError;

use self::memory::LinearMemory;

/// Number of positional `u32` slots taken by the `hash` export.
pub const HASH_ARITY: usize = 16;

pub type HashArgs = [u32; HASH_ARITY];

/// Why an engine export did not return normally.
#[derive(Debug)]
pub enum Trap {
    /// Produced by the host `panic` import after it decoded and released
    /// the engine's message buffer.
    Host(HashError),
    /// The engine stopped without going through `panic`.
    Abort(String),
}

impl From<Trap> for HashError {
    fn from(trap: Trap) -> Self {
        match trap {
            Trap::Host(err) => err,
            Trap::Abort(msg) => HashError::Engine(msg),
        }
    }
}

/// Memory and allocator exports of an engine instance.
///
/// Also handed to the `panic` import while an export is in flight, so the
/// host can read the message and give the region back.
pub trait Linear {
    fn memory(&self) -> &LinearMemory;

    fn memory_mut(&mut self) -> &mut LinearMemory;

    /// Reserves `size` bytes and returns the base address. Never returns 0.
    fn alloc(&mut self, size: u32) -> Result<u32, Trap>;

    /// Returns a region obtained from `alloc`. Address 0 is a no-op.
    fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), Trap>;
}

pub trait Engine: Linear + Send {
    /// Runs one Argon2 computation. Argument order is fixed, see
    /// [`crate::boundary::dispatch::encode`].
    fn hash(&mut self, args: HashArgs) -> Result<(), Trap>;
}

impl<E: Linear + ?Sized> Linear for Box<E> {
    fn memory(&self) -> &LinearMemory {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        (**self).memory_mut()
    }

    fn alloc(&mut self, size: u32) -> Result<u32, Trap> {
        (**self).alloc(size)
    }

    fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), Trap> {
        (**self).dealloc(addr, size)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn hash(&mut self, args: HashArgs) -> Result<(), Trap> {
        (**self).hash(args)
    }
}

/// Host functions an engine is instantiated with.
pub struct Imports {
    /// `panic(message_addr, message_len)`. The returned trap becomes the
    /// result of the export that was running.
    pub panic: Box<dyn Fn(&mut dyn Linear, u32, u32) -> Trap + Send + Sync>,
}

impl std::fmt::Debug for Imports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Imports").finish_non_exhaustive()
    }
}
