//! Host side of the engine's `panic` import.
//!
//! The engine reports fatal problems by writing a UTF-8 message into its own
//! memory and calling `panic(addr, len)`. [`bridge`] turns that into a
//! [`Trap`] carrying a [`HashError::Engine`], releasing the message region
//! before it returns.

use super::{BoundaryAllocator, ForeignBuffer, transfer};
use crate::engine::{Imports, Linear, Trap};
use crate::error::HashError;

/// A decoded engine panic whose message region has not been released yet.
#[derive(Debug)]
pub struct BoundaryFailure {
    message: String,
    signal: ForeignBuffer,
}

impl BoundaryFailure {
    /// Adopts the signalled region and decodes its contents.
    pub fn decode<L: Linear + ?Sized>(
        allocator: &mut BoundaryAllocator<'_, L>,
        addr: u32,
        len: u32,
    ) -> Self {
        let signal = allocator.adopt(addr, len);
        let message = match transfer::pull(allocator, &signal) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => format!("unreadable engine panic message ({err})"),
        };
        Self { message, signal }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Releases the message region and yields the host error.
    pub fn resolve<L: Linear + ?Sized>(self, allocator: &mut BoundaryAllocator<'_, L>) -> HashError {
        let Self { message, signal } = self;
        if let Err(err) = allocator.release(signal) {
            tracing::warn!("Failed to release engine panic message: {err}");
        }
        HashError::Engine(message)
    }
}

/// The `panic` import handed to engines at instantiation.
pub fn bridge(caller: &mut dyn Linear, addr: u32, len: u32) -> Trap {
    let mut allocator = BoundaryAllocator::new(caller);
    let failure = BoundaryFailure::decode(&mut allocator, addr, len);
    tracing::warn!("Engine panicked: {}", failure.message());
    Trap::Host(failure.resolve(&mut allocator))
}

pub fn imports() -> Imports {
    Imports {
        panic: Box::new(bridge),
    }
}
