use super::ForeignBuffer;
use crate::engine::memory::LinearMemory;
use crate::engine::{Linear, Trap};
use crate::error::HashError;

/// The only path through which host code creates or destroys engine
/// addresses.
///
/// One allocator covers one operation. Every region it hands out or adopts
/// is recorded until released; whatever is still recorded when the
/// allocator is dropped gets released then, so an early return or engine
/// failure cannot leak engine memory.
pub struct BoundaryAllocator<'e, L: Linear + ?Sized> {
    target: &'e mut L,
    outstanding: Vec<(u32, u32)>,
}

impl<'e, L: Linear + ?Sized> BoundaryAllocator<'e, L> {
    pub fn new(target: &'e mut L) -> Self {
        Self {
            target,
            outstanding: Vec::new(),
        }
    }

    pub fn allocate(&mut self, size: u32) -> Result<ForeignBuffer, HashError> {
        let addr = self
            .target
            .alloc(size)
            .map_err(|trap| HashError::Allocation {
                size,
                reason: reason(trap),
            })?;

        if addr == 0 {
            return Err(HashError::Allocation {
                size,
                reason: "engine returned a null address".to_string(),
            });
        }

        self.outstanding.push((addr, size));
        Ok(ForeignBuffer::new(addr, size))
    }

    /// Takes ownership of a region the engine handed to the host.
    pub fn adopt(&mut self, addr: u32, len: u32) -> ForeignBuffer {
        if addr == 0 {
            return ForeignBuffer::absent();
        }
        self.outstanding.push((addr, len));
        ForeignBuffer::new(addr, len)
    }

    pub fn release(&mut self, buffer: ForeignBuffer) -> Result<(), HashError> {
        if buffer.is_absent() {
            return Ok(());
        }

        let region = buffer.into_raw();
        let Some(index) = self.outstanding.iter().rposition(|&r| r == region) else {
            return Err(HashError::Engine(
                "release of a region this operation does not own".to_string(),
            ));
        };
        self.outstanding.swap_remove(index);

        self.target.dealloc(region.0, region.1)?;
        Ok(())
    }

    /// Regions handed out or adopted and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn memory(&self) -> &LinearMemory {
        self.target.memory()
    }

    pub fn memory_mut(&mut self) -> &mut LinearMemory {
        self.target.memory_mut()
    }

    pub(crate) fn target(&mut self) -> &mut L {
        &mut *self.target
    }
}

impl<L: Linear + ?Sized> Drop for BoundaryAllocator<'_, L> {
    fn drop(&mut self) {
        if self.outstanding.is_empty() {
            return;
        }

        tracing::debug!(
            regions = self.outstanding.len(),
            "Releasing engine regions left by an interrupted operation"
        );

        while let Some((addr, len)) = self.outstanding.pop() {
            if let Err(trap) = self.target.dealloc(addr, len) {
                tracing::warn!("Failed to release engine region: {}", reason(trap));
            }
        }
    }
}

fn reason(trap: Trap) -> String {
    match HashError::from(trap) {
        HashError::Engine(msg) => msg,
        other => other.to_string(),
    }
}
