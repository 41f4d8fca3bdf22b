use super::{BoundaryAllocator, ForeignBuffer};
use crate::engine::Linear;
use crate::error::HashError;

/// Copies `bytes` into a fresh engine region. `None` yields the absent
/// handle without touching the allocator.
pub fn push<L: Linear + ?Sized>(
    allocator: &mut BoundaryAllocator<'_, L>,
    bytes: Option<&[u8]>,
) -> Result<ForeignBuffer, HashError> {
    let Some(bytes) = bytes else {
        return Ok(ForeignBuffer::absent());
    };

    let size = u32::try_from(bytes.len()).map_err(|_| HashError::Allocation {
        size: u32::MAX,
        reason: format!("{} bytes do not fit in the engine address space", bytes.len()),
    })?;

    let buffer = allocator.allocate(size)?;
    allocator.memory_mut().write(buffer.addr(), bytes)?;
    Ok(buffer)
}

/// Copies a region out of engine memory. The region stays allocated.
pub fn pull<L: Linear + ?Sized>(
    allocator: &BoundaryAllocator<'_, L>,
    buffer: &ForeignBuffer,
) -> Result<Vec<u8>, HashError> {
    if buffer.is_absent() {
        return Ok(Vec::new());
    }

    Ok(allocator.memory().read(buffer.addr(), buffer.len())?.to_vec())
}
