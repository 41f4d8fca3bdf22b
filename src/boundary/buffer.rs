/// A region inside engine memory owned by the current operation.
///
/// Not `Clone` or `Copy`: the only way to give a region back is
/// [`BoundaryAllocator::release`](super::BoundaryAllocator::release), which
/// consumes the handle. Address 0 means "absent" and is never released.
#[derive(Debug)]
#[must_use = "engine regions must be released through the allocator that issued them"]
pub struct ForeignBuffer {
    addr: u32,
    len: u32,
}

impl ForeignBuffer {
    pub const fn absent() -> Self {
        Self { addr: 0, len: 0 }
    }

    pub(crate) const fn new(addr: u32, len: u32) -> Self {
        Self { addr, len }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_absent(&self) -> bool {
        self.addr == 0
    }

    pub(crate) fn into_raw(self) -> (u32, u32) {
        (self.addr, self.len)
    }
}
