//! Engine linear memory and the heap that carves it up.

use std::collections::BTreeMap;
use std::ops::Range;

use super::Trap;

pub const PAGE_SIZE: usize = 64 * 1024;

/// 65536 pages of 64 KiB cover the whole 32-bit address space.
pub const MAX_PAGES: u32 = 65536;

/// First address the heap hands out. Everything below stays unused so that
/// 0 can mean "absent" at the boundary.
pub const HEAP_BASE: u32 = 1024;

const ALIGN: u32 = 8;

/// A contiguous, zero-initialised byte space addressed by `u32` offsets.
#[derive(Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    max_pages: u32,
}

impl LinearMemory {
    pub fn new(initial_pages: u32, max_pages: u32) -> Self {
        let max_pages = max_pages.min(MAX_PAGES);
        let initial_pages = initial_pages.min(max_pages);
        Self {
            bytes: vec![0; initial_pages as usize * PAGE_SIZE],
            max_pages,
        }
    }

    pub fn pages(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE) as u32
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in bytes the memory would have at its page cap.
    pub fn max_len(&self) -> u64 {
        u64::from(self.max_pages) * PAGE_SIZE as u64
    }

    /// Grows by `delta` pages and returns the previous page count, or `None`
    /// if that would pass the page cap.
    pub fn grow(&mut self, delta: u32) -> Option<u32> {
        let old = self.pages();
        let new = old.checked_add(delta)?;
        if new > self.max_pages {
            return None;
        }
        self.bytes.resize(new as usize * PAGE_SIZE, 0);
        Some(old)
    }

    pub fn read(&self, addr: u32, len: u32) -> Result<&[u8], Trap> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), Trap> {
        let len = u32::try_from(data.len())
            .map_err(|_| Trap::Abort("out of bounds memory access".to_string()))?;
        let range = self.range(addr, len)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn range(&self, addr: u32, len: u32) -> Result<Range<usize>, Trap> {
        let start = addr as usize;
        match start.checked_add(len as usize) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => {
                tracing::debug!(addr, len, size = self.bytes.len(), "out of bounds access");
                Err(Trap::Abort("out of bounds memory access".to_string()))
            }
        }
    }
}

/// First-fit free-list allocator living on top of a [`LinearMemory`].
///
/// Sizes are rounded up to 8 bytes. Freed blocks are coalesced with their
/// neighbours, and a block ending at the bump pointer is folded back into it.
#[derive(Debug)]
pub struct Heap {
    free: BTreeMap<u32, u32>,
    live: BTreeMap<u32, u32>,
    top: u32,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            free: BTreeMap::new(),
            live: BTreeMap::new(),
            top: HEAP_BASE,
        }
    }

    /// Returns `None` when the request cannot be met even after growing.
    pub fn alloc(&mut self, memory: &mut LinearMemory, size: u32) -> Option<u32> {
        let size = round_up(size)?;

        let hit = self
            .free
            .iter()
            .find(|&(_, &len)| len >= size)
            .map(|(&addr, &len)| (addr, len));

        if let Some((addr, len)) = hit {
            self.free.remove(&addr);
            if len > size {
                self.free.insert(addr + size, len - size);
            }
            self.live.insert(addr, size);
            return Some(addr);
        }

        let addr = self.top;
        let end = addr.checked_add(size)?;
        let needed = end as usize;
        if needed > memory.len() {
            let pages = (needed - memory.len()).div_ceil(PAGE_SIZE);
            memory.grow(u32::try_from(pages).ok()?)?;
        }

        self.top = end;
        self.live.insert(addr, size);
        Some(addr)
    }

    pub fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), String> {
        if addr == 0 {
            return Ok(());
        }

        let size = round_up(size).ok_or_else(|| "dealloc size overflows".to_string())?;
        match self.live.get(&addr) {
            Some(&len) if len == size => {}
            Some(_) => return Err("dealloc size does not match the allocation".to_string()),
            None => return Err("dealloc of a region that is not allocated".to_string()),
        }

        self.live.remove(&addr);
        self.coalesce(addr, size);
        Ok(())
    }

    fn coalesce(&mut self, mut addr: u32, mut len: u32) {
        if let Some(next) = self.free.remove(&(addr + len)) {
            len += next;
        }

        let prev = self
            .free
            .range(..addr)
            .next_back()
            .map(|(&prev, &prev_len)| (prev, prev_len));
        if let Some((prev, prev_len)) = prev {
            if prev + prev_len == addr {
                self.free.remove(&prev);
                addr = prev;
                len += prev_len;
            }
        }

        if addr + len == self.top {
            self.top = addr;
        } else {
            self.free.insert(addr, len);
        }
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn live_bytes(&self) -> u64 {
        self.live.values().map(|&len| len as u64).sum()
    }
}

fn round_up(size: u32) -> Option<u32> {
    size.max(1).checked_next_multiple_of(ALIGN)
}
