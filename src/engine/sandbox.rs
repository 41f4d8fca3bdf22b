//! The bundled computation engine.
//!
//! `SandboxEngine` keeps its own [`LinearMemory`] and [`Heap`] and never
//! shares them with the host except through the [`Linear`] exports. The
//! Argon2 computation runs on copies read out of that memory; the tag is
//! written back into the output region the host handed in.
//!
//! The Argon2 block matrix is charged against the same page cap as the heap:
//! a `memory_cost` that does not fit beside the live heap regions is reported
//! through the `panic` import as a failed allocation, never attempted.

use argon2::{Algorithm, Argon2, AssociatedData, Block, ParamsBuilder, Version};

use super::memory::{HEAP_BASE, Heap, LinearMemory};
use super::{Engine, HashArgs, Imports, Linear, Trap};
use crate::config::EngineConfig;
use crate::error::HashError;

pub struct SandboxEngine {
    instance: Instance,
    imports: Imports,
}

struct Instance {
    memory: LinearMemory,
    heap: Heap,
}

enum Fault {
    Trap(Trap),
    Panic(String),
}

impl From<Trap> for Fault {
    fn from(trap: Trap) -> Self {
        Fault::Trap(trap)
    }
}

impl SandboxEngine {
    pub fn instantiate(config: &EngineConfig, imports: Imports) -> Result<Self, HashError> {
        config.validate().map_err(HashError::Validation)?;

        tracing::debug!(
            initial_pages = config.initial_pages,
            max_pages = config.max_pages,
            "Instantiating sandbox engine"
        );

        Ok(Self {
            instance: Instance {
                memory: LinearMemory::new(config.initial_pages, config.max_pages),
                heap: Heap::new(),
            },
            imports,
        })
    }

    /// Number of heap regions currently handed out.
    pub fn live_allocations(&self) -> usize {
        self.instance.heap.live_allocations()
    }

    pub fn live_bytes(&self) -> u64 {
        self.instance.heap.live_bytes()
    }

    pub fn pages(&self) -> u32 {
        self.instance.memory.pages()
    }

    /// Writes `message` into engine memory and calls the `panic` import.
    fn signal(&mut self, message: String) -> Trap {
        let Ok(len) = u32::try_from(message.len()) else {
            return Trap::Abort(message);
        };
        let Some(addr) = self.instance.heap.alloc(&mut self.instance.memory, len) else {
            return Trap::Abort(message);
        };
        if let Err(trap) = self.instance.memory.write(addr, message.as_bytes()) {
            if let Err(msg) = self.instance.heap.dealloc(addr, len) {
                tracing::warn!("Failed to release panic message region: {msg}");
            }
            return trap;
        }

        (self.imports.panic)(&mut self.instance, addr, len)
    }
}

impl Linear for SandboxEngine {
    fn memory(&self) -> &LinearMemory {
        &self.instance.memory
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.instance.memory
    }

    fn alloc(&mut self, size: u32) -> Result<u32, Trap> {
        match self.instance.heap.alloc(&mut self.instance.memory, size) {
            Some(addr) => Ok(addr),
            None => Err(self.signal(format!("memory allocation of {size} bytes failed"))),
        }
    }

    fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), Trap> {
        match self.instance.heap.dealloc(addr, size) {
            Ok(()) => Ok(()),
            Err(msg) => Err(self.signal(msg)),
        }
    }
}

impl Engine for SandboxEngine {
    fn hash(&mut self, args: HashArgs) -> Result<(), Trap> {
        match self.instance.compute(args) {
            Ok(()) => Ok(()),
            Err(Fault::Trap(trap)) => Err(trap),
            Err(Fault::Panic(msg)) => Err(self.signal(msg)),
        }
    }
}

impl Linear for Instance {
    fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.memory
    }

    fn alloc(&mut self, size: u32) -> Result<u32, Trap> {
        self.heap
            .alloc(&mut self.memory, size)
            .ok_or_else(|| Trap::Abort(format!("memory allocation of {size} bytes failed")))
    }

    fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), Trap> {
        self.heap.dealloc(addr, size).map_err(Trap::Abort)
    }
}

impl Instance {
    fn compute(&mut self, args: HashArgs) -> Result<(), Fault> {
        let [
            password_addr,
            password_len,
            salt_addr,
            salt_len,
            secret_addr,
            secret_len,
            ad_addr,
            ad_len,
            output_addr,
            output_len,
            variant,
            t_cost,
            m_cost,
            p_cost,
            output_length,
            version,
        ] = args;

        if output_len != output_length {
            return Err(Fault::Panic(format!(
                "output buffer holds {output_len} bytes but {output_length} were requested"
            )));
        }

        let algorithm = match variant {
            0 => Algorithm::Argon2d,
            1 => Algorithm::Argon2i,
            2 => Algorithm::Argon2id,
            _ => return Err(Fault::Panic(format!("invalid algorithm {variant}"))),
        };
        let version = Version::try_from(version)
            .map_err(|e| Fault::Panic(format!("invalid version {version}: {e}")))?;

        let output = {
            let password = self.memory.read(password_addr, password_len)?;
            let salt = self.memory.read(salt_addr, salt_len)?;
            let secret = optional(&self.memory, secret_addr, secret_len)?;
            let associated_data = optional(&self.memory, ad_addr, ad_len)?;

            let mut builder = ParamsBuilder::new();
            builder
                .m_cost(m_cost)
                .t_cost(t_cost)
                .p_cost(p_cost)
                .output_len(output_length as usize);
            if let Some(data) = associated_data {
                let data = AssociatedData::new(data)
                    .map_err(|e| Fault::Panic(format!("invalid associated data: {e}")))?;
                builder.data(data);
            }
            let params = builder
                .build()
                .map_err(|e| Fault::Panic(format!("invalid argon2 parameters: {e}")))?;

            let mut blocks = self.working_set(params.block_count())?;
            let hasher = match secret {
                Some(secret) => Argon2::new_with_secret(secret, algorithm, version, params)
                    .map_err(|e| Fault::Panic(format!("invalid secret: {e}")))?,
                None => Argon2::new(algorithm, version, params),
            };

            let mut output = vec![0u8; output_length as usize];
            hasher
                .hash_password_into_with_memory(password, salt, &mut output, &mut blocks)
                .map_err(|e| Fault::Panic(format!("argon2 hashing failed: {e}")))?;
            output
        };

        self.memory.write(output_addr, &output)?;
        Ok(())
    }

    /// Bytes the block matrix may still claim: the full address space under
    /// the page cap, less the reserved low region and every live heap region.
    fn headroom(&self) -> u64 {
        self.memory
            .max_len()
            .saturating_sub(u64::from(HEAP_BASE) + self.heap.live_bytes())
    }

    fn working_set(&self, count: usize) -> Result<Vec<Block>, Fault> {
        let bytes = count as u64 * Block::SIZE as u64;
        let failed = || Fault::Panic(format!("memory allocation of {bytes} bytes failed"));

        if bytes > self.headroom() {
            tracing::debug!(bytes, headroom = self.headroom(), "block matrix over page cap");
            return Err(failed());
        }

        let mut blocks = Vec::new();
        blocks.try_reserve_exact(count).map_err(|_| failed())?;
        blocks.resize(count, Block::default());
        Ok(blocks)
    }
}

fn optional(memory: &LinearMemory, addr: u32, len: u32) -> Result<Option<&[u8]>, Trap> {
    if addr == 0 {
        return Ok(None);
    }
    memory.read(addr, len).map(Some)
}
