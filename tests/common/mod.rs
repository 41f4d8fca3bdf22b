#![allow(dead_code)]

use argon2_sandbox::boundary::panic;
use argon2_sandbox::engine::memory::LinearMemory;
use argon2_sandbox::engine::sandbox::SandboxEngine;
use argon2_sandbox::engine::{Engine, HashArgs, Linear, Trap};
use argon2_sandbox::{EngineConfig, HashParameters, Hasher, Variant, Version};

pub const PASSWORD: &[u8] = b"password";
pub const SALT: &[u8] = b"somesalt";

/// Sandbox engine that counts every export call it forwards.
pub struct TrackingEngine {
    pub inner: SandboxEngine,
    pub allocs: usize,
    pub deallocs: usize,
    pub hash_calls: usize,
    pub last_args: Option<HashArgs>,
}

impl TrackingEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let inner = SandboxEngine::instantiate(config, panic::imports())
            .expect("failed to instantiate sandbox engine");
        Self {
            inner,
            allocs: 0,
            deallocs: 0,
            hash_calls: 0,
            last_args: None,
        }
    }

    /// Regions still live on the engine heap, including any the engine
    /// allocated for itself.
    pub fn outstanding(&self) -> usize {
        self.inner.live_allocations()
    }
}

impl Linear for TrackingEngine {
    fn memory(&self) -> &LinearMemory {
        self.inner.memory()
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        self.inner.memory_mut()
    }

    fn alloc(&mut self, size: u32) -> Result<u32, Trap> {
        self.allocs += 1;
        self.inner.alloc(size)
    }

    fn dealloc(&mut self, addr: u32, size: u32) -> Result<(), Trap> {
        self.deallocs += 1;
        self.inner.dealloc(addr, size)
    }
}

impl Engine for TrackingEngine {
    fn hash(&mut self, args: HashArgs) -> Result<(), Trap> {
        self.hash_calls += 1;
        self.last_args = Some(args);
        self.inner.hash(args)
    }
}

pub fn tracking_hasher() -> Hasher<TrackingEngine> {
    Hasher::with_engine(TrackingEngine::new(&EngineConfig::default()))
}

pub fn sandbox() -> SandboxEngine {
    SandboxEngine::instantiate(&EngineConfig::default(), panic::imports())
        .expect("failed to instantiate sandbox engine")
}

/// Parameters used by the reference vectors.
pub fn reference_params(variant: Variant, version: Version) -> HashParameters {
    HashParameters::new()
        .variant(variant)
        .version(version)
        .time_cost(2)
        .memory_cost(65536)
        .parallelism(1)
}

/// Small parameters for tests that only care about plumbing.
pub fn quick_params() -> HashParameters {
    HashParameters::new().time_cost(1).memory_cost(64)
}

pub fn init_tracing() {
    argon2_sandbox::init_tracing("debug");
}
