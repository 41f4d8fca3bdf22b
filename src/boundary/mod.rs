//! Host side of the engine boundary: allocation, buffer transfer, call
//! encoding and the panic bridge.

pub mod allocator;
pub mod buffer;
pub mod dispatch;
pub mod panic;
pub mod transfer;

pub use allocator::BoundaryAllocator;
pub use buffer::ForeignBuffer;
pub use dispatch::Invocation;
pub use panic::BoundaryFailure;
