//! Buffer and register memory ownership.
//!
//! A [`MemoryModel`] owns the register table and hands out the transmit and
//! receive [`Buffer`]s of a channel. Two models exist:
//!
//! | Model | Storage | `acquire` | `release` |
//! |-------|---------|-----------|-----------|
//! | [`StaticMemory`] | `[u8; N]` / `[u16; N]` arrays | fails only above `N` | no-op |
//! | [`HeapMemory`] (`alloc`) | `Vec` from the heap | may fail with `OutOfMemory` | returns bytes to the budget |
//!
//! Code above this layer is written against the trait only, so the same
//! receiver runs unchanged on a flash-starved target and on a host. Both
//! models map exactly `register_count` registers and hand out buffers of
//! exactly the requested size, so one configuration behaves the same way
//! under either.
//! [`DefaultMemory`] names the model selected by the `dynamic-alloc` feature.

mod buffer;
#[cfg(feature = "alloc")]
mod heap;
mod registers;
mod static_memory;

pub use buffer::{Buffer, BufferKind, ByteStorage};
#[cfg(feature = "alloc")]
pub use heap::HeapMemory;
pub use registers::{RegisterTable, WordStorage};
pub use static_memory::StaticMemory;

use crate::config::RtuConfig;
use crate::Result;

/// Ownership contract for a channel's buffers and register table.
pub trait MemoryModel: Sized {
    /// Storage behind each buffer.
    type Bytes: ByteStorage;
    /// Storage behind the register table.
    type Words: WordStorage;

    /// Reserve the register table for `config`.
    ///
    /// Heap-backed models allocate here; a failure is fatal for the channel.
    fn init(config: &RtuConfig) -> Result<Self>;

    /// Obtain a buffer of `requested` bytes for `kind`.
    fn acquire(&mut self, kind: BufferKind, requested: usize) -> Result<Buffer<Self::Bytes>>;

    /// Return a buffer obtained from [`acquire`](Self::acquire).
    fn release(&mut self, buffer: Buffer<Self::Bytes>);

    /// The register table.
    fn registers(&self) -> &RegisterTable<Self::Words>;

    /// The register table, mutably.
    fn register_table(&mut self) -> &mut RegisterTable<Self::Words>;
}

/// The memory model selected at build time.
#[cfg(feature = "dynamic-alloc")]
pub type DefaultMemory = HeapMemory;

/// The memory model selected at build time.
#[cfg(not(feature = "dynamic-alloc"))]
pub type DefaultMemory = StaticMemory;
