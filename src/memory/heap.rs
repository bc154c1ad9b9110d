//! Heap-backed memory with an optional byte budget.

use alloc::vec::Vec;

use super::{Buffer, BufferKind, MemoryModel, RegisterTable};
use crate::config::RtuConfig;
use crate::{Error, Result};

/// Memory allocated from the heap at initialization.
///
/// An optional budget caps how many bytes this channel may hold at once,
/// modelling the small fixed heaps common on microcontrollers. Allocation
/// uses `try_reserve_exact`, so a real allocator failure also surfaces as
/// [`Error::OutOfMemory`] instead of aborting.
#[derive(Debug, Clone)]
pub struct HeapMemory {
    budget: Option<usize>,
    used: usize,
    registers: RegisterTable<Vec<u16>>,
}

impl HeapMemory {
    /// Allocate a register window of `register_count` registers.
    pub fn new(register_base: u16, register_count: u16, budget: Option<usize>) -> Result<Self> {
        let mut memory = Self {
            budget,
            used: 0,
            registers: RegisterTable::new(register_base, Vec::new()),
        };
        let count = usize::from(register_count);
        let bytes = count * core::mem::size_of::<u16>();
        memory.charge(bytes)?;

        let mut words = Vec::new();
        words
            .try_reserve_exact(count)
            .map_err(|_| Error::OutOfMemory {
                requested: bytes,
                available: memory.available() + bytes,
            })?;
        words.resize(count, 0);
        memory.registers = RegisterTable::new(register_base, words);

        debug!("heap register table: {count} registers at {register_base}");
        Ok(memory)
    }

    /// Bytes still available under the budget.
    pub fn available(&self) -> usize {
        match self.budget {
            Some(budget) => budget.saturating_sub(self.used),
            None => usize::MAX - self.used,
        }
    }

    /// Bytes currently held by buffers and registers.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    fn charge(&mut self, bytes: usize) -> Result<()> {
        let available = self.available();
        if bytes > available {
            warn!("heap budget exhausted: requested {bytes}, available {available}");
            return Err(Error::OutOfMemory {
                requested: bytes,
                available,
            });
        }
        self.used += bytes;
        Ok(())
    }
}

impl MemoryModel for HeapMemory {
    type Bytes = Vec<u8>;
    type Words = Vec<u16>;

    fn init(config: &RtuConfig) -> Result<Self> {
        Self::new(config.register_base, config.register_count, config.heap_budget)
    }

    fn acquire(&mut self, kind: BufferKind, requested: usize) -> Result<Buffer<Vec<u8>>> {
        self.charge(requested)?;

        let mut storage = Vec::new();
        if storage.try_reserve_exact(requested).is_err() {
            self.used -= requested;
            return Err(Error::OutOfMemory {
                requested,
                available: self.available(),
            });
        }
        storage.resize(requested, 0);

        debug!("heap acquire {kind:?}: {requested} bytes");
        Ok(Buffer::new(kind, storage, requested))
    }

    fn release(&mut self, buffer: Buffer<Vec<u8>>) {
        let bytes = buffer.into_storage().len();
        self.used = self.used.saturating_sub(bytes);
    }

    fn registers(&self) -> &RegisterTable<Vec<u16>> {
        &self.registers
    }

    fn register_table(&mut self) -> &mut RegisterTable<Vec<u16>> {
        &mut self.registers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_allocation_charges_budget() {
        let memory = HeapMemory::new(0, 10, Some(100)).unwrap();
        assert_eq!(memory.used(), 20);
        assert_eq!(memory.available(), 80);
        assert_eq!(memory.registers().len(), 10);
    }

    #[test]
    fn test_exhausted_at_init() {
        let result = HeapMemory::new(0, 64, Some(16));
        assert!(matches!(
            result,
            Err(Error::OutOfMemory {
                requested: 128,
                available: 16
            })
        ));
    }

    #[test]
    fn test_acquire_and_release() {
        let mut memory = HeapMemory::new(0, 0, Some(300)).unwrap();
        let rx = memory.acquire(BufferKind::Receive, 256).unwrap();
        assert_eq!(rx.capacity(), 256);
        assert!(matches!(
            memory.acquire(BufferKind::Transmit, 256),
            Err(Error::OutOfMemory {
                requested: 256,
                available: 44
            })
        ));

        memory.release(rx);
        assert_eq!(memory.used(), 0);
        let tx = memory.acquire(BufferKind::Transmit, 256).unwrap();
        assert_eq!(tx.kind(), BufferKind::Transmit);
    }

    #[test]
    fn test_unbounded_budget() {
        let mut memory = HeapMemory::new(0, 8, None).unwrap();
        let buffer = memory.acquire(BufferKind::Receive, 4096).unwrap();
        assert_eq!(buffer.capacity(), 4096);
    }
}
