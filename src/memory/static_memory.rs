//! Compile-time sized memory: no heap, no allocation failures.

use super::{Buffer, BufferKind, MemoryModel, RegisterTable};
use crate::config::{RtuConfig, STATIC_BUFFER_LEN, STATIC_REGISTER_COUNT};
use crate::{Error, Result};

/// Memory backed by fixed-size arrays.
///
/// Every buffer handed out is a `[u8; BUF]` that lives inline in its owner,
/// and the register table is a `[u16; REGS]` inside this struct, so a channel
/// placed in a `static` has its whole footprint known at link time.
///
/// `BUF` and `REGS` are upper bounds. [`init`](MemoryModel::init) maps
/// exactly `register_count` registers and rejects a configuration that needs
/// more than the arrays hold, so a configuration exposes the same register
/// window and buffer sizes as it would with heap memory.
/// [`acquire`](MemoryModel::acquire) fails with [`Error::OutOfMemory`] for a
/// request larger than `BUF`. [`release`](MemoryModel::release) is a no-op.
#[derive(Debug, Clone)]
pub struct StaticMemory<const BUF: usize = STATIC_BUFFER_LEN, const REGS: usize = STATIC_REGISTER_COUNT>
{
    registers: RegisterTable<[u16; REGS]>,
}

impl<const BUF: usize, const REGS: usize> StaticMemory<BUF, REGS> {
    /// Reserve memory with all `REGS` registers mapped from `register_base`.
    pub fn new(register_base: u16) -> Self {
        Self {
            registers: RegisterTable::new(register_base, [0u16; REGS]),
        }
    }
}

impl<const BUF: usize, const REGS: usize> Default for StaticMemory<BUF, REGS> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const BUF: usize, const REGS: usize> MemoryModel for StaticMemory<BUF, REGS> {
    type Bytes = [u8; BUF];
    type Words = [u16; REGS];

    fn init(config: &RtuConfig) -> Result<Self> {
        let count = usize::from(config.register_count);
        if count > REGS {
            warn!("{count} registers configured, static storage holds {REGS}");
            return Err(Error::InvalidConfig(
                "register count exceeds static register storage",
            ));
        }
        if config.rx_capacity > BUF || config.tx_capacity > BUF {
            warn!(
                "buffers of {}/{} bytes configured, static buffers hold {BUF}",
                config.rx_capacity, config.tx_capacity
            );
            return Err(Error::InvalidConfig(
                "buffer capacity exceeds static buffer size",
            ));
        }
        Ok(Self {
            registers: RegisterTable::with_len(config.register_base, [0u16; REGS], count),
        })
    }

    fn acquire(&mut self, kind: BufferKind, requested: usize) -> Result<Buffer<[u8; BUF]>> {
        if requested > BUF {
            warn!("static {kind:?} buffer of {requested} bytes requested, {BUF} available");
            return Err(Error::OutOfMemory {
                requested,
                available: BUF,
            });
        }
        Ok(Buffer::new(kind, [0u8; BUF], requested))
    }

    fn release(&mut self, _buffer: Buffer<[u8; BUF]>) {}

    fn registers(&self) -> &RegisterTable<[u16; REGS]> {
        &self.registers
    }

    fn register_table(&mut self) -> &mut RegisterTable<[u16; REGS]> {
        &mut self.registers
    }
}
