//! Frame encoding and hand-off to the transport.
//!
//! [`FrameTransmitter`] owns the transmit buffer. It writes the slave
//! address, the PDU and the little-endian CRC, then hands the finished ADU
//! to a [`Transport`].

use core::marker::PhantomData;

use crate::config::RtuConfig;
use crate::crc::{CRC_LEN, Crc16, DefaultCrc};
use crate::memory::{Buffer, BufferKind, ByteStorage, MemoryModel};
use crate::{Error, Result};

/// Byte sink for outgoing frames (a UART driver, a DMA channel, ...).
///
/// The whole ADU is passed at once; the transport is responsible for
/// keeping the line quiet for t3.5 before the next frame.
pub trait Transport {
    /// Send one complete frame.
    ///
    /// Implementations map their own failures to [`Error::Transport`].
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    #[inline]
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }
}

/// A transport that records every frame in memory.
///
/// Useful on a host for simulations and tests.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default)]
pub struct VecTransport {
    frames: alloc::vec::Vec<alloc::vec::Vec<u8>>,
}

#[cfg(feature = "alloc")]
impl VecTransport {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far, oldest first.
    pub fn frames(&self) -> &[alloc::vec::Vec<u8>] {
        &self.frames
    }

    /// The most recent frame.
    pub fn last(&self) -> Option<&[u8]> {
        self.frames.last().map(|f| f.as_slice())
    }

    /// Take every recorded frame, leaving the recorder empty.
    pub fn take(&mut self) -> alloc::vec::Vec<alloc::vec::Vec<u8>> {
        core::mem::take(&mut self.frames)
    }
}

#[cfg(feature = "alloc")]
impl Transport for VecTransport {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

/// Transmit side of an RTU channel.
pub struct FrameTransmitter<B, K = DefaultCrc> {
    buffer: Buffer<B>,
    frames_sent: u32,
    _crc: PhantomData<K>,
}

impl<B: ByteStorage, K: Crc16> FrameTransmitter<B, K> {
    /// Acquire a transmit buffer from `memory`.
    pub fn new<M>(memory: &mut M, config: &RtuConfig) -> Result<Self>
    where
        M: MemoryModel<Bytes = B>,
    {
        let buffer = memory.acquire(BufferKind::Transmit, config.tx_capacity)?;
        Ok(Self::from_buffer(buffer))
    }

    /// Use an already acquired buffer.
    pub fn from_buffer(mut buffer: Buffer<B>) -> Self {
        buffer.clear();
        Self {
            buffer,
            frames_sent: 0,
            _crc: PhantomData,
        }
    }

    /// Give the transmit buffer back to `memory`.
    pub fn release<M>(self, memory: &mut M)
    where
        M: MemoryModel<Bytes = B>,
    {
        memory.release(self.buffer);
    }

    /// Largest PDU that fits next to the address and CRC.
    #[inline]
    pub fn max_pdu_len(&self) -> usize {
        self.buffer.capacity().saturating_sub(1 + CRC_LEN)
    }

    /// Encode `address` and `pdu` into an ADU.
    ///
    /// Fails with [`Error::BufferOverrun`] without touching the buffer
    /// contents if the ADU does not fit.
    pub fn encode(&mut self, address: u8, pdu: &[u8]) -> Result<&[u8]> {
        if pdu.len() > self.max_pdu_len() {
            return Err(Error::BufferOverrun {
                capacity: self.buffer.capacity(),
            });
        }
        self.buffer.clear();
        self.buffer.push(address)?;
        self.buffer.extend_from_slice(pdu)?;
        let crc = K::to_wire(self.buffer.as_slice());
        self.buffer.extend_from_slice(&crc)?;
        Ok(self.buffer.as_slice())
    }

    /// Encode a PDU written in place by `write_pdu`.
    ///
    /// `write_pdu` receives the PDU region of the buffer and returns how
    /// many bytes it wrote, or `None` when there is nothing to send. This
    /// avoids a second copy of the response on small targets.
    pub fn build<F>(&mut self, address: u8, write_pdu: F) -> Result<Option<&[u8]>>
    where
        F: FnOnce(&mut [u8]) -> Result<Option<usize>>,
    {
        let capacity = self.buffer.capacity();
        let max_pdu = self.max_pdu_len();
        if max_pdu == 0 {
            return Err(Error::BufferOverrun { capacity });
        }
        self.buffer.clear();

        let region = self.buffer.writable();
        region[0] = address;
        let Some(pdu_len) = write_pdu(&mut region[1..1 + max_pdu])? else {
            return Ok(None);
        };
        if pdu_len > max_pdu {
            return Err(Error::BufferOverrun { capacity });
        }
        let body_len = 1 + pdu_len;
        let crc = K::to_wire(&region[..body_len]);
        region[body_len..body_len + CRC_LEN].copy_from_slice(&crc);
        self.buffer.set_len(body_len + CRC_LEN)?;
        Ok(Some(self.buffer.as_slice()))
    }

    /// Encode and transmit in one step.
    pub fn send<T: Transport>(&mut self, transport: &mut T, address: u8, pdu: &[u8]) -> Result<()> {
        self.encode(address, pdu)?;
        self.flush(transport)
    }

    /// Transmit the frame currently in the buffer.
    pub fn flush<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        transport.transmit(self.buffer.as_slice())?;
        self.frames_sent = self.frames_sent.saturating_add(1);
        trace!("sent {} bytes", self.buffer.len());
        Ok(())
    }

    /// The last encoded frame.
    #[inline]
    pub fn frame(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Number of frames handed to a transport.
    #[inline]
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }
}
