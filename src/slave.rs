//! A complete RTU slave channel.
//!
//! [`RtuSlave`] wires a [`FrameReceiver`], a [`FrameTransmitter`], the
//! [`MemoryModel`] that backs both, and a [`Dispatcher`] into one object.
//! The byte source calls [`on_byte`](RtuSlave::on_byte); the main loop calls
//! [`poll`](RtuSlave::poll), which moves at most one request through
//! dispatch and onto the transport.

use crate::config::RtuConfig;
use crate::crc::{Crc16, DefaultCrc};
use crate::dispatch::Dispatcher;
use crate::memory::{MemoryModel, RegisterTable};
use crate::receiver::{FrameReceiver, ReceiverStats};
use crate::timing::{Clock, Phase};
use crate::transmitter::{FrameTransmitter, Transport};
use crate::Result;

/// What one call to [`RtuSlave::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No frame was ready.
    Idle,
    /// A frame was dispatched and needed no reply.
    NoReply,
    /// A reply of `len` bytes was transmitted.
    Replied {
        /// Size of the reply ADU
        len: usize,
    },
}

/// Slave side of an RTU channel.
pub struct RtuSlave<M: MemoryModel, C, D, K = DefaultCrc> {
    memory: M,
    receiver: FrameReceiver<M::Bytes, C, K>,
    transmitter: FrameTransmitter<M::Bytes, K>,
    dispatcher: D,
    address: u8,
}

impl<M, C, D, K> RtuSlave<M, C, D, K>
where
    M: MemoryModel,
    C: Clock,
    D: Dispatcher<M::Words>,
    K: Crc16,
{
    /// Build a slave on `memory`, acquiring both buffers from it.
    pub fn new(config: &RtuConfig, mut memory: M, clock: C, dispatcher: D) -> Result<Self> {
        let receiver = FrameReceiver::new(&mut memory, config, clock)?;
        let transmitter = FrameTransmitter::new(&mut memory, config)?;
        debug!("slave {} ready", config.slave_address);
        Ok(Self {
            memory,
            receiver,
            transmitter,
            dispatcher,
            address: config.slave_address,
        })
    }

    /// Initialize memory for `config`, then build the slave.
    ///
    /// Any allocation failure is returned before a single byte is handled.
    pub fn init(config: &RtuConfig, clock: C, dispatcher: D) -> Result<Self> {
        let memory = M::init(config)?;
        Self::new(config, memory, clock, dispatcher)
    }

    /// Feed one received byte; see [`FrameReceiver::on_byte`].
    #[inline]
    pub fn on_byte(&mut self, byte: u8, timestamp: u64) -> Result<()> {
        self.receiver.on_byte(byte, timestamp)
    }

    /// Feed one byte stamped with the clock's current time.
    #[inline]
    pub fn on_byte_now(&mut self, byte: u8) -> Result<()> {
        self.receiver.on_byte_now(byte)
    }

    /// Advance a periodic clock by one tick.
    #[inline]
    pub fn on_tick(&mut self) {
        self.receiver.on_tick();
    }

    /// Dispatch the next completed frame, if any, and send the reply.
    pub fn poll<T: Transport>(&mut self, transport: &mut T) -> Result<PollOutcome> {
        let Some(frame) = self.receiver.poll() else {
            return Ok(PollOutcome::Idle);
        };

        let registers = self.memory.register_table();
        let dispatcher = &mut self.dispatcher;
        let reply = self
            .transmitter
            .build(self.address, |response| {
                dispatcher.dispatch(&frame, registers, response)
            })?;

        match reply {
            Some(adu) => {
                let len = adu.len();
                self.transmitter.flush(transport)?;
                Ok(PollOutcome::Replied { len })
            }
            None => Ok(PollOutcome::NoReply),
        }
    }

    /// Abandon any frame in progress.
    #[inline]
    pub fn reset(&mut self) {
        self.receiver.reset();
    }

    /// The register table.
    #[inline]
    pub fn registers(&self) -> &RegisterTable<M::Words> {
        self.memory.registers()
    }

    /// The register table, mutably, for the application to update.
    #[inline]
    pub fn registers_mut(&mut self) -> &mut RegisterTable<M::Words> {
        self.memory.register_table()
    }

    /// Receive counters.
    #[inline]
    pub fn stats(&self) -> &ReceiverStats {
        self.receiver.stats()
    }

    /// Number of replies transmitted.
    #[inline]
    pub fn replies_sent(&self) -> u32 {
        self.transmitter.frames_sent()
    }

    /// Current receive phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.receiver.phase()
    }

    /// The slave address served.
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The clock, mutably; used to advance manual clocks.
    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        self.receiver.clock_mut()
    }

    /// The dispatcher.
    #[inline]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Tear the channel down, returning both buffers to memory.
    pub fn into_memory(self) -> M {
        let mut memory = self.memory;
        self.receiver.release(&mut memory);
        self.transmitter.release(&mut memory);
        memory
    }
}
