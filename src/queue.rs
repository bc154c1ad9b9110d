//! Interrupt-to-main-loop byte hand-off.
//!
//! When bytes arrive in a UART interrupt but frames are polled from the
//! main loop, the receiver is shared mutable state. Instead of wrapping it
//! in a critical section, the interrupt pushes timestamped [`ByteEvent`]s
//! into a lock-free single-producer/single-consumer queue and the main loop
//! drains them into the receiver, which then has exactly one owner.
//!
//! # Example
//!
//! ```
//! use mbrtu::queue::{ByteEvent, EventQueue, split};
//!
//! let mut queue: EventQueue<16> = EventQueue::new();
//! let (mut producer, mut consumer) = split(&mut queue);
//!
//! // In the UART interrupt:
//! producer.push(0x11, 1_000).unwrap();
//!
//! // In the main loop:
//! assert_eq!(consumer.pop(), Some(ByteEvent { byte: 0x11, timestamp: 1_000 }));
//! ```

use heapless::spsc::{Consumer, Producer, Queue};

use crate::crc::Crc16;
use crate::memory::ByteStorage;
use crate::receiver::FrameReceiver;
use crate::timing::Clock;
use crate::{Error, Result};

/// A byte and the time it was received, in clock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ByteEvent {
    /// The received byte.
    pub byte: u8,
    /// When it was received.
    pub timestamp: u64,
}

/// Storage for up to `N - 1` pending events.
pub type EventQueue<const N: usize> = Queue<ByteEvent, N>;

/// Split `queue` into its interrupt side and its main-loop side.
pub fn split<const N: usize>(
    queue: &mut EventQueue<N>,
) -> (EventProducer<'_, N>, EventConsumer<'_, N>) {
    let (producer, consumer) = queue.split();
    (EventProducer(producer), EventConsumer(consumer))
}

/// Interrupt side of the queue.
pub struct EventProducer<'a, const N: usize>(Producer<'a, ByteEvent, N>);

impl<const N: usize> EventProducer<'_, N> {
    /// Queue a received byte.
    ///
    /// Fails with [`Error::QueueFull`] if the main loop has fallen behind;
    /// the byte is lost and the frame it belonged to will fail its CRC.
    #[inline]
    pub fn push(&mut self, byte: u8, timestamp: u64) -> Result<()> {
        self.0
            .enqueue(ByteEvent { byte, timestamp })
            .map_err(|_| Error::QueueFull)
    }

    /// Returns true if another event can be queued.
    #[inline]
    pub fn ready(&self) -> bool {
        self.0.ready()
    }
}

/// Main-loop side of the queue.
pub struct EventConsumer<'a, const N: usize>(Consumer<'a, ByteEvent, N>);

impl<const N: usize> EventConsumer<'_, N> {
    /// Take the oldest pending event.
    #[inline]
    pub fn pop(&mut self) -> Option<ByteEvent> {
        self.0.dequeue()
    }

    /// Number of pending events.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// Feed every pending event to `receiver`, oldest first.
    ///
    /// Returns the number of events fed. Processing stops at the first
    /// error; later events stay queued for the next call.
    pub fn drain_into<B, C, K>(&mut self, receiver: &mut FrameReceiver<B, C, K>) -> Result<usize>
    where
        B: ByteStorage,
        C: Clock,
        K: Crc16,
    {
        let mut fed = 0;
        while let Some(event) = self.0.dequeue() {
            fed += 1;
            receiver.on_byte(event.byte, event.timestamp)?;
        }
        Ok(fed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RtuConfig;
    use crate::crc::LookupCrc;
    use crate::memory::StaticMemory;
    use crate::timing::ManualClock;

    #[test]
    fn test_queue_full() {
        let mut queue: EventQueue<4> = EventQueue::new();
        let (mut producer, _consumer) = split(&mut queue);
        producer.push(1, 0).unwrap();
        producer.push(2, 0).unwrap();
        producer.push(3, 0).unwrap();
        assert!(!producer.ready());
        assert!(matches!(producer.push(4, 0), Err(Error::QueueFull)));
    }

    #[test]
    fn test_drain_into_receiver() {
        let mut queue: EventQueue<16> = EventQueue::new();
        let (mut producer, mut consumer) = split(&mut queue);
        let adu = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
        for (i, &b) in adu.iter().enumerate() {
            producer.push(b, i as u64 * 1_000).unwrap();
        }
        assert_eq!(consumer.len(), 8);

        let config = RtuConfig {
            rx_capacity: 32,
            ..RtuConfig::default()
        };
        let mut memory = StaticMemory::<32, 1>::default();
        let mut rx: FrameReceiver<[u8; 32], ManualClock, LookupCrc> =
            FrameReceiver::new(&mut memory, &config, ManualClock::new(0)).unwrap();
        assert_eq!(consumer.drain_into(&mut rx).unwrap(), 8);
        assert!(consumer.is_empty());

        let frame = rx.poll_at(7_000 + 5_000).unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.as_bytes(), &adu);
    }
}
