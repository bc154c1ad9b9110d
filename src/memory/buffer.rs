//! Bounded byte buffers over static or heap storage.

use crate::{Error, Result};

/// Which side of the link a buffer serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferKind {
    /// Outgoing frames.
    Transmit,
    /// Incoming frames.
    Receive,
}

/// Backing storage for a [`Buffer`].
///
/// Implemented for fixed-size arrays (static mode) and, with `alloc`, for
/// `Vec<u8>` (heap mode). The slice length is the physical size; a buffer
/// may expose less than that as its capacity.
pub trait ByteStorage {
    /// The whole storage.
    fn as_bytes(&self) -> &[u8];

    /// The whole storage, mutably.
    fn as_bytes_mut(&mut self) -> &mut [u8];
}

impl<const N: usize> ByteStorage for [u8; N] {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(feature = "alloc")]
impl ByteStorage for alloc::vec::Vec<u8> {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

/// A contiguous byte region with a length and a fixed capacity.
///
/// Every write is bounds-checked against the capacity: a write that would
/// overflow fails with [`Error::BufferOverrun`] and leaves the contents
/// untouched.
#[derive(Debug, Clone)]
pub struct Buffer<S> {
    storage: S,
    len: usize,
    capacity: usize,
    kind: BufferKind,
}

impl<S: ByteStorage> Buffer<S> {
    /// Wrap `storage`, exposing at most `capacity` bytes of it.
    pub fn new(kind: BufferKind, storage: S, capacity: usize) -> Self {
        let capacity = capacity.min(storage.as_bytes().len());
        Self {
            storage,
            len: 0,
            capacity,
            kind,
        }
    }

    /// Which side of the link this buffer serves.
    #[inline]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Number of bytes currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of bytes the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if another byte would overflow.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Bytes left before the buffer is full.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.is_full() {
            return Err(Error::BufferOverrun {
                capacity: self.capacity,
            });
        }
        self.storage.as_bytes_mut()[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Append all of `bytes`, or nothing if they do not fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(Error::BufferOverrun {
                capacity: self.capacity,
            });
        }
        let end = self.len + bytes.len();
        self.storage.as_bytes_mut()[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Read the byte at `index`, if it has been written.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// The bytes held so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage.as_bytes()[..self.len]
    }

    /// The bytes held so far, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage.as_bytes_mut()[..self.len]
    }

    /// The full addressable region, regardless of the current length.
    ///
    /// Used to build a frame in place before committing its length with
    /// [`set_len`](Self::set_len).
    #[inline]
    pub fn writable(&mut self) -> &mut [u8] {
        &mut self.storage.as_bytes_mut()[..self.capacity]
    }

    /// Commit the number of valid bytes after writing through
    /// [`writable`](Self::writable).
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.capacity {
            return Err(Error::BufferOverrun {
                capacity: self.capacity,
            });
        }
        self.len = len;
        Ok(())
    }

    /// Forget the contents; capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Give back the storage.
    #[inline]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_clamped_to_storage() {
        let buffer = Buffer::new(BufferKind::Receive, [0u8; 8], 32);
        assert_eq!(buffer.capacity(), 8);

        let buffer = Buffer::new(BufferKind::Receive, [0u8; 8], 4);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_push_until_overrun() {
        let mut buffer = Buffer::new(BufferKind::Receive, [0u8; 3], 3);
        buffer.push(1).unwrap();
        buffer.push(2).unwrap();
        buffer.push(3).unwrap();
        assert!(buffer.is_full());
        assert!(matches!(
            buffer.push(4),
            Err(Error::BufferOverrun { capacity: 3 })
        ));
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut buffer = Buffer::new(BufferKind::Transmit, [0u8; 4], 4);
        buffer.extend_from_slice(&[1, 2]).unwrap();
        assert!(buffer.extend_from_slice(&[3, 4, 5]).is_err());
        assert_eq!(buffer.as_slice(), &[1, 2]);
        buffer.extend_from_slice(&[3, 4]).unwrap();
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_writable_and_set_len() {
        let mut buffer = Buffer::new(BufferKind::Transmit, [0u8; 6], 5);
        assert_eq!(buffer.writable().len(), 5);
        buffer.writable()[..2].copy_from_slice(&[0xAA, 0xBB]);
        buffer.set_len(2).unwrap();
        assert_eq!(buffer.as_slice(), &[0xAA, 0xBB]);
        assert!(buffer.set_len(6).is_err());
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.get(0), None);
    }
}
