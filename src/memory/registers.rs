//! The mapped register table.

use crate::{Error, Result};

/// Backing storage for a [`RegisterTable`].
pub trait WordStorage {
    /// All register words.
    fn as_words(&self) -> &[u16];

    /// All register words, mutably.
    fn as_words_mut(&mut self) -> &mut [u16];
}

impl<const N: usize> WordStorage for [u16; N] {
    #[inline]
    fn as_words(&self) -> &[u16] {
        self
    }

    #[inline]
    fn as_words_mut(&mut self) -> &mut [u16] {
        self
    }
}

#[cfg(feature = "alloc")]
impl WordStorage for alloc::vec::Vec<u16> {
    #[inline]
    fn as_words(&self) -> &[u16] {
        self
    }

    #[inline]
    fn as_words_mut(&mut self) -> &mut [u16] {
        self
    }
}

/// A contiguous window of 16-bit registers starting at `base`.
///
/// Addresses are unique by construction and enumerate in ascending order.
/// Any access outside `[base, base + len)` fails with
/// [`Error::OutOfRange`]; range writes are all-or-nothing.
#[derive(Debug, Clone)]
pub struct RegisterTable<W> {
    base: u16,
    len: usize,
    words: W,
}

impl<W: WordStorage> RegisterTable<W> {
    /// Map `words` to addresses starting at `base`.
    ///
    /// Words that would fall past address 0xFFFF are not mapped.
    pub fn new(base: u16, words: W) -> Self {
        let len = words.as_words().len();
        Self::with_len(base, words, len)
    }

    /// Map only the first `len` of `words`, starting at `base`.
    ///
    /// `len` is clamped to the storage size and to address 0xFFFF.
    pub fn with_len(base: u16, words: W, len: usize) -> Self {
        let room = 0x1_0000 - usize::from(base);
        let len = len.min(words.as_words().len()).min(room);
        Self { base, len, words }
    }

    /// First mapped address.
    #[inline]
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Number of mapped registers.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no register is mapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `address` is mapped.
    #[inline]
    pub fn contains(&self, address: u16) -> bool {
        self.index_of(address).is_ok()
    }

    fn index_of(&self, address: u16) -> Result<usize> {
        match address.checked_sub(self.base) {
            Some(offset) if usize::from(offset) < self.len => Ok(usize::from(offset)),
            _ => Err(Error::OutOfRange { address }),
        }
    }

    /// Index range for `count` registers from `start`, checking both ends.
    fn span(&self, start: u16, count: usize) -> Result<core::ops::Range<usize>> {
        let first = self.index_of(start)?;
        if count == 0 {
            return Ok(first..first);
        }
        let end = first + count;
        if end > self.len {
            // Report the first address that is not mapped.
            let missing = u32::from(self.base) + self.len as u32;
            return Err(Error::OutOfRange {
                address: missing.min(0xFFFF) as u16,
            });
        }
        Ok(first..end)
    }

    /// Read one register.
    pub fn read(&self, address: u16) -> Result<u16> {
        let index = self.index_of(address)?;
        Ok(self.words.as_words()[index])
    }

    /// Write one register.
    pub fn write(&mut self, address: u16, value: u16) -> Result<()> {
        let index = self.index_of(address)?;
        self.words.as_words_mut()[index] = value;
        Ok(())
    }

    /// Read `out.len()` consecutive registers starting at `start`.
    pub fn read_range(&self, start: u16, out: &mut [u16]) -> Result<()> {
        let span = self.span(start, out.len())?;
        out.copy_from_slice(&self.words.as_words()[span]);
        Ok(())
    }

    /// Write consecutive registers starting at `start`.
    ///
    /// Nothing is written unless the whole range is mapped.
    pub fn write_range(&mut self, start: u16, values: &[u16]) -> Result<()> {
        let span = self.span(start, values.len())?;
        self.words.as_words_mut()[span].copy_from_slice(values);
        Ok(())
    }

    /// All mapped registers as `(address, value)` in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.as_slice()
            .iter()
            .enumerate()
            .map(move |(i, &value)| (self.base + i as u16, value))
    }

    /// All mapped register values in address order.
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.words.as_words()[..self.len]
    }

    /// Set every register to zero.
    pub fn clear(&mut self) {
        let len = self.len;
        self.words.as_words_mut()[..len].fill(0);
    }

    /// Give back the storage.
    #[inline]
    pub fn into_storage(self) -> W {
        self.words
    }
}
