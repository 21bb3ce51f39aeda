//! # Frame Memory
//!
//! Byte-addressable scratch memory. Grows by whole 32-byte words, zero-filled;
//! reads past the current length implicitly expand first, so a read never
//! fails for being out of range.

use crate::errors::VmError;

/// Word size in bytes.
pub const WORD_SIZE: usize = 32;

/// Expandable zero-filled byte buffer.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    bytes: Vec<u8>,
    limit: usize,
}

impl Memory {
    /// Creates empty memory capped at `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    /// Current length in bytes; always a multiple of the word size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been written or expanded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current length in 32-byte words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.bytes.len() / WORD_SIZE
    }

    /// Grows memory to cover `min_size` bytes, rounded up to a word boundary.
    /// Returns the number of words added, for expansion-cost accounting.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` past the configured cap.
    pub fn expand(&mut self, min_size: usize) -> Result<usize, VmError> {
        if min_size <= self.bytes.len() {
            return Ok(0);
        }
        if min_size > self.limit {
            return Err(VmError::MemoryLimitExceeded {
                requested: min_size,
                max: self.limit,
            });
        }
        let old_words = self.word_count();
        let new_words = min_size.div_ceil(WORD_SIZE);
        self.bytes.resize(new_words * WORD_SIZE, 0);
        Ok(new_words - old_words)
    }

    /// Reads `len` bytes at `offset`, expanding to cover the range first.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` if the range cannot be covered.
    pub fn read(&mut self, offset: usize, len: usize) -> Result<Vec<u8>, VmError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let end = offset
            .checked_add(len)
            .ok_or(VmError::MemoryLimitExceeded {
                requested: usize::MAX,
                max: self.limit,
            })?;
        self.expand(end)?;
        Ok(self.bytes[offset..end].to_vec())
    }

    /// Reads a 32-byte word at `offset`, expanding to cover it.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` if the range cannot be covered.
    pub fn read_word(&mut self, offset: usize) -> Result<[u8; 32], VmError> {
        let bytes = self.read(offset, WORD_SIZE)?;
        let mut word = [0u8; 32];
        word.copy_from_slice(&bytes);
        Ok(word)
    }

    /// Copies bytes out without expanding; missing bytes read as zero.
    /// Used when capturing RETURN/REVERT output.
    #[must_use]
    pub fn read_padded(&self, offset: usize, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (i, slot) in out.iter_mut().enumerate() {
            if let Some(&b) = offset.checked_add(i).and_then(|p| self.bytes.get(p)) {
                *slot = b;
            }
        }
        out
    }

    /// Writes `data` at `offset`, expanding as needed.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` if the range cannot be covered.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<usize, VmError> {
        if data.is_empty() {
            return Ok(0);
        }
        let end = offset
            .checked_add(data.len())
            .ok_or(VmError::MemoryLimitExceeded {
                requested: usize::MAX,
                max: self.limit,
            })?;
        let added = self.expand(end)?;
        self.bytes[offset..end].copy_from_slice(data);
        Ok(added)
    }

    /// Writes one byte at `offset`, expanding as needed.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` if the byte cannot be covered.
    pub fn write_byte(&mut self, offset: usize, byte: u8) -> Result<usize, VmError> {
        self.write(offset, &[byte])
    }

    /// Copies `len` bytes from `src` to `dest` within memory (MCOPY). Source
    /// bytes past the current length read as zero.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` if either range cannot be covered.
    pub fn copy_within(&mut self, dest: usize, src: usize, len: usize) -> Result<usize, VmError> {
        if len == 0 {
            return Ok(0);
        }
        let span_end = dest
            .max(src)
            .checked_add(len)
            .ok_or(VmError::MemoryLimitExceeded {
                requested: usize::MAX,
                max: self.limit,
            })?;
        let added = self.expand(span_end)?;
        self.bytes.copy_within(src..src + len, dest);
        Ok(added)
    }

    /// Raw view of the buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> Memory {
        Memory::with_limit(1024 * 1024)
    }

    #[test]
    fn expansion_rounds_to_word_boundary() {
        let mut m = mem();
        assert_eq!(m.expand(1).unwrap(), 1);
        assert_eq!(m.len(), 32);
        assert_eq!(m.expand(33).unwrap(), 1);
        assert_eq!(m.len(), 64);
        assert_eq!(m.expand(10).unwrap(), 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut m = mem();
        m.write(5, &[1, 2, 3, 4]).unwrap();
        assert_eq!(m.read(5, 4).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn read_of_untouched_memory_is_zero_filled() {
        let mut m = mem();
        assert_eq!(m.read(100, 8).unwrap(), vec![0u8; 8]);
        // The read itself expanded to cover the range.
        assert_eq!(m.len(), 128);
    }

    #[test]
    fn read_padded_does_not_expand() {
        let mut m = mem();
        m.write(0, &[9, 9]).unwrap();
        let out = m.read_padded(0, 64);
        assert_eq!(out[0], 9);
        assert_eq!(out[63], 0);
        assert_eq!(m.len(), 32);
    }

    #[test]
    fn copy_within_handles_overlap() {
        let mut m = mem();
        m.write(0, &[1, 2, 3, 4, 5]).unwrap();
        m.copy_within(2, 0, 4).unwrap();
        assert_eq!(m.read(0, 6).unwrap(), vec![1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn copy_within_reads_zeros_past_length() {
        let mut m = mem();
        m.write(0, &[7]).unwrap();
        m.copy_within(0, 64, 4).unwrap();
        assert_eq!(m.read(0, 4).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn limit_is_enforced() {
        let mut m = Memory::with_limit(64);
        assert!(m.expand(64).is_ok());
        assert!(matches!(
            m.expand(65),
            Err(VmError::MemoryLimitExceeded { .. })
        ));
    }
}
