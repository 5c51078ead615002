//! The story file's memory image
//!
//! All multi-byte values are big-endian: the high byte lives at `addr` and
//! the low byte at `addr + 1`. Every accessor is bounds checked; nothing in
//! the interpreter indexes the buffer directly.

use crate::error::ZError;
use std::fmt;

/// Owns the full, mutable byte buffer for the lifetime of a run.
#[derive(Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(bytes: Vec<u8>) -> Self {
        Memory { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check(&self, addr: usize, width: usize) -> Result<(), ZError> {
        if addr.checked_add(width).map_or(true, |end| end > self.bytes.len()) {
            return Err(ZError::OutOfBounds {
                address: addr,
                len: self.bytes.len(),
            });
        }
        Ok(())
    }

    /// Read a byte from memory
    pub fn get_byte(&self, addr: usize) -> Result<u8, ZError> {
        self.check(addr, 1)?;
        Ok(self.bytes[addr])
    }

    /// Read a word (2 bytes, big-endian) from memory
    pub fn get_word(&self, addr: usize) -> Result<u16, ZError> {
        self.check(addr, 2)?;
        Ok(u16::from_be_bytes([self.bytes[addr], self.bytes[addr + 1]]))
    }

    pub fn set_byte(&mut self, addr: usize, value: u8) -> Result<(), ZError> {
        self.check(addr, 1)?;
        self.bytes[addr] = value;
        Ok(())
    }

    pub fn set_word(&mut self, addr: usize, value: u16) -> Result<(), ZError> {
        self.check(addr, 2)?;
        let [high, low] = value.to_be_bytes();
        self.bytes[addr] = high;
        self.bytes[addr + 1] = low;
        Ok(())
    }

    /// Borrow `len` bytes starting at `addr`, for diagnostics
    pub fn read_slice(&self, addr: usize, len: usize) -> Result<&[u8], ZError> {
        self.check(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memory({} bytes)", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_get_word_is_big_endian() {
        let memory = Memory::new(vec![0xff, 0x01, 0x65, 0xee]);
        assert_eq!(memory.get_word(1).unwrap(), 0x0165);

        let memory = Memory::new(vec![0x01, 0x65]);
        assert_eq!(memory.get_word(0).unwrap(), 0x0165);
    }

    #[test]
    fn test_set_word_round_trips_through_bytes() {
        let mut memory = Memory::new(vec![0; 4]);
        memory.set_word(2, 0xabcd).unwrap();
        assert_eq!(memory.get_byte(2).unwrap(), 0xab);
        assert_eq!(memory.get_byte(3).unwrap(), 0xcd);
        memory.set_byte(2, 0x12).unwrap();
        assert_eq!(memory.get_word(2).unwrap(), 0x12cd);
    }

    #[test]
    fn test_out_of_bounds_access_fails() {
        let mut memory = Memory::new(vec![0; 4]);
        assert_eq!(
            memory.get_word(3),
            Err(ZError::OutOfBounds { address: 3, len: 4 })
        );
        assert!(memory.get_byte(4).is_err());
        assert!(memory.set_word(usize::MAX, 1).is_err());
        assert!(memory.set_byte(4, 1).is_err());
    }
}
