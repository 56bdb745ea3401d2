//! The 32-bit flags bitfield, fixed at container construction.
//!
//! # Layout
//! ```text
//! bits 0-3   input block size exponent e; MaxBlockSize = 1 << (e + 9)
//! bits 4-7   algorithm id (Block = 1)
//! bit  8     include per-block CRC32C
//! bit  9     include container header
//! bit  10    include trailer
//! bit  11    honor caller-initiated flush boundaries
//! bit  12    payload is encrypted ("encrypt-inner")
//! bit  13    container is wrapped by a stream cipher ("encrypt-full")
//! bit  14    a single file-info record precedes payload blocks
//! bits 15-31 reserved; must be zero
//! ```

use crate::error::ContainerError;

/// Algorithm id for the Block codec (the only algorithm this crate implements).
pub const ALGORITHM_BLOCK: u8 = 1;

const BIT_CRC: u32 = 1 << 8;
const BIT_HEADER: u32 = 1 << 9;
const BIT_TRAILER: u32 = 1 << 10;
const BIT_RESPECT_FLUSH: u32 = 1 << 11;
const BIT_ENCRYPT_INNER: u32 = 1 << 12;
const BIT_ENCRYPT_FULL: u32 = 1 << 13;
const BIT_FILE_INFO: u32 = 1 << 14;

/// Every bit this build understands. Any bit set outside this mask aborts
/// decompression — there is no forward-compatible negotiation (spec non-goal).
pub const KNOWN_MASK: u32 = 0x0000_7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags(pub u32);

impl Flags {
    pub fn new(block_size_exponent: u8, algorithm_id: u8) -> Result<Self, ContainerError> {
        if block_size_exponent > 15 {
            return Err(ContainerError::InvalidBlockSizeExponent(block_size_exponent));
        }
        if algorithm_id > 15 {
            return Err(ContainerError::UnknownAlgorithm(algorithm_id));
        }
        Ok(Self(block_size_exponent as u32 | ((algorithm_id as u32) << 4)))
    }

    /// Parse flags read off the wire, rejecting unknown bits.
    pub fn from_wire(raw: u32) -> Result<Self, ContainerError> {
        if raw & !KNOWN_MASK != 0 {
            return Err(ContainerError::UnknownFlags(raw));
        }
        let f = Self(raw);
        if f.encrypt_inner() && f.encrypt_full() {
            return Err(ContainerError::ConflictingEncryptionModes);
        }
        Ok(f)
    }

    #[inline]
    pub fn block_size_exponent(&self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    #[inline]
    pub fn max_block_size(&self) -> usize {
        1usize << (self.block_size_exponent() as u32 + 9)
    }

    #[inline]
    pub fn algorithm_id(&self) -> u8 {
        ((self.0 >> 4) & 0x0F) as u8
    }

    #[inline]
    pub fn has_crc(&self) -> bool {
        self.0 & BIT_CRC != 0
    }
    #[inline]
    pub fn has_header(&self) -> bool {
        self.0 & BIT_HEADER != 0
    }
    #[inline]
    pub fn has_trailer(&self) -> bool {
        self.0 & BIT_TRAILER != 0
    }
    #[inline]
    pub fn respect_flush(&self) -> bool {
        self.0 & BIT_RESPECT_FLUSH != 0
    }
    #[inline]
    pub fn encrypt_inner(&self) -> bool {
        self.0 & BIT_ENCRYPT_INNER != 0
    }
    #[inline]
    pub fn encrypt_full(&self) -> bool {
        self.0 & BIT_ENCRYPT_FULL != 0
    }
    #[inline]
    pub fn has_file_info(&self) -> bool {
        self.0 & BIT_FILE_INFO != 0
    }

    pub fn set_crc(&mut self, v: bool) {
        self.set_bit(BIT_CRC, v);
    }
    pub fn set_header(&mut self, v: bool) {
        self.set_bit(BIT_HEADER, v);
    }
    pub fn set_trailer(&mut self, v: bool) {
        self.set_bit(BIT_TRAILER, v);
    }
    pub fn set_respect_flush(&mut self, v: bool) {
        self.set_bit(BIT_RESPECT_FLUSH, v);
    }
    pub fn set_encrypt_inner(&mut self, v: bool) {
        self.set_bit(BIT_ENCRYPT_INNER, v);
    }
    pub fn set_encrypt_full(&mut self, v: bool) {
        self.set_bit(BIT_ENCRYPT_FULL, v);
    }
    pub fn set_file_info(&mut self, v: bool) {
        self.set_bit(BIT_FILE_INFO, v);
    }

    fn set_bit(&mut self, bit: u32, v: bool) {
        if v {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_block_size_matches_spec_table() {
        let f = Flags::new(0, ALGORITHM_BLOCK).unwrap();
        assert_eq!(f.max_block_size(), 512);
        let f = Flags::new(15, ALGORITHM_BLOCK).unwrap();
        assert_eq!(f.max_block_size(), 16 * 1024 * 1024);
    }

    #[test]
    fn rejects_unknown_bits() {
        let raw = 1u32 << 20;
        assert!(matches!(Flags::from_wire(raw), Err(ContainerError::UnknownFlags(_))));
    }

    #[test]
    fn rejects_conflicting_encryption_modes() {
        let mut f = Flags::new(0, ALGORITHM_BLOCK).unwrap();
        f.set_encrypt_inner(true);
        f.set_encrypt_full(true);
        assert!(matches!(
            Flags::from_wire(f.0),
            Err(ContainerError::ConflictingEncryptionModes)
        ));
    }

    #[test]
    fn rejects_out_of_range_exponent() {
        assert!(Flags::new(16, ALGORITHM_BLOCK).is_err());
    }
}
