//! Castagnoli CRC32 (CRC32C) over frame payloads.
//!
//! Computed over the bytes as written to the wire — ciphertext when
//! encryption is enabled, plaintext otherwise — so it validates the on-disk
//! representation, not the logical content (spec §4.5).

/// Checksum `data` with the Castagnoli polynomial (`0x1EDC6F41`).
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    ::crc32c::crc32c(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // "123456789" is the standard CRC32C conformance vector.
        assert_eq!(checksum(b"123456789"), 0xE306_9283);
    }

    #[test]
    fn empty_input() {
        assert_eq!(checksum(b""), 0);
    }
}
