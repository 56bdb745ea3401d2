//! Codec registry: maps an algorithm id (flags bits 4-7) to an implementation.
//!
//! Mirrors the teacher's `Codec` trait + `CodecId` registry pattern for
//! pluggable compressors. Only the Block codec (id 1) is implemented; ids
//! 2-15 are reserved by the wire format for future algorithms this build
//! does not understand — a container naming one of them fails closed with
//! `UnknownAlgorithm` rather than guessing at a fallback.

pub mod block;

pub use block::{BlockDecoder, BlockEncoder};

use crate::error::BlockError;
use crate::flags::ALGORITHM_BLOCK;

/// Common surface every algorithm id on the wire implements. `decode_block`
/// bounds its output by `out.len()` rather than a separate size parameter —
/// every call site already sizes its buffer to the container's
/// `MaxBlockSize` before decoding into it.
pub trait Codec {
    fn algorithm_id(&self) -> u8;
    fn encode_block(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<bool, BlockError>;
    fn decode_block(&mut self, payload: &[u8], out: &mut [u8]) -> Result<usize, BlockError>;
    fn reset_dictionary(&mut self);
}

/// The sole built-in `Codec`: the Block LZ codec (algorithm id 1). Carries
/// both an encoder and a decoder side so one registry entry can serve either
/// direction of a stream, the way the teacher's registry resolves one
/// `CodecId` to one implementation regardless of which direction is used.
pub struct BlockCodec {
    encoder: BlockEncoder,
    decoder: BlockDecoder,
}

impl BlockCodec {
    pub fn new() -> Self {
        Self {
            encoder: BlockEncoder::new(),
            decoder: BlockDecoder::new(),
        }
    }

    /// Feed a stored (uncompressed) block's plaintext into the decode-side
    /// dictionary. Not part of `Codec` — stored blocks bypass encode/decode
    /// entirely but must still be observed so later compressed blocks can
    /// back-reference them (spec §4.1).
    pub fn observe_stored(&mut self, data: &[u8]) {
        self.decoder.observe_stored(data);
    }
}

impl Default for BlockCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for BlockCodec {
    fn algorithm_id(&self) -> u8 {
        ALGORITHM_BLOCK
    }

    fn encode_block(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<bool, BlockError> {
        self.encoder.encode_block(input, out)
    }

    fn decode_block(&mut self, payload: &[u8], out: &mut [u8]) -> Result<usize, BlockError> {
        let max_block_size = out.len();
        self.decoder.decode_block(payload, out, max_block_size)
    }

    fn reset_dictionary(&mut self) {
        self.encoder.reset();
        self.decoder.reset();
    }
}

/// Whether `id` names an algorithm this build can encode or decode.
pub fn is_known_algorithm(id: u8) -> bool {
    id == ALGORITHM_BLOCK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_codec_reports_its_algorithm_id() {
        let codec = BlockCodec::new();
        assert_eq!(codec.algorithm_id(), ALGORITHM_BLOCK);
    }

    #[test]
    fn block_codec_roundtrips_through_the_trait() {
        let mut codec = BlockCodec::new();
        let input = b"the quick brown fox jumps over the lazy dog";
        let mut payload = Vec::new();
        let compressed = codec.encode_block(input, &mut payload).unwrap();
        assert!(compressed);

        let mut out = vec![0u8; 512];
        let n = codec.decode_block(&payload, &mut out).unwrap();
        assert_eq!(&out[..n], &input[..]);
    }

    #[test]
    fn reset_dictionary_clears_both_sides() {
        let mut codec = BlockCodec::new();
        let mut payload = Vec::new();
        codec.encode_block(b"seed the dictionary", &mut payload).unwrap();
        codec.reset_dictionary();
        // after a reset, a fresh block can't back-reference pre-reset history.
        let mut payload2 = Vec::new();
        codec.encode_block(b"seed the dictionary", &mut payload2).unwrap();
        assert_eq!(payload, payload2);
    }
}
