//! Container framing: header, per-block frame prefix, trailer, and the
//! control-kind tag space they share.

pub mod file_info;
pub mod reader;
pub mod writer;

pub use reader::DecompressionStream;
pub use writer::CompressionStream;

use crate::error::ContainerError;
use crate::flags::Flags;

pub const HEADER_MAGIC: [u8; 3] = *b"bLz";
pub const VERSION: u8 = 0x01;
pub const TRAILER: [u8; 4] = [0xFF, b'Z', b'l', b'B'];

/// Frame control tags. A frame's first byte is either one of these fixed
/// tags or, for a payload-bearing frame, the algorithm id (1-15) it was
/// encoded with.
pub const TAG_STORED: u8 = 0x00;
pub const TAG_FILE_INFO: u8 = 0xFD;
pub const TAG_FLUSH: u8 = 0xF0;
pub const TAG_CONTROL: u8 = 0xF1;
pub const TAG_TRAILER: u8 = 0xFF;

/// The 8-byte fixed container header: magic(3) + version(1) + flags(4 LE).
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub flags: Flags,
}

pub const HEADER_LEN: usize = 8;

impl Header {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..3].copy_from_slice(&HEADER_MAGIC);
        buf[3] = VERSION;
        buf[4..8].copy_from_slice(&self.flags.0.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ContainerError> {
        if buf.len() < HEADER_LEN {
            return Err(ContainerError::InvalidMagic);
        }
        if buf[..3] != HEADER_MAGIC {
            return Err(ContainerError::InvalidMagic);
        }
        let version = buf[3];
        if version > VERSION {
            return Err(ContainerError::VersionTooNew(version, VERSION));
        }
        if version == 0 {
            return Err(ContainerError::VersionTooOld(version, VERSION));
        }
        let raw = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let flags = Flags::from_wire(raw)?;
        Ok(Self { flags })
    }
}

/// Frame prefix: 1 tag byte + 3-byte little-endian length. For payload-bearing
/// frames the wire length is biased by one (`payload_len - 1`, since a
/// payload is always at least one byte — spec §3); `len` here holds that
/// *wire* value, not the logical payload length. Use [`FramePrefix::payload`]
/// to construct from a logical length and [`FramePrefix::payload_len`] to
/// recover it. Zero-payload control frames (the flush marker) never go
/// through the bias and simply carry `len == 0`.
#[derive(Debug, Clone, Copy)]
pub struct FramePrefix {
    pub tag: u8,
    pub len: u32,
}

pub const FRAME_PREFIX_LEN: usize = 4;
pub const MAX_FRAME_LEN: u32 = 1 << 24;

impl FramePrefix {
    /// Build a prefix for a payload of `payload_len` logical bytes (`>= 1`).
    pub fn payload(tag: u8, payload_len: u32) -> Result<Self, ContainerError> {
        if payload_len == 0 || payload_len > MAX_FRAME_LEN {
            return Err(ContainerError::UnexpectedControlTag(tag));
        }
        Ok(Self {
            tag,
            len: payload_len - 1,
        })
    }

    pub fn control(tag: u8) -> Self {
        Self { tag, len: 0 }
    }

    /// Recover the logical payload length a [`FramePrefix::payload`] prefix
    /// was built from.
    pub fn payload_len(&self) -> usize {
        self.len as usize + 1
    }

    pub fn to_bytes(self) -> [u8; FRAME_PREFIX_LEN] {
        let mut buf = [0u8; FRAME_PREFIX_LEN];
        buf[0] = self.tag;
        let len_bytes = self.len.to_le_bytes();
        buf[1..4].copy_from_slice(&len_bytes[..3]);
        buf
    }

    pub fn from_bytes(buf: &[u8; FRAME_PREFIX_LEN]) -> Self {
        let tag = buf[0];
        let mut len_bytes = [0u8; 4];
        len_bytes[..3].copy_from_slice(&buf[1..4]);
        let len = u32::from_le_bytes(len_bytes);
        Self { tag, len }
    }

    pub fn is_stored(&self) -> bool {
        self.tag == TAG_STORED
    }

    pub fn is_payload(&self) -> bool {
        self.tag == TAG_STORED || (1..=15).contains(&self.tag)
    }
}
