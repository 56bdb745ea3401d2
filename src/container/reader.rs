//! The decompression stream: pulls frames off a generic byte source one at
//! a time and hands back decoded bytes.
//!
//! The trailer's 4 bytes are checked byte-exact wherever they're found in
//! the ordinary pull loop (`next_frame`'s `TAG_TRAILER` arm), so even a
//! non-seekable source (a pipe, stdin) gets full trailer validation without
//! needing to seek. `validate_trailer_seek` below is an optional, redundant
//! pre-flight check for sources that do support `Seek` — callers who want to
//! fail fast before decoding a single frame can use it, but nothing in this
//! module depends on it.

use std::io::{self, Read};

use crate::codec::{BlockCodec, Codec};
use crate::crypto::{self, BlockCipher, FullStreamCipher};
use crate::error::{ContainerError, CryptoError};
use crate::flags::{Flags, ALGORITHM_BLOCK};

use super::{
    file_info::FileInfo, FramePrefix, Header, FRAME_PREFIX_LEN, HEADER_LEN, TAG_CONTROL,
    TAG_FILE_INFO, TAG_FLUSH, TAG_STORED, TAG_TRAILER, TRAILER,
};

/// A single decoded frame's classification, returned by the internal pull loop.
enum Frame {
    Data(Vec<u8>),
    FlushMarker,
    Control(Vec<u8>),
    EndOfStream,
}

pub struct DecompressionStream<R: Read> {
    reader: R,
    flags: Flags,
    max_block_size: usize,
    codec: BlockCodec,
    cipher: BlockCipher,
    file_info: Option<FileInfo>,
    control_frames: Vec<Vec<u8>>,
    finished: bool,
}

impl<R: Read> DecompressionStream<R> {
    /// Construct a reader over a container that carries its own 8-byte
    /// header (the common case).
    pub fn new(mut reader: R, password: Option<&[u8]>) -> Result<Self, ContainerError> {
        let mut hdr = [0u8; HEADER_LEN];
        reader.read_exact(&mut hdr)?;
        let header = Header::from_bytes(&hdr)?;
        Self::from_flags(reader, header.flags, password)
    }

    /// Construct a reader for a headerless container whose flags are known
    /// out of band (the embedding format already recorded them elsewhere).
    pub fn new_headerless(reader: R, flags: Flags, password: Option<&[u8]>) -> Result<Self, ContainerError> {
        Self::from_flags(reader, flags, password)
    }

    fn from_flags(mut reader: R, flags: Flags, password: Option<&[u8]>) -> Result<Self, ContainerError> {
        if flags.encrypt_full() {
            return Err(ContainerError::ConflictingEncryptionModes);
        }

        let cipher = if flags.encrypt_inner() {
            let mut eh = [0u8; crypto::ENCRYPTION_HEADER_LEN];
            reader.read_exact(&mut eh)?;
            let password = password.ok_or(CryptoError::PasswordRequired)?;
            let (key, use_counter) = crypto::verify_encryption_header(&eh, password)?;
            BlockCipher::new_aes(key, use_counter)
        } else {
            if password.is_some() {
                return Err(CryptoError::UnexpectedPassword.into());
            }
            BlockCipher::none()
        };

        let mut stream = Self {
            reader,
            max_block_size: flags.max_block_size(),
            flags,
            codec: BlockCodec::new(),
            cipher,
            file_info: None,
            control_frames: Vec::new(),
            finished: false,
        };

        if stream.flags.has_file_info() {
            let mut buf = [0u8; FRAME_PREFIX_LEN];
            stream.reader.read_exact(&mut buf)?;
            let prefix = FramePrefix::from_bytes(&buf);
            if prefix.tag != TAG_FILE_INFO {
                return Err(ContainerError::MisplacedFileInfo);
            }
            let bytes = stream.read_payload(&prefix, false)?;
            let info = FileInfo::from_bytes(&bytes).map_err(|_| ContainerError::MisplacedFileInfo)?;
            stream.file_info = Some(info);
        }

        Ok(stream)
    }

    /// The maximum number of bytes any single block can decode to.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// The file-info record, if any, observed so far. Populated once the
    /// pull loop has passed the frame carrying it (always before the first
    /// data block).
    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    /// Out-of-band control payloads (frame tag `0xF1`) observed so far, in
    /// stream order. There is no dedicated callback type at this layer —
    /// the caller's control-data collaborator reads this after each pull.
    pub fn control_frames(&self) -> &[Vec<u8>] {
        &self.control_frames
    }

    fn read_prefix(&mut self) -> Result<Option<FramePrefix>, ContainerError> {
        let mut buf = [0u8; FRAME_PREFIX_LEN];
        match read_exact_or_eof(&mut self.reader, &mut buf)? {
            false => Ok(None),
            // `TRAILER` is itself a valid frame-prefix bit pattern (tag
            // 0xFF, a reserved tag no payload frame ever uses), so it falls
            // out of the ordinary parse with no special-casing needed here —
            // `next_frame` re-derives the original 4 bytes via
            // `FramePrefix::to_bytes` and compares them against `TRAILER` in
            // full before accepting end-of-stream.
            true => Ok(Some(FramePrefix::from_bytes(&buf))),
        }
    }

    fn next_frame(&mut self) -> Result<Frame, ContainerError> {
        loop {
            let prefix = match self.read_prefix()? {
                Some(p) => p,
                None => return Ok(Frame::EndOfStream),
            };

            match prefix.tag {
                TAG_TRAILER => {
                    if prefix.to_bytes() == TRAILER {
                        return Ok(Frame::EndOfStream);
                    }
                    return Err(ContainerError::BadTrailer);
                }
                TAG_FLUSH => return Ok(Frame::FlushMarker),
                TAG_CONTROL => {
                    let payload = self.read_payload(&prefix, false)?;
                    self.control_frames.push(payload.clone());
                    return Ok(Frame::Control(payload));
                }
                TAG_FILE_INFO => return Err(ContainerError::MisplacedFileInfo),
                TAG_STORED => {
                    let logical = self.read_payload(&prefix, true)?;
                    self.codec.observe_stored(&logical);
                    return Ok(Frame::Data(logical));
                }
                id if id == ALGORITHM_BLOCK => {
                    let logical = self.read_payload(&prefix, true)?;
                    let mut out = vec![0u8; self.max_block_size];
                    let n = self.codec.decode_block(&logical, &mut out)?;
                    out.truncate(n);
                    return Ok(Frame::Data(out));
                }
                other @ 1..=15 => return Err(ContainerError::UnknownAlgorithm(other)),
                other => return Err(ContainerError::UnexpectedControlTag(other)),
            }
        }
    }

    fn read_payload(&mut self, prefix: &FramePrefix, encryptable: bool) -> Result<Vec<u8>, ContainerError> {
        let logical_len = prefix.payload_len();
        let physical_len = if encryptable && self.flags.encrypt_inner() {
            crypto::adjust(logical_len)
        } else {
            logical_len
        };

        let mut crc = None;
        if self.flags.has_crc() {
            let mut crc_buf = [0u8; 4];
            self.reader.read_exact(&mut crc_buf)?;
            crc = Some(u32::from_le_bytes(crc_buf));
        }

        let mut physical = vec![0u8; physical_len];
        self.reader.read_exact(&mut physical)?;

        if let Some(expected) = crc {
            let actual = crate::crc32c::checksum(&physical);
            if actual != expected {
                return Err(ContainerError::Crc32Mismatch { expected, actual });
            }
        }

        if encryptable && self.flags.encrypt_inner() {
            Ok(self.cipher.decrypt(&physical, logical_len)?)
        } else {
            Ok(physical)
        }
    }

    /// Decode the next block's worth of data into `out`, returning the
    /// number of bytes written (0 at end of stream). File-info and flush
    /// marker frames are consumed transparently.
    pub fn read_block(&mut self, out: &mut [u8]) -> Result<usize, ContainerError> {
        if self.finished {
            return Ok(0);
        }
        loop {
            match self.next_frame()? {
                Frame::Data(bytes) => {
                    if bytes.len() > out.len() {
                        return Err(ContainerError::OutputBufferTooSmall {
                            need: bytes.len(),
                            have: out.len(),
                        });
                    }
                    out[..bytes.len()].copy_from_slice(&bytes);
                    return Ok(bytes.len());
                }
                Frame::FlushMarker | Frame::Control(_) => continue,
                Frame::EndOfStream => {
                    self.finished = true;
                    return Ok(0);
                }
            }
        }
    }

    /// Convenience: decode the entire remaining stream into one `Vec<u8>`.
    pub fn decompress_all(&mut self) -> Result<Vec<u8>, ContainerError> {
        let mut result = Vec::new();
        let mut buf = vec![0u8; self.max_block_size];
        loop {
            let n = self.read_block(&mut buf)?;
            if n == 0 {
                break;
            }
            result.extend_from_slice(&buf[..n]);
        }
        Ok(result)
    }
}

impl<R: Read + io::Seek> DecompressionStream<R> {
    /// Validate that the container ends with the trailer sentinel by
    /// seeking to the last 4 bytes, without disturbing the read cursor used
    /// by the pull loop for anything before it.
    pub fn validate_trailer_seek(&mut self) -> Result<bool, ContainerError> {
        let end = self.reader.seek(io::SeekFrom::End(0))?;
        if end < 4 {
            return Ok(false);
        }
        self.reader.seek(io::SeekFrom::End(-4))?;
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(buf == TRAILER)
    }
}

/// Like `read_exact`, but returns `Ok(false)` instead of erroring when the
/// source is exhausted before a single byte is read (clean EOF at a frame
/// boundary), and still errors on a truncated read.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated frame prefix"));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Decrypt an encrypt-full container (salt(8) + ciphertext to EOF) fully
/// into memory and return a reader positioned at the start of the inner
/// container, per the whole-stream nature of this mode.
pub fn open_encrypt_full<R: Read>(
    mut reader: R,
    password: &[u8],
) -> Result<DecompressionStream<io::Cursor<Vec<u8>>>, ContainerError> {
    let mut salt = [0u8; 8];
    reader.read_exact(&mut salt)?;
    let mut ciphertext = Vec::new();
    reader.read_to_end(&mut ciphertext)?;

    let cipher = FullStreamCipher::from_salt(password, salt);
    let plaintext = cipher.decrypt_all(&ciphertext)?;

    let mut cursor = io::Cursor::new(plaintext);
    let mut hdr = [0u8; HEADER_LEN];
    cursor.read_exact(&mut hdr)?;
    let header = Header::from_bytes(&hdr)?;
    DecompressionStream::from_flags(cursor, header.flags, None)
}
