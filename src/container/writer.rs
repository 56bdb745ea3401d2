//! The compression stream: a generic sink wrapper that turns a sequence of
//! `write()` calls into a framed, optionally encrypted Blazer container.
//!
//! Header emission is deferred to the first byte actually written (or to
//! `close()` for an all-empty stream), matching the "reserve, backfill"
//! discipline the rest of the framing layer follows: nothing is written
//! before there is a reason to write it.

use std::io::{self, Write};

use crate::codec::{BlockCodec, Codec};
use crate::crypto::{BlockCipher, FullStreamCipher};
use crate::error::ContainerError;
use crate::flags::Flags;

use super::{file_info::FileInfo, FramePrefix, Header, TAG_CONTROL, TAG_FILE_INFO, TAG_STORED, TRAILER};

enum Sink<W: Write> {
    Direct(W),
    Buffered(W, Vec<u8>),
}

/// Sequential byte sink for a single Blazer container.
///
/// Generic over `W: Write`; short writes are handled the same way
/// `std::io::Write::write_all` handles them internally, so no caller-visible
/// looping is required.
pub struct CompressionStream<W: Write> {
    sink: Sink<W>,
    flags: Flags,
    max_block_size: usize,
    codec: BlockCodec,
    cipher: BlockCipher,
    full_cipher: Option<FullStreamCipher>,
    pending: Vec<u8>,
    header_written: bool,
    file_info: Option<FileInfo>,
    encryption_header: Option<[u8; crate::crypto::ENCRYPTION_HEADER_LEN]>,
    closed: bool,
}

impl<W: Write> CompressionStream<W> {
    pub fn new(writer: W, flags: Flags, password: Option<&[u8]>) -> Result<Self, ContainerError> {
        Self::with_file_info(writer, flags, password, None)
    }

    pub fn with_file_info(
        writer: W,
        flags: Flags,
        password: Option<&[u8]>,
        file_info: Option<FileInfo>,
    ) -> Result<Self, ContainerError> {
        if flags.encrypt_inner() && flags.encrypt_full() {
            return Err(ContainerError::ConflictingEncryptionModes);
        }
        if flags.has_file_info() != file_info.is_some() {
            return Err(ContainerError::MisplacedFileInfo);
        }

        let mut encryption_header = None;
        let cipher = if flags.encrypt_inner() {
            let password = password.ok_or(ContainerError::Crypto(
                crate::error::CryptoError::PasswordRequired,
            ))?;
            let (header, key) = crate::crypto::new_encryption_header(password);
            encryption_header = Some(header);
            BlockCipher::new_aes(key, true)
        } else {
            BlockCipher::none()
        };

        let full_cipher = if flags.encrypt_full() {
            let password = password.ok_or(ContainerError::Crypto(
                crate::error::CryptoError::PasswordRequired,
            ))?;
            Some(FullStreamCipher::new(password))
        } else {
            None
        };

        let sink = if flags.encrypt_full() {
            Sink::Buffered(writer, Vec::new())
        } else {
            Sink::Direct(writer)
        };

        Ok(Self {
            sink,
            max_block_size: flags.max_block_size(),
            flags,
            codec: BlockCodec::new(),
            cipher,
            full_cipher,
            pending: Vec::new(),
            header_written: false,
            file_info,
            encryption_header,
            closed: false,
        })
    }

    fn raw_write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.sink {
            Sink::Direct(w) => w.write_all(bytes),
            Sink::Buffered(_, buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    fn ensure_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;

        if self.flags.has_header() {
            self.raw_write(&Header { flags: self.flags }.to_bytes())?;
        }
        if let Some(header) = self.encryption_header.take() {
            self.raw_write(&header)?;
        }
        if let Some(info) = self.file_info.take() {
            self.write_frame(TAG_FILE_INFO, &info.to_bytes())?;
        }
        Ok(())
    }

    fn write_frame(&mut self, tag: u8, logical_payload: &[u8]) -> io::Result<()> {
        let prefix = FramePrefix::payload(tag, logical_payload.len() as u32)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;

        // File-info and out-of-band control frames are metadata, not stream
        // content, and stay in the clear even when encrypt-inner is on —
        // matching the reader's `read_payload(&prefix, encryptable: false)`
        // treatment of the same two tags.
        let on_wire: std::borrow::Cow<[u8]> = if tag == TAG_FILE_INFO || tag == TAG_CONTROL {
            std::borrow::Cow::Borrowed(logical_payload)
        } else {
            std::borrow::Cow::Owned(self.cipher.encrypt(logical_payload))
        };

        self.raw_write(&prefix.to_bytes())?;
        if self.flags.has_crc() {
            let crc = crate::crc32c::checksum(&on_wire);
            self.raw_write(&crc.to_le_bytes())?;
        }
        self.raw_write(&on_wire)?;
        Ok(())
    }

    fn flush_block(&mut self, take: usize) -> io::Result<()> {
        self.ensure_header()?;
        let chunk = self.pending.drain(..take).collect::<Vec<u8>>();
        if chunk.is_empty() {
            return Ok(());
        }
        let mut token_stream = Vec::new();
        let compressed = self
            .codec
            .encode_block(&chunk, &mut token_stream)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if compressed {
            let algo_id = self.codec.algorithm_id();
            self.write_frame(algo_id, &token_stream)
        } else {
            self.write_frame(TAG_STORED, &chunk)
        }
    }

    /// Append bytes to the stream, flushing full blocks as they accumulate.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(data);
        while self.pending.len() >= self.max_block_size {
            self.flush_block(self.max_block_size)?;
        }
        Ok(())
    }

    /// Force whatever has been buffered so far to end the current block
    /// early. Always produces an observable block boundary: if nothing is
    /// pending, an explicit zero-length flush marker frame is emitted
    /// instead so the boundary is still visible to the reader.
    pub fn flush(&mut self) -> io::Result<()> {
        self.ensure_header()?;
        if self.pending.is_empty() {
            if self.flags.respect_flush() {
                self.raw_write(&FramePrefix::control(super::TAG_FLUSH).to_bytes())?;
            }
            return Ok(());
        }
        let remaining = self.pending.len();
        self.flush_block(remaining)
    }

    /// Emit an out-of-band control payload (frame tag `0xF1`), passed
    /// through to the reader's control callback rather than decoded as
    /// block data. Subject to the same CRC treatment as a stored block,
    /// but never encrypted — like file-info, control data is metadata
    /// outside the encrypted content stream, so it costs no counter slot
    /// even when encrypt-inner is on. Any data buffered by a prior
    /// `write()` is flushed as its own block first, so the control frame
    /// lands on the wire at the point it was called rather than after
    /// whatever is accumulating in the current block.
    pub fn write_control(&mut self, data: &[u8]) -> io::Result<()> {
        self.ensure_header()?;
        if !self.pending.is_empty() {
            let remaining = self.pending.len();
            self.flush_block(remaining)?;
        }
        self.write_frame(TAG_CONTROL, data)
    }

    /// Finish the stream: flush any pending data and write the trailer (if
    /// enabled), then for encrypt-full containers, encrypt the whole
    /// buffered byte sequence and write it to the underlying sink. A
    /// container with trailer disabled ends with no explicit marker at
    /// all — the reader recognises end of stream by EOF.
    pub fn close(mut self) -> io::Result<W> {
        if !self.closed {
            self.closed = true;
            self.ensure_header()?;
            if !self.pending.is_empty() {
                let remaining = self.pending.len();
                self.flush_block(remaining)?;
            }
            if self.flags.has_trailer() {
                self.raw_write(&TRAILER)?;
            }
        }

        match self.sink {
            Sink::Direct(w) => Ok(w),
            Sink::Buffered(mut w, buf) => {
                let cipher = self
                    .full_cipher
                    .as_ref()
                    .expect("encrypt_full implies full_cipher is set");
                let ciphertext = cipher.encrypt_all(&buf);
                w.write_all(&cipher.salt())?;
                w.write_all(&ciphertext)?;
                Ok(w)
            }
        }
    }
}
