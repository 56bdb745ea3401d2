//! Blazer: a single-stream compression container with optional per-block or
//! whole-stream authenticated encryption.
//!
//! The library is organized the way the wire format itself is layered:
//! [`codec`] implements the Block LZ codec, [`crypto`] the encryption
//! sub-layer, and [`container`] the framing that ties a sequence of blocks
//! into one self-describing byte stream. [`flags`] and [`error`] are shared
//! by all three.

pub mod codec;
pub mod container;
pub mod crc32c;
pub mod crypto;
pub mod error;
pub mod flags;

pub use container::file_info::FileInfo;
pub use container::{CompressionStream, DecompressionStream};
pub use error::BlazerError;
pub use flags::Flags;

use std::io::{Read, Write};

/// Default flags: 64KiB blocks, CRC, header and trailer on, nothing else.
pub fn default_flags() -> Flags {
    let mut flags = Flags::new(7, flags::ALGORITHM_BLOCK).expect("exponent 7 and algorithm 1 are valid");
    flags.set_crc(true);
    flags.set_header(true);
    flags.set_trailer(true);
    flags
}

/// Compress `input` into a single in-memory Blazer container using
/// [`default_flags`].
pub fn compress(input: &[u8]) -> Result<Vec<u8>, BlazerError> {
    compress_with_flags(input, default_flags(), None)
}

/// Compress `input` with caller-chosen flags and an optional password
/// (required when `flags.encrypt_inner()` or `flags.encrypt_full()`).
pub fn compress_with_flags(
    input: &[u8],
    flags: Flags,
    password: Option<&[u8]>,
) -> Result<Vec<u8>, BlazerError> {
    let mut stream = CompressionStream::new(Vec::new(), flags, password)?;
    stream.write(input)?;
    let out = stream.close()?;
    Ok(out)
}

/// Decompress a complete Blazer container held in memory.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, BlazerError> {
    decompress_with_password(input, None)
}

/// Decompress a complete Blazer container, supplying a password if it is
/// encrypted.
pub fn decompress_with_password(input: &[u8], password: Option<&[u8]>) -> Result<Vec<u8>, BlazerError> {
    let mut stream = DecompressionStream::new(input, password)?;
    Ok(stream.decompress_all()?)
}

/// Stream-copy `input` through compression into `output`, for callers who
/// already hold a generic reader/writer pair rather than an in-memory buffer.
pub fn compress_stream<R: Read, W: Write>(
    mut input: R,
    output: W,
    flags: Flags,
    password: Option<&[u8]>,
) -> Result<W, BlazerError> {
    let mut stream = CompressionStream::new(output, flags, password)?;
    let mut buf = vec![0u8; flags.max_block_size()];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        stream.write(&buf[..n])?;
    }
    Ok(stream.close()?)
}

/// Stream-copy a Blazer container from `input` into `output`.
///
/// `input` must carry its own plaintext header — containers written with
/// `encrypt-full` do not, since the header itself is inside the outer
/// cipher's envelope; decompress those with [`decompress_stream_encrypt_full`]
/// instead, chosen out of band the same way compression chose it.
pub fn decompress_stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    password: Option<&[u8]>,
) -> Result<(), BlazerError> {
    let mut stream = DecompressionStream::new(input, password)?;
    let mut buf = vec![0u8; stream.max_block_size()];
    loop {
        let n = stream.read_block(&mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n])?;
    }
    Ok(())
}

/// Stream-copy an `encrypt-full` Blazer container from `input` into `output`.
///
/// The outer salt + stream cipher wraps the entire container including its
/// header, so there is nothing self-describing to dispatch on until the
/// whole thing is decrypted; the caller must already know the container was
/// written with `encrypt-full` (the same way the CLI's `--encryptfull` flag
/// must be passed again on decompress).
pub fn decompress_stream_encrypt_full<R: Read, W: Write>(
    input: R,
    mut output: W,
    password: &[u8],
) -> Result<(), BlazerError> {
    let mut stream = container::reader::open_encrypt_full(input, password)?;
    let mut buf = vec![0u8; stream.max_block_size()];
    loop {
        let n = stream.read_block(&mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n])?;
    }
    Ok(())
}
