//! Error taxonomy for Blazer: one enum per layer, unified at the top.
//!
//! Mirrors the teacher's split of `CodecError` / `SuperblockError` /
//! `CryptoError`, each carrying its own `Io(#[from] io::Error)` variant so a
//! `?` inside any layer converts directly without an intermediate map.

use std::io;
use thiserror::Error;

/// Errors raised by the Block codec (the LZ token stream itself).
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("decoded output would overflow the destination buffer (need {need}, have {have})")]
    OutputOverflow { need: usize, have: usize },

    #[error("truncated command: expected {expected} more bytes, input exhausted")]
    TruncatedCommand { expected: usize },

    #[error("back-reference source position underflows (idxOut={idx_out}, requested back={back})")]
    ImpossibleBackReference { idx_out: usize, back: usize },

    #[error("block payload exceeds configured MaxBlockSize ({len} > {max})")]
    BlockTooLarge { len: usize, max: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the container framing layer (header/frame/trailer parsing).
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("invalid magic number — not a Blazer container")]
    InvalidMagic,

    #[error("container version {0} is newer than this build supports (max {1})")]
    VersionTooNew(u8, u8),

    #[error("container version {0} is older than this build supports (min {1})")]
    VersionTooOld(u8, u8),

    #[error("flags contain unknown/reserved bits: {0:#010x}")]
    UnknownFlags(u32),

    #[error("algorithm id {0} is not recognised (reserved or unassigned)")]
    UnknownAlgorithm(u8),

    #[error("block size exponent {0} is out of range (0..=15)")]
    InvalidBlockSizeExponent(u8),

    #[error("CRC32C mismatch on frame payload: expected {expected:#010x}, got {actual:#010x}")]
    Crc32Mismatch { expected: u32, actual: u32 },

    #[error("trailer is missing or malformed")]
    BadTrailer,

    #[error("unexpected control frame tag {0:#04x} in this context")]
    UnexpectedControlTag(u8),

    #[error("encrypt-full and encrypt-inner cannot both be set on one codec instance")]
    ConflictingEncryptionModes,

    #[error("file-info record must appear exactly once, immediately after the header")]
    MisplacedFileInfo,

    #[error("caller-supplied output buffer ({have} bytes) is smaller than MaxBlockSize ({need} bytes)")]
    OutputBufferTooSmall { need: usize, have: usize },

    #[error("block codec error: {0}")]
    Block(#[from] BlockError),

    #[error("encryption error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the encryption sub-layer.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("a password is required to read this container but none was provided")]
    PasswordRequired,

    #[error("a password was provided but this container is not encrypted")]
    UnexpectedPassword,

    #[error("invalid password")]
    InvalidPassword,

    #[error("block counter mismatch — stream is reordered or damaged (expected {expected}, got {actual})")]
    CounterMismatch { expected: u64, actual: u64 },

    #[error("encrypted payload too short to contain the block counter")]
    PayloadTooShort,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("cipher error: {0}")]
    Cipher(String),
}

/// Top-level error returned by the public `compress`/`decompress` API.
#[derive(Error, Debug)]
pub enum BlazerError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Usage(String),
}
