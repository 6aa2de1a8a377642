//! Errors produced while encoding or decoding the wire format

use thiserror::Error;

/// Error type for serialization and deserialization
#[derive(Error, Debug)]
pub enum Error {
    /// The buffer does not start with [`MAGIC_NUMBER`](crate::MAGIC_NUMBER)
    #[error("invalid magic number: {0}")]
    InvalidMagic(u16),
    #[error("unsupported storage version: {0}")]
    UnsupportedVersion(u8),
    /// A header, offset or payload extends past the end of the buffer
    #[error("truncated data: need {needed} bytes, buffer holds {len}")]
    Truncated { needed: usize, len: usize },
    #[error("container keys out of order: {key} follows {previous}")]
    UnsortedKeys { previous: u64, key: u64 },
    #[error("corrupt container {key}: {reason}")]
    Corrupt { key: u64, reason: &'static str },
    /// The bitmap cannot be represented with 32-bit key counts and offsets
    #[error("bitmap too large to serialize: {0} bytes")]
    TooLarge(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
