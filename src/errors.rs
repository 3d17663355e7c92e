//! Error types for bit-level reading and writing.

use std::io;

use thiserror::Error;

/// A bit width outside of `1..=8` was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid bit width {0}, expected 1..=8")]
pub struct InvalidBitWidth(pub i64);

/// Errors produced by [crate::bit_reader::BitReader].
#[derive(Debug, Error)]
pub enum ReadError {
    /// Bit width outside of `1..=8`.
    #[error(transparent)]
    InvalidBitWidth(#[from] InvalidBitWidth),
    /// The source ended before a fixed-size read could be satisfied.
    #[error("end of data while reading {what}: got {read} of {expected}")]
    EndOfData {
        what: &'static str,
        read: usize,
        expected: usize,
    },
    /// A hard array limit was breached during an until-end read.
    #[error("array size exceeded: read {read} items, limit is {limit}")]
    ArraySizeExceeded { limit: i64, read: usize },
    /// The first byte of a string is not a known length prefix.
    #[error("wrong string prefix 0x{0:02X}")]
    WrongStringPrefix(u8),
    /// String payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    MalformedUtf8,
    /// `reset` was called without a preceding `mark`.
    #[error("reset without mark")]
    ResetWithoutMark,
    /// More bytes than the mark limit were consumed since `mark`.
    #[error("mark invalidated, more than {limit} bytes read since mark")]
    MarkInvalidated { limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ReadError {
    pub(crate) fn eof(what: &'static str, read: usize, expected: usize) -> Self {
        ReadError::EndOfData {
            what,
            read,
            expected,
        }
    }

    /// True for [ReadError::EndOfData] and for io errors of kind `UnexpectedEof`.
    pub fn is_end_of_data(&self) -> bool {
        match self {
            ReadError::EndOfData { .. } => true,
            ReadError::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

impl From<ReadError> for io::Error {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::Io(err) => err,
            ReadError::EndOfData { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, value),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Errors produced by [crate::bit_writer::BitWriter].
#[derive(Debug, Error)]
pub enum WriteError {
    /// Bit width outside of `1..=8`.
    #[error(transparent)]
    InvalidBitWidth(#[from] InvalidBitWidth),
    /// UTF-8 payload longer than a 32-bit length prefix can describe.
    #[error("string of {0} bytes does not fit a 32-bit length prefix")]
    StringTooLong(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<WriteError> for io::Error {
    fn from(value: WriteError) -> Self {
        match value {
            WriteError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
