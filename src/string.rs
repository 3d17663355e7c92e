//! Length prefix of the variable-length string wire format.
//!
//! A string is written as a prefix followed by its UTF-8 payload:
//!
//! | string                  | prefix                                   |
//! |-------------------------|------------------------------------------|
//! | absent                  | `0xFF`                                   |
//! | empty                   | `0x00`                                   |
//! | `len < 0x80`            | `len`                                    |
//! | `len` fits in `n` bytes | `0x80 + n`, then `n` length bytes        |
//!
//! where `n` is 1..=4 and multi-byte lengths follow the caller's [ByteOrder].

use crate::{
    errors::{ReadError, WriteError},
    order::ByteOrder,
};

pub const NULL_PREFIX: u8 = 0xFF;
pub const EMPTY_PREFIX: u8 = 0x00;
const EXTENDED_MARK: u8 = 0x80;

/// Decoded form of the first byte of an encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPrefix {
    /// Absent string, no payload.
    Null,
    /// Empty string, no payload.
    Empty,
    /// Payload length in `1..0x80` carried by the prefix byte itself.
    Inline(u8),
    /// Payload length follows in this many bytes (1..=4).
    Extended(u8),
}

impl StringPrefix {
    /// Picks the shortest prefix for a payload of `len` bytes, `None` being an absent string.
    pub fn for_len(len: Option<usize>) -> Result<Self, WriteError> {
        let Some(len) = len else {
            return Ok(StringPrefix::Null);
        };

        Ok(match len {
            0 => StringPrefix::Empty,
            1..0x80 => StringPrefix::Inline(len as u8),
            0x80..=0xFF => StringPrefix::Extended(1),
            0x100..=0xFFFF => StringPrefix::Extended(2),
            0x1_0000..=0xFF_FFFF => StringPrefix::Extended(3),
            _ if u32::try_from(len).is_ok() => StringPrefix::Extended(4),
            _ => return Err(WriteError::StringTooLong(len)),
        })
    }

    pub fn from_byte(byte: u8) -> Result<Self, ReadError> {
        match byte {
            NULL_PREFIX => Ok(StringPrefix::Null),
            EMPTY_PREFIX => Ok(StringPrefix::Empty),
            1..0x80 => Ok(StringPrefix::Inline(byte)),
            0x81..=0x84 => Ok(StringPrefix::Extended(byte - EXTENDED_MARK)),
            _ => Err(ReadError::WrongStringPrefix(byte)),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            StringPrefix::Null => NULL_PREFIX,
            StringPrefix::Empty => EMPTY_PREFIX,
            StringPrefix::Inline(len) => len,
            StringPrefix::Extended(n) => EXTENDED_MARK + n,
        }
    }
}

/// Splits `len` into `n` bytes in wire order.
pub(crate) fn length_bytes(len: u32, n: u8, order: ByteOrder) -> Vec<u8> {
    let be = len.to_be_bytes();
    let mut bytes = be[4 - n as usize..].to_vec();
    if order == ByteOrder::LittleEndian {
        bytes.reverse();
    }

    bytes
}

/// Inverse of [length_bytes].
pub(crate) fn length_from_bytes(bytes: &[u8], order: ByteOrder) -> u32 {
    let fold = |acc: u32, byte: &u8| (acc << 8) | *byte as u32;
    match order {
        ByteOrder::BigEndian => bytes.iter().fold(0, fold),
        ByteOrder::LittleEndian => bytes.iter().rev().fold(0, fold),
    }
}
