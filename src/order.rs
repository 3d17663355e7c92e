//! Bit and byte ordering conventions.

use crate::bits::mirror_byte;

/// How bits of a field map onto bit positions of the bytes on the wire.
///
/// A stream is bound to one bit order for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BitOrder {
    /// First transferred bit is bit 0 of each byte. Bytes pass through unchanged.
    Lsb0,
    /// Like [BitOrder::Lsb0], but every byte is bit-mirrored when it crosses the
    /// stream boundary, so the physical byte `0b1000_0000` is observed as `0b0000_0001`.
    Msb0,
    /// First transferred bit is bit 7 of each byte and becomes the most significant
    /// bit of the field value. Bytes pass through unchanged.
    Msb0Direct,
}

impl Default for BitOrder {
    fn default() -> Self {
        BitOrder::Lsb0
    }
}

impl BitOrder {
    /// Transformation applied to every whole byte crossing the stream boundary.
    #[inline]
    pub(crate) fn wire_byte(self, byte: u8) -> u8 {
        match self {
            BitOrder::Msb0 => mirror_byte(byte),
            BitOrder::Lsb0 | BitOrder::Msb0Direct => byte,
        }
    }

    /// True when bits are consumed from the high end of the buffered byte.
    #[inline]
    pub(crate) fn is_direct(self) -> bool {
        matches!(self, BitOrder::Msb0Direct)
    }
}

/// Composition order of multi-byte values. Passed per call, never stored on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::BigEndian
    }
}
