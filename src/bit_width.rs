//! Width of a bit field transferred in a single [crate::bit_reader::BitReader::read_bits] or
//! [crate::bit_writer::BitWriter::write_bits] call.

use crate::errors::InvalidBitWidth;

/// Number of bits in `1..=8`, with the matching value mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitWidth(u8);

impl BitWidth {
    pub const BITS_1: BitWidth = BitWidth(1);
    pub const BITS_2: BitWidth = BitWidth(2);
    pub const BITS_3: BitWidth = BitWidth(3);
    pub const BITS_4: BitWidth = BitWidth(4);
    pub const BITS_5: BitWidth = BitWidth(5);
    pub const BITS_6: BitWidth = BitWidth(6);
    pub const BITS_7: BitWidth = BitWidth(7);
    pub const BITS_8: BitWidth = BitWidth(8);

    /// Creates a width, failing for 0 and anything above 8.
    pub const fn new(bits: u8) -> Result<Self, InvalidBitWidth> {
        if bits == 0 || bits > 8 {
            return Err(InvalidBitWidth(bits as i64));
        }

        Ok(BitWidth(bits))
    }

    /// Number of bits.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `(1 << bits) - 1`.
    pub const fn mask(self) -> u8 {
        ((1u16 << self.0) - 1) as u8
    }
}

impl TryFrom<u8> for BitWidth {
    type Error = InvalidBitWidth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        BitWidth::new(value)
    }
}

impl TryFrom<i32> for BitWidth {
    type Error = InvalidBitWidth;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| InvalidBitWidth(value as i64))
            .and_then(BitWidth::new)
    }
}

impl From<BitWidth> for u8 {
    fn from(value: BitWidth) -> Self {
        value.0
    }
}
