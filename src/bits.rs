//! Low-level bit manipulation helpers shared by the reader and the writer.

/// Mirrors all 8 bits of `byte` (bit 0 becomes bit 7).
#[inline]
pub fn mirror_byte(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// Reverses the low `n` bits of `x` (LSB becomes MSB of the result). Bits above `n` are dropped.
pub fn reverse_bits_n(x: u8, n: u8) -> u8 {
    match n {
        0 => 0,
        n if n >= 8 => x.reverse_bits(),
        n => x.reverse_bits() >> (8 - n),
    }
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub fn bytes_for_bits(bits: u64) -> u64 {
    bits.div_ceil(8)
}
