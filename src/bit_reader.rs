//! Stateful bit-level decoder over a byte source.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::{
    bit_width::BitWidth,
    bits::reverse_bits_n,
    config::StreamConfig,
    errors::ReadError,
    limiter::{ArrayCount, ArraySizeLimiter, LimitCheck, NoLimit, check_limit},
    order::{BitOrder, ByteOrder},
    source::MarkableSource,
    string::{StringPrefix, length_from_bytes},
};

/// Upper bound on the capacity reserved up front for a fixed-count array read.
const MAX_PREALLOCATED_ITEMS: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    bit_buffer: u8,
    bits_in_buffer: u8,
    counter: u64,
}

/// Reads bit fields, primitives, arrays and strings from a byte source.
///
/// Up to 8 bits of a partially consumed byte are kept in an internal bit buffer
/// between calls. [BitReader::counter] reports bytes whose every bit has been
/// handed out to the caller.
#[derive(Debug)]
pub struct BitReader<R> {
    source: MarkableSource<R>,
    bit_order: BitOrder,
    bit_buffer: u8,
    bits_in_buffer: u8,
    counter: u64,
    marked: Option<Snapshot>,
    detected_array_limit: bool,
    initial_array_capacity: usize,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R, bit_order: BitOrder) -> Self {
        Self::with_config(
            source,
            StreamConfig {
                bit_order,
                ..Default::default()
            },
        )
    }

    pub fn with_config(source: R, config: StreamConfig) -> Self {
        Self {
            source: MarkableSource::new(source),
            bit_order: config.bit_order,
            bit_buffer: 0,
            bits_in_buffer: 0,
            counter: 0,
            marked: None,
            detected_array_limit: false,
            initial_array_capacity: config.initial_array_capacity.max(1),
        }
    }

    /// Loads the next byte from the source with the bit order's byte transformation applied.
    fn load_byte(&mut self) -> io::Result<Option<u8>> {
        let order = self.bit_order;
        Ok(self.source.next_byte()?.map(|byte| order.wire_byte(byte)))
    }

    /// Reads `width` bits. Returns `None` if the source ended before a single bit was produced.
    ///
    /// If the source ends after some bits were produced, the bits gathered so far are returned.
    pub fn read_bits(&mut self, width: BitWidth) -> Result<Option<u8>, ReadError> {
        Ok(self.read_bits_counted(width)?.map(|(value, _)| value))
    }

    /// Like [BitReader::read_bits], also returning how many bits were actually produced.
    fn read_bits_counted(&mut self, width: BitWidth) -> Result<Option<(u8, u8)>, ReadError> {
        let n = width.get();

        if self.bits_in_buffer == 0 && n == 8 {
            let byte = self.load_byte()?;
            if byte.is_some() {
                self.counter += 1;
            }
            return Ok(byte.map(|byte| (byte, 8)));
        }

        let direct = self.bit_order.is_direct();

        if n == self.bits_in_buffer {
            let value = if direct {
                self.bit_buffer >> (8 - n)
            } else {
                self.bit_buffer & width.mask()
            };
            self.bit_buffer = 0;
            self.bits_in_buffer = 0;
            self.counter += 1;
            return Ok(Some((value, n)));
        }

        let had_pending = self.bits_in_buffer != 0;
        let mut buffer = self.bit_buffer;
        let mut available = self.bits_in_buffer;
        let mut result = 0u8;
        let mut remaining = n;

        while remaining > 0 {
            if available == 0 {
                if had_pending {
                    self.counter += 1;
                }
                match self.load_byte()? {
                    Some(byte) => {
                        buffer = byte;
                        available = 8;
                    }
                    None if remaining == n => {
                        self.bit_buffer = 0;
                        self.bits_in_buffer = 0;
                        return Ok(None);
                    }
                    None => break,
                }
            }

            let bit = if direct {
                let bit = buffer >> 7;
                buffer <<= 1;
                bit
            } else {
                let bit = buffer & 1;
                buffer >>= 1;
                bit
            };
            result = (result << 1) | bit;
            available -= 1;
            remaining -= 1;
        }

        self.bit_buffer = buffer;
        self.bits_in_buffer = available;

        let produced = n - remaining;
        let value = if direct {
            result
        } else {
            reverse_bits_n(result, produced)
        };

        Ok(Some((value, produced)))
    }

    /// Next whole byte, `None` if fewer than 8 bits are left.
    fn read_full_byte(&mut self) -> Result<Option<u8>, ReadError> {
        Ok(match self.read_bits_counted(BitWidth::BITS_8)? {
            Some((value, 8)) => Some(value),
            _ => None,
        })
    }

    fn read_exact_bytes<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> Result<[u8; N], ReadError> {
        let mut bytes = [0u8; N];
        for (read, slot) in bytes.iter_mut().enumerate() {
            *slot = self
                .read_full_byte()?
                .ok_or_else(|| ReadError::eof(what, read, N))?;
        }

        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_exact_bytes::<1>("u8")?[0])
    }

    /// Reads one byte, any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_exact_bytes::<1>("bool")?[0] != 0)
    }

    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16, ReadError> {
        let bytes = self.read_exact_bytes("u16")?;
        Ok(match order {
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
        })
    }

    pub fn read_i16(&mut self, order: ByteOrder) -> Result<i16, ReadError> {
        Ok(self.read_u16(order)? as i16)
    }

    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32, ReadError> {
        let bytes = self.read_exact_bytes("u32")?;
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        })
    }

    pub fn read_i32(&mut self, order: ByteOrder) -> Result<i32, ReadError> {
        Ok(self.read_u32(order)? as i32)
    }

    pub fn read_i64(&mut self, order: ByteOrder) -> Result<i64, ReadError> {
        let bytes = self.read_exact_bytes("i64")?;
        Ok(match order {
            ByteOrder::BigEndian => i64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => i64::from_le_bytes(bytes),
        })
    }

    pub fn read_f32(&mut self, order: ByteOrder) -> Result<f32, ReadError> {
        Ok(f32::from_bits(self.read_u32(order)?))
    }

    pub fn read_f64(&mut self, order: ByteOrder) -> Result<f64, ReadError> {
        Ok(f64::from_bits(self.read_i64(order)? as u64))
    }

    /// Reads a length-prefixed UTF-8 string, `None` for the absent-string prefix.
    pub fn read_string(&mut self, order: ByteOrder) -> Result<Option<String>, ReadError> {
        let prefix = self.read_exact_bytes::<1>("string prefix")?[0];
        let len = match StringPrefix::from_byte(prefix)? {
            StringPrefix::Null => return Ok(None),
            StringPrefix::Empty => return Ok(Some(String::new())),
            StringPrefix::Inline(len) => len as usize,
            StringPrefix::Extended(n) => {
                let n = n as usize;
                let mut bytes = [0u8; 4];
                for (read, slot) in bytes[..n].iter_mut().enumerate() {
                    *slot = self
                        .read_full_byte()?
                        .ok_or_else(|| ReadError::eof("string length", read, n))?;
                }
                length_from_bytes(&bytes[..n], order) as usize
            }
        };

        let payload = self.read_byte_array(ArrayCount::Fixed(len), ByteOrder::BigEndian, &NoLimit)?;
        String::from_utf8(payload)
            .map(Some)
            .map_err(|_| ReadError::MalformedUtf8)
    }

    /// True if at least one more bit can be read.
    ///
    /// With an empty bit buffer the next byte is pulled into it (8 buffered bits);
    /// the byte counter is not advanced until those bits are read.
    pub fn has_available_data(&mut self) -> Result<bool, ReadError> {
        if self.bits_in_buffer > 0 {
            return Ok(true);
        }

        match self.load_byte()? {
            Some(byte) => {
                self.bit_buffer = byte;
                self.bits_in_buffer = 8;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Shared driver for every array read. `read_item` returns `None` at the end of data.
    fn read_array<T, L, F>(
        &mut self,
        count: ArrayCount,
        limiter: &L,
        what: &'static str,
        mut read_item: F,
    ) -> Result<Vec<T>, ReadError>
    where
        L: ArraySizeLimiter + ?Sized,
        F: FnMut(&mut Self) -> Result<Option<T>, ReadError>,
    {
        match count {
            ArrayCount::Fixed(expected) => {
                let mut values = Vec::with_capacity(expected.min(MAX_PREALLOCATED_ITEMS));
                for read in 0..expected {
                    let value = read_item(self)?
                        .ok_or_else(|| ReadError::eof(what, read, expected))?;
                    values.push(value);
                }

                Ok(values)
            }
            ArrayCount::ToEnd => {
                self.detected_array_limit = false;
                let mut values = Vec::with_capacity(self.initial_array_capacity);
                while let Some(value) = read_item(self)? {
                    if values.len() == values.capacity() {
                        trace!(what, capacity = values.capacity(), "growing array buffer");
                        values.reserve_exact(values.capacity());
                    }
                    values.push(value);

                    if check_limit(limiter, values.len())? == LimitCheck::Stop {
                        debug!(what, read = values.len(), "array read stopped by limiter");
                        self.detected_array_limit = true;
                        break;
                    }
                }
                values.shrink_to_fit();
                trace!(what, read = values.len(), "until-end array read done");

                Ok(values)
            }
        }
    }

    /// Reads groups of `width` bits, one per element.
    pub fn read_bits_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        width: BitWidth,
        limiter: &L,
    ) -> Result<Vec<u8>, ReadError> {
        self.read_array(count, limiter, "bits array", |reader| reader.read_bits(width))
    }

    /// Reads bytes; for [ByteOrder::LittleEndian] the resulting array is reversed.
    pub fn read_byte_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<u8>, ReadError> {
        let mut bytes = self.read_array(count, limiter, "byte array", |reader| {
            reader.read_bits(BitWidth::BITS_8)
        })?;
        if order == ByteOrder::LittleEndian {
            bytes.reverse();
        }

        Ok(bytes)
    }

    pub fn read_bool_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        limiter: &L,
    ) -> Result<Vec<bool>, ReadError> {
        self.read_array(count, limiter, "bool array", |reader| {
            Ok(reader.read_bits(BitWidth::BITS_8)?.map(|byte| byte != 0))
        })
    }

    pub fn read_u16_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<u16>, ReadError> {
        self.read_array(count, limiter, "u16 array", |reader| {
            reader.read_if_available(|reader| reader.read_u16(order))
        })
    }

    pub fn read_i16_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<i16>, ReadError> {
        self.read_array(count, limiter, "i16 array", |reader| {
            reader.read_if_available(|reader| reader.read_i16(order))
        })
    }

    pub fn read_u32_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<u32>, ReadError> {
        self.read_array(count, limiter, "u32 array", |reader| {
            reader.read_if_available(|reader| reader.read_u32(order))
        })
    }

    pub fn read_i32_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<i32>, ReadError> {
        self.read_array(count, limiter, "i32 array", |reader| {
            reader.read_if_available(|reader| reader.read_i32(order))
        })
    }

    pub fn read_i64_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<i64>, ReadError> {
        self.read_array(count, limiter, "i64 array", |reader| {
            reader.read_if_available(|reader| reader.read_i64(order))
        })
    }

    pub fn read_f32_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<f32>, ReadError> {
        self.read_array(count, limiter, "f32 array", |reader| {
            reader.read_if_available(|reader| reader.read_f32(order))
        })
    }

    pub fn read_f64_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<f64>, ReadError> {
        self.read_array(count, limiter, "f64 array", |reader| {
            reader.read_if_available(|reader| reader.read_f64(order))
        })
    }

    pub fn read_string_array<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Vec<Option<String>>, ReadError> {
        self.read_array(count, limiter, "string array", |reader| {
            reader.read_if_available(|reader| reader.read_string(order))
        })
    }

    /// Runs `read` only if data is left, mapping an exhausted source to `None`.
    pub(crate) fn read_if_available<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ReadError>,
    ) -> Result<Option<T>, ReadError> {
        if self.has_available_data()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Fills `buf` with whole bytes, returning how many were read before the source ended.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        for (read, slot) in buf.iter_mut().enumerate() {
            match self.read_bits(BitWidth::BITS_8)? {
                Some(byte) => *slot = byte,
                None => return Ok(read),
            }
        }

        Ok(buf.len())
    }

    /// Discards up to `count` bytes, returning how many were skipped.
    pub fn skip(&mut self, count: u64) -> Result<u64, ReadError> {
        for skipped in 0..count {
            if self.read_bits(BitWidth::BITS_8)?.is_none() {
                return Ok(skipped);
            }
        }

        Ok(count)
    }

    /// Drops a partially consumed byte from the bit buffer, counting it as consumed.
    pub fn align_byte(&mut self) {
        if self.bits_in_buffer > 0 && self.bits_in_buffer < 8 {
            self.counter += 1;
            self.bit_buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Aligns to a byte, then skips bytes until the counter is a multiple of `alignment`.
    pub fn align(&mut self, alignment: u64) -> Result<(), ReadError> {
        self.align_byte();
        if alignment == 0 {
            return Ok(());
        }

        let padding = (alignment - self.counter % alignment) % alignment;
        if padding > 0 {
            debug!(alignment, padding, "skipping alignment padding");
        }
        for skipped in 0..padding {
            if self.read_bits(BitWidth::BITS_8)?.is_none() {
                return Err(ReadError::eof(
                    "alignment",
                    skipped as usize,
                    padding as usize,
                ));
            }
        }

        Ok(())
    }

    /// Marks the current position, including a partially consumed byte.
    /// At most `limit` further source bytes can be replayed by [BitReader::reset].
    pub fn mark(&mut self, limit: usize) {
        self.source.mark(limit);
        self.marked = Some(Snapshot {
            bit_buffer: self.bit_buffer,
            bits_in_buffer: self.bits_in_buffer,
            counter: self.counter,
        });
    }

    /// Returns to the last mark, restoring both the source position and the bit state.
    pub fn reset(&mut self) -> Result<(), ReadError> {
        let snapshot = self.marked.ok_or(ReadError::ResetWithoutMark)?;
        self.source.reset()?;
        self.bit_buffer = snapshot.bit_buffer;
        self.bits_in_buffer = snapshot.bits_in_buffer;
        self.counter = snapshot.counter;

        Ok(())
    }

    /// Number of bytes fully consumed.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Zeroes the counter and drops any buffered bits.
    pub fn reset_counter(&mut self) {
        self.bit_buffer = 0;
        self.bits_in_buffer = 0;
        self.counter = 0;
    }

    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Raw content of the bit buffer.
    pub fn bit_buffer(&self) -> u8 {
        self.bit_buffer
    }

    /// Number of valid bits in the bit buffer, 0..=8.
    pub fn buffered_bits(&self) -> u8 {
        self.bits_in_buffer
    }

    /// True if the last until-end array read was stopped by a soft limiter.
    pub fn detected_array_limit(&self) -> bool {
        self.detected_array_limit
    }

    pub fn set_detected_array_limit(&mut self, value: bool) {
        self.detected_array_limit = value;
    }

    /// Returns the source. Buffered bits and replay data are lost.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

impl<R: Read> Read for BitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn reader(data: &[u8], bit_order: BitOrder) -> BitReader<&[u8]> {
        BitReader::new(data, bit_order)
    }

    fn bits(n: u8) -> BitWidth {
        BitWidth::new(n).unwrap()
    }

    #[test]
    fn test_read_bits_lsb0() {
        let mut rd = reader(&[0b1010_0110], BitOrder::Lsb0);
        assert_eq!(rd.read_bits(bits(3)).unwrap(), Some(0b110));
        assert_eq!(rd.buffered_bits(), 5);
        assert_eq!(rd.counter(), 0);
        assert_eq!(rd.read_bits(bits(5)).unwrap(), Some(0b10100));
        assert_eq!(rd.counter(), 1);
        assert_eq!(rd.read_bits(bits(1)).unwrap(), None);
    }

    #[test]
    fn test_read_bits_across_bytes() {
        let mut rd = reader(&[0xF1, 0x0F], BitOrder::Lsb0);
        assert_eq!(rd.read_bits(bits(4)).unwrap(), Some(0x1));
        assert_eq!(rd.read_bits(bits(8)).unwrap(), Some(0xFF));
        assert_eq!(rd.counter(), 1);
        assert_eq!(rd.read_bits(bits(4)).unwrap(), Some(0x0));
        assert_eq!(rd.counter(), 2);
    }

    #[test]
    fn test_msb0_mirrors_bytes() {
        let mut rd = reader(&[0x80], BitOrder::Msb0);
        assert_eq!(rd.read_bits(bits(8)).unwrap(), Some(0x01));

        let mut rd = reader(&[0x80], BitOrder::Msb0);
        assert_eq!(rd.read_bits(bits(1)).unwrap(), Some(1));
        assert_eq!(rd.read_bits(bits(7)).unwrap(), Some(0));

        let mut rd = reader(&[0x80], BitOrder::Lsb0);
        assert_eq!(rd.read_bits(bits(8)).unwrap(), Some(0x80));
    }

    #[test]
    fn test_msb0_through_bit_path() {
        let mut rd = reader(&[0x80], BitOrder::Msb0);
        rd.has_available_data().unwrap();
        assert_eq!(rd.buffered_bits(), 8);
        assert_eq!(rd.read_bits(bits(8)).unwrap(), Some(0x01));
        assert_eq!(rd.counter(), 1);
    }

    #[test]
    fn test_msb0_direct_reads_high_bits_first() {
        let mut rd = reader(&[0b1010_0110], BitOrder::Msb0Direct);
        assert_eq!(rd.read_bits(bits(3)).unwrap(), Some(0b101));
        assert_eq!(rd.read_bits(bits(5)).unwrap(), Some(0b00110));
        assert_eq!(rd.counter(), 1);

        let mut rd = reader(&[0x80, 0x01], BitOrder::Msb0Direct);
        assert_eq!(rd.read_u16(ByteOrder::BigEndian).unwrap(), 0x8001);
    }

    #[test]
    fn test_partial_read_at_end_of_stream() {
        let mut rd = reader(&[0xFF], BitOrder::Lsb0);
        assert_eq!(rd.read_bits(bits(6)).unwrap(), Some(0b11_1111));
        assert_eq!(rd.read_bits(bits(4)).unwrap(), Some(0b11));
        assert_eq!(rd.read_bits(bits(4)).unwrap(), None);
        assert_eq!(rd.counter(), 1);
    }

    #[test]
    fn test_read_u8_rejects_partial_byte() {
        let mut rd = reader(&[0xFF], BitOrder::Lsb0);
        rd.read_bits(bits(2)).unwrap();
        assert!(matches!(
            rd.read_u8(),
            Err(ReadError::EndOfData { what: "u8", .. })
        ));
    }

    #[test]
    fn test_multi_byte_orders() {
        let data = hex!("01 02 03 04 05 06 07 08");
        let mut rd = reader(&data, BitOrder::Lsb0);
        assert_eq!(rd.read_u16(ByteOrder::BigEndian).unwrap(), 0x0102);
        assert_eq!(rd.read_u16(ByteOrder::LittleEndian).unwrap(), 0x0403);
        assert_eq!(rd.read_i32(ByteOrder::LittleEndian).unwrap(), 0x0807_0605);
        assert_eq!(rd.counter(), 8);

        let mut rd = reader(&data, BitOrder::Lsb0);
        assert_eq!(rd.read_i64(ByteOrder::BigEndian).unwrap(), 0x0102_0304_0506_0708);
        let mut rd = reader(&data, BitOrder::Lsb0);
        assert_eq!(rd.read_i64(ByteOrder::LittleEndian).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_floats() {
        let mut rd = reader(&hex!("3E 80 00 00 00 00 80 3E"), BitOrder::Lsb0);
        assert_eq!(rd.read_f32(ByteOrder::BigEndian).unwrap(), 0.25);
        assert_eq!(rd.read_f32(ByteOrder::LittleEndian).unwrap(), 0.25);

        let mut rd = reader(&hex!("3F F8 00 00 00 00 00 00"), BitOrder::Lsb0);
        assert_eq!(rd.read_f64(ByteOrder::BigEndian).unwrap(), 1.5);
    }

    #[test]
    fn test_signed_and_unsigned() {
        let mut rd = reader(&hex!("FF FE FF FF FF FE"), BitOrder::Lsb0);
        assert_eq!(rd.read_i16(ByteOrder::BigEndian).unwrap(), -2);
        assert_eq!(rd.read_u32(ByteOrder::BigEndian).unwrap(), 0xFFFF_FFFE);
    }

    #[test]
    fn test_short_read_is_end_of_data() {
        let mut rd = reader(&[0x01, 0x02, 0x03], BitOrder::Lsb0);
        let err = rd.read_i32(ByteOrder::BigEndian).unwrap_err();
        assert!(matches!(
            err,
            ReadError::EndOfData {
                what: "u32",
                read: 3,
                expected: 4
            }
        ));
    }

    #[test]
    fn test_read_bool() {
        let mut rd = reader(&[0x00, 0x02], BitOrder::Lsb0);
        assert!(!rd.read_bool().unwrap());
        assert!(rd.read_bool().unwrap());
        assert!(rd.read_bool().is_err());
    }

    #[test]
    fn test_byte_array_limiter() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];

        let mut rd = reader(&data, BitOrder::Lsb0);
        assert!(matches!(
            rd.read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &3i64),
            Err(ReadError::ArraySizeExceeded { limit: 3, read: 4 })
        ));
        assert_eq!(rd.counter(), 4);

        let mut rd = reader(&data, BitOrder::Lsb0);
        let bytes = rd
            .read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &-3i64)
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 2]);
        assert!(rd.detected_array_limit());

        let mut rd = reader(&data, BitOrder::Lsb0);
        let bytes = rd
            .read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &0i64)
            .unwrap();
        assert_eq!(bytes, data.to_vec());
        assert!(!rd.detected_array_limit());
    }

    #[test]
    fn test_detected_limit_cleared_by_next_until_end_read() {
        let mut rd = reader(&[1, 2, 3, 4], BitOrder::Lsb0);
        rd.read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &-1i64)
            .unwrap();
        assert!(rd.detected_array_limit());
        let rest = rd
            .read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
            .unwrap();
        assert_eq!(rest, vec![2, 3, 4]);
        assert!(!rd.detected_array_limit());
    }

    #[test]
    fn test_until_end_grows_past_initial_capacity() {
        let data: Vec<u8> = (0..=255).collect();
        let mut rd = BitReader::with_config(
            data.as_slice(),
            StreamConfig {
                initial_array_capacity: 2,
                ..Default::default()
            },
        );
        let bytes = rd
            .read_byte_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
            .unwrap();
        assert_eq!(bytes, data);
        assert_eq!(rd.counter(), 256);
    }

    #[test]
    fn test_fixed_array_end_of_data() {
        let mut rd = reader(&[1, 2], BitOrder::Lsb0);
        assert!(matches!(
            rd.read_byte_array(ArrayCount::Fixed(3), ByteOrder::BigEndian, &NoLimit),
            Err(ReadError::EndOfData {
                read: 2,
                expected: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_byte_array_little_endian_reversed() {
        let mut rd = reader(&[1, 2, 3], BitOrder::Lsb0);
        let bytes = rd
            .read_byte_array(ArrayCount::Fixed(3), ByteOrder::LittleEndian, &NoLimit)
            .unwrap();
        assert_eq!(bytes, vec![3, 2, 1]);
    }

    #[test]
    fn test_bits_array_until_end() {
        let mut rd = reader(&[0b1110_0100], BitOrder::Lsb0);
        let values = rd
            .read_bits_array(ArrayCount::ToEnd, bits(2), &NoLimit)
            .unwrap();
        assert_eq!(values, vec![0b00, 0b01, 0b10, 0b11]);
        assert_eq!(rd.counter(), 1);
    }

    #[test]
    fn test_u16_array_until_end() {
        let mut rd = reader(&hex!("00 01 00 02 00 03"), BitOrder::Lsb0);
        let values = rd
            .read_u16_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(rd.counter(), 6);
    }

    #[test]
    fn test_i32_array_until_end_with_trailing_byte() {
        let mut rd = reader(&hex!("00 00 00 01 FF"), BitOrder::Lsb0);
        assert!(
            rd.read_i32_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
                .unwrap_err()
                .is_end_of_data()
        );
    }

    #[test]
    fn test_other_arrays() {
        let mut rd = reader(&hex!("FF FF 00 01 02 00"), BitOrder::Lsb0);
        assert_eq!(
            rd.read_i16_array(ArrayCount::Fixed(1), ByteOrder::BigEndian, &NoLimit)
                .unwrap(),
            vec![-1]
        );
        assert_eq!(
            rd.read_bool_array(ArrayCount::ToEnd, &NoLimit).unwrap(),
            vec![false, true, true, false]
        );

        let mut rd = reader(&hex!("3E 80 00 00 3F F8 00 00 00 00 00 00"), BitOrder::Lsb0);
        assert_eq!(
            rd.read_f32_array(ArrayCount::Fixed(1), ByteOrder::BigEndian, &NoLimit)
                .unwrap(),
            vec![0.25]
        );
        assert_eq!(
            rd.read_f64_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
                .unwrap(),
            vec![1.5]
        );

        let mut rd = reader(&hex!("00 00 00 00 00 00 00 07 FF FF FF FF"), BitOrder::Lsb0);
        assert_eq!(
            rd.read_i64_array(ArrayCount::Fixed(1), ByteOrder::BigEndian, &NoLimit)
                .unwrap(),
            vec![7]
        );
        assert_eq!(
            rd.read_u32_array(ArrayCount::ToEnd, ByteOrder::LittleEndian, &NoLimit)
                .unwrap(),
            vec![u32::MAX]
        );
    }

    #[test]
    fn test_read_strings() {
        let mut rd = reader(&hex!("FF 00 03 41 42 43"), BitOrder::Lsb0);
        assert_eq!(rd.read_string(ByteOrder::BigEndian).unwrap(), None);
        assert_eq!(rd.read_string(ByteOrder::BigEndian).unwrap(), Some(String::new()));
        assert_eq!(rd.read_string(ByteOrder::BigEndian).unwrap(), Some("ABC".to_string()));
    }

    #[test]
    fn test_read_long_string() {
        let mut data = vec![0x81, 0xC8];
        data.extend(std::iter::repeat_n(b'x', 200));
        let mut rd = reader(&data, BitOrder::Lsb0);
        let value = rd.read_string(ByteOrder::BigEndian).unwrap().unwrap();
        assert_eq!(value.len(), 200);
        assert!(value.bytes().all(|b| b == b'x'));

        let mut data = vec![0x82, 0x2C, 0x01];
        data.extend(std::iter::repeat_n(b'y', 300));
        let mut rd = reader(&data, BitOrder::Lsb0);
        let value = rd.read_string(ByteOrder::LittleEndian).unwrap().unwrap();
        assert_eq!(value.len(), 300);
    }

    #[test]
    fn test_wrong_string_prefix() {
        let mut rd = reader(&[0x90, 0x00], BitOrder::Lsb0);
        assert!(matches!(
            rd.read_string(ByteOrder::BigEndian),
            Err(ReadError::WrongStringPrefix(0x90))
        ));
    }

    #[test]
    fn test_malformed_utf8() {
        let mut rd = reader(&[0x02, 0xC3, 0x28], BitOrder::Lsb0);
        assert!(matches!(
            rd.read_string(ByteOrder::BigEndian),
            Err(ReadError::MalformedUtf8)
        ));
    }

    #[test]
    fn test_string_array_until_end() {
        let mut rd = reader(&hex!("01 61 FF 00"), BitOrder::Lsb0);
        let values = rd
            .read_string_array(ArrayCount::ToEnd, ByteOrder::BigEndian, &NoLimit)
            .unwrap();
        assert_eq!(values, vec![Some("a".to_string()), None, Some(String::new())]);
    }

    #[test]
    fn test_align_byte() {
        let mut rd = reader(&[0xFF, 0x42], BitOrder::Lsb0);
        rd.read_bits(bits(3)).unwrap();
        rd.align_byte();
        assert_eq!(rd.counter(), 1);
        assert_eq!(rd.buffered_bits(), 0);
        assert_eq!(rd.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_align_byte_keeps_peeked_byte() {
        let mut rd = reader(&[0x42], BitOrder::Lsb0);
        assert!(rd.has_available_data().unwrap());
        rd.align_byte();
        assert_eq!(rd.counter(), 0);
        assert_eq!(rd.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_align() {
        let mut rd = reader(&hex!("01 00 00 00 05"), BitOrder::Lsb0);
        rd.read_bits(bits(3)).unwrap();
        rd.align(4).unwrap();
        assert_eq!(rd.counter(), 4);
        assert_eq!(rd.read_u8().unwrap(), 5);

        let mut rd = reader(&hex!("01 02"), BitOrder::Lsb0);
        rd.read_u8().unwrap();
        assert!(rd.align(4).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_mark_reset_mid_byte() {
        let mut rd = reader(&[0xA5, 0x3C], BitOrder::Lsb0);
        rd.read_bits(bits(4)).unwrap();
        rd.mark(16);
        let counter = rd.counter();
        let first = rd.read_bits(bits(4)).unwrap();
        rd.read_u8().unwrap();
        rd.reset().unwrap();
        assert_eq!(rd.counter(), counter);
        assert_eq!(rd.read_bits(bits(4)).unwrap(), first);
        assert_eq!(rd.read_u8().unwrap(), 0x3C);
    }

    #[test]
    fn test_reset_without_mark() {
        let mut rd = reader(&[0x01], BitOrder::Lsb0);
        assert!(matches!(rd.reset(), Err(ReadError::ResetWithoutMark)));
    }

    #[test]
    fn test_skip_and_read_into() {
        let mut rd = reader(&[1, 2, 3, 4, 5], BitOrder::Lsb0);
        assert_eq!(rd.skip(2).unwrap(), 2);
        let mut buf = [0u8; 8];
        assert_eq!(rd.read_into(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[3, 4, 5]);
        assert_eq!(rd.skip(2).unwrap(), 0);
        assert_eq!(rd.counter(), 5);
    }

    #[test]
    fn test_io_read_adapter() {
        let mut rd = reader(&[9, 8, 7], BitOrder::Lsb0);
        let mut out = Vec::new();
        rd.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![9, 8, 7]);
    }

    #[test]
    fn test_reset_counter() {
        let mut rd = reader(&[0xFF, 0x01], BitOrder::Lsb0);
        rd.read_bits(bits(3)).unwrap();
        rd.reset_counter();
        assert_eq!(rd.counter(), 0);
        assert_eq!(rd.buffered_bits(), 0);
        assert_eq!(rd.read_u8().unwrap(), 0x01);
    }

    #[test]
    fn test_bit_buffer_state() {
        let mut rd = reader(&[0b1011_0000], BitOrder::Lsb0);
        rd.read_bits(bits(4)).unwrap();
        assert_eq!(rd.buffered_bits(), 4);
        assert_eq!(rd.bit_buffer(), 0b1011);
        assert_eq!(rd.bit_order(), BitOrder::Lsb0);
    }
}
