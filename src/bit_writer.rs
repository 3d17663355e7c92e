//! Stateful bit-level encoder over a byte sink.

use std::io::{self, Write};

use tracing::debug;

use crate::{
    bit_width::BitWidth,
    config::StreamConfig,
    errors::WriteError,
    order::{BitOrder, ByteOrder},
    string::{StringPrefix, length_bytes},
};

/// Writes bit fields, primitives, arrays and strings to a byte sink.
///
/// Bits are collected in an internal bit buffer and emitted once 8 of them are
/// pending. Call [BitWriter::flush] or [BitWriter::finish] to emit a trailing
/// partial byte; dropping the writer loses it.
#[derive(Debug)]
pub struct BitWriter<W> {
    sink: W,
    bit_order: BitOrder,
    bit_buffer: u8,
    bits_in_buffer: u8,
    counter: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(sink: W, bit_order: BitOrder) -> Self {
        Self::with_config(
            sink,
            StreamConfig {
                bit_order,
                ..Default::default()
            },
        )
    }

    pub fn with_config(sink: W, config: StreamConfig) -> Self {
        Self {
            sink,
            bit_order: config.bit_order,
            bit_buffer: 0,
            bits_in_buffer: 0,
            counter: 0,
        }
    }

    /// Emits one whole byte with the bit order's byte transformation applied.
    fn emit_byte(&mut self, byte: u8) -> Result<(), WriteError> {
        self.sink.write_all(&[self.bit_order.wire_byte(byte)])?;
        self.counter += 1;
        Ok(())
    }

    /// Writes the low `width` bits of `value`. Higher bits are ignored.
    pub fn write_bits(&mut self, value: u8, width: BitWidth) -> Result<(), WriteError> {
        let n = width.get();

        if self.bits_in_buffer == 0 && n == 8 {
            return self.emit_byte(value);
        }

        if self.bit_order.is_direct() {
            let mut mask = 0x80u8 >> self.bits_in_buffer;
            for i in (0..n).rev() {
                if (value >> i) & 1 != 0 {
                    self.bit_buffer |= mask;
                }
                mask >>= 1;
                self.bits_in_buffer += 1;

                if self.bits_in_buffer == 8 {
                    self.emit_byte(self.bit_buffer)?;
                    self.bit_buffer = 0;
                    self.bits_in_buffer = 0;
                    mask = 0x80;
                }
            }
        } else {
            let mut mask = 1u8 << self.bits_in_buffer;
            let mut accum = value;
            for _ in 0..n {
                if accum & 1 != 0 {
                    self.bit_buffer |= mask;
                }
                accum >>= 1;
                mask <<= 1;
                self.bits_in_buffer += 1;

                if self.bits_in_buffer == 8 {
                    self.emit_byte(self.bit_buffer)?;
                    self.bit_buffer = 0;
                    self.bits_in_buffer = 0;
                    mask = 1;
                }
            }
        }

        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WriteError> {
        self.write_bits(value, BitWidth::BITS_8)
    }

    /// Writes `1` for `true` and `0` for `false`.
    pub fn write_bool(&mut self, value: bool) -> Result<(), WriteError> {
        self.write_u8(value as u8)
    }

    fn write_all_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        bytes.iter().try_for_each(|&byte| self.write_u8(byte))
    }

    pub fn write_u16(&mut self, value: u16, order: ByteOrder) -> Result<(), WriteError> {
        match order {
            ByteOrder::BigEndian => self.write_all_bytes(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.write_all_bytes(&value.to_le_bytes()),
        }
    }

    pub fn write_i16(&mut self, value: i16, order: ByteOrder) -> Result<(), WriteError> {
        self.write_u16(value as u16, order)
    }

    pub fn write_u32(&mut self, value: u32, order: ByteOrder) -> Result<(), WriteError> {
        match order {
            ByteOrder::BigEndian => self.write_all_bytes(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.write_all_bytes(&value.to_le_bytes()),
        }
    }

    pub fn write_i32(&mut self, value: i32, order: ByteOrder) -> Result<(), WriteError> {
        self.write_u32(value as u32, order)
    }

    pub fn write_i64(&mut self, value: i64, order: ByteOrder) -> Result<(), WriteError> {
        match order {
            ByteOrder::BigEndian => self.write_all_bytes(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.write_all_bytes(&value.to_le_bytes()),
        }
    }

    pub fn write_f32(&mut self, value: f32, order: ByteOrder) -> Result<(), WriteError> {
        self.write_u32(value.to_bits(), order)
    }

    pub fn write_f64(&mut self, value: f64, order: ByteOrder) -> Result<(), WriteError> {
        self.write_i64(value.to_bits() as i64, order)
    }

    /// Writes the first `length` bytes of `bytes`, or all of them for `None`.
    /// A `length` past the end of `bytes` is clamped.
    ///
    /// For [ByteOrder::LittleEndian] the selected bytes are written in reverse.
    pub fn write_bytes(
        &mut self,
        bytes: &[u8],
        length: Option<usize>,
        order: ByteOrder,
    ) -> Result<(), WriteError> {
        let bytes = match length {
            Some(length) => &bytes[..length.min(bytes.len())],
            None => bytes,
        };

        match order {
            ByteOrder::BigEndian => self.write_all_bytes(bytes),
            ByteOrder::LittleEndian => bytes.iter().rev().try_for_each(|&byte| self.write_u8(byte)),
        }
    }

    /// Writes every element of `values` as a `width`-bit field.
    pub fn write_bits_array(&mut self, values: &[u8], width: BitWidth) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_bits(value, width))
    }

    pub fn write_bool_array(&mut self, values: &[bool]) -> Result<(), WriteError> {
        values.iter().try_for_each(|&value| self.write_bool(value))
    }

    pub fn write_u16_array(&mut self, values: &[u16], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_u16(value, order))
    }

    pub fn write_i16_array(&mut self, values: &[i16], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_i16(value, order))
    }

    pub fn write_u32_array(&mut self, values: &[u32], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_u32(value, order))
    }

    pub fn write_i32_array(&mut self, values: &[i32], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_i32(value, order))
    }

    pub fn write_i64_array(&mut self, values: &[i64], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_i64(value, order))
    }

    pub fn write_f32_array(&mut self, values: &[f32], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_f32(value, order))
    }

    pub fn write_f64_array(&mut self, values: &[f64], order: ByteOrder) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|&value| self.write_f64(value, order))
    }

    /// Writes a length prefix and the UTF-8 payload. `None` is written as the absent-string prefix.
    pub fn write_string(&mut self, value: Option<&str>, order: ByteOrder) -> Result<(), WriteError> {
        let payload = value.map(str::as_bytes);
        let prefix = StringPrefix::for_len(payload.map(<[u8]>::len))?;
        self.write_u8(prefix.to_byte())?;

        if let (StringPrefix::Extended(n), Some(payload)) = (prefix, payload) {
            self.write_all_bytes(&length_bytes(payload.len() as u32, n, order))?;
        }
        if let Some(payload) = payload {
            self.write_all_bytes(payload)?;
        }

        Ok(())
    }

    pub fn write_string_array<S: AsRef<str>>(
        &mut self,
        values: &[Option<S>],
        order: ByteOrder,
    ) -> Result<(), WriteError> {
        values
            .iter()
            .try_for_each(|value| self.write_string(value.as_ref().map(|s| s.as_ref()), order))
    }

    /// Pads a partial byte with zero bits, then writes zero bytes until the counter
    /// is a multiple of `alignment`.
    pub fn align(&mut self, alignment: u64) -> Result<(), WriteError> {
        if self.bits_in_buffer > 0 {
            self.write_bits(0, BitWidth::new(8 - self.bits_in_buffer)?)?;
        }

        if alignment > 0 {
            let padding = (alignment - self.counter % alignment) % alignment;
            if padding > 0 {
                debug!(alignment, padding, "writing alignment padding");
            }
            for _ in 0..padding {
                self.write_u8(0)?;
            }
        }

        Ok(())
    }

    /// Emits a pending partial byte, padded with zero bits.
    fn flush_pending(&mut self) -> Result<(), WriteError> {
        if self.bits_in_buffer > 0 {
            let byte = self.bit_buffer;
            self.bit_buffer = 0;
            self.bits_in_buffer = 0;
            self.emit_byte(byte)?;
        }

        Ok(())
    }

    /// Emits a pending partial byte and flushes the sink.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.flush_pending()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Flushes and returns the sink.
    pub fn finish(mut self) -> Result<W, WriteError> {
        self.flush()?;
        Ok(self.sink)
    }

    /// Number of bytes emitted to the sink.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Zeroes the counter and drops any pending bits.
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

    /// Number of pending bits, 0..=7.
    pub fn buffered_bits(&self) -> u8 {
        self.bits_in_buffer
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

impl<W: Write> Write for BitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.sink.flush()
    }
}
