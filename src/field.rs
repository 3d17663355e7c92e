//! Closed set of primitive field kinds and their values.
//!
//! Collaborators that walk a record layout (a format description, a derive, a
//! generated parser) describe each field with a [FieldKind] and go through
//! [BitReader::read_value] / [BitWriter::write_value] instead of calling the
//! typed stream methods one by one.

use std::io::{Read, Write};

use crate::{
    bit_reader::BitReader,
    bit_width::BitWidth,
    bit_writer::BitWriter,
    errors::{ReadError, WriteError},
    limiter::{ArrayCount, ArraySizeLimiter},
    order::ByteOrder,
};

/// Wire type of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Bit field of 1..=8 bits.
    Bits(BitWidth),
    Bool,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    F32,
    F64,
    /// Length-prefixed UTF-8 string.
    Str,
}

/// A decoded field, or a value to encode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bits { value: u8, width: BitWidth },
    Bool(bool),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(Option<String>),
    Array(Vec<Value>),
}

impl Value {
    /// Kind of a scalar value, `None` for arrays.
    pub fn kind(&self) -> Option<FieldKind> {
        Some(match self {
            Value::Bits { width, .. } => FieldKind::Bits(*width),
            Value::Bool(_) => FieldKind::Bool,
            Value::U8(_) => FieldKind::U8,
            Value::I16(_) => FieldKind::I16,
            Value::U16(_) => FieldKind::U16,
            Value::I32(_) => FieldKind::I32,
            Value::U32(_) => FieldKind::U32,
            Value::I64(_) => FieldKind::I64,
            Value::F32(_) => FieldKind::F32,
            Value::F64(_) => FieldKind::F64,
            Value::Str(_) => FieldKind::Str,
            Value::Array(_) => return None,
        })
    }
}

impl<R: Read> BitReader<R> {
    /// Reads one field of the given kind. Multi-byte kinds use `order`.
    pub fn read_value(&mut self, kind: FieldKind, order: ByteOrder) -> Result<Value, ReadError> {
        Ok(match kind {
            FieldKind::Bits(width) => Value::Bits {
                value: self
                    .read_bits(width)?
                    .ok_or_else(|| ReadError::eof("bits", 0, width.get() as usize))?,
                width,
            },
            FieldKind::Bool => Value::Bool(self.read_bool()?),
            FieldKind::U8 => Value::U8(self.read_u8()?),
            FieldKind::I16 => Value::I16(self.read_i16(order)?),
            FieldKind::U16 => Value::U16(self.read_u16(order)?),
            FieldKind::I32 => Value::I32(self.read_i32(order)?),
            FieldKind::U32 => Value::U32(self.read_u32(order)?),
            FieldKind::I64 => Value::I64(self.read_i64(order)?),
            FieldKind::F32 => Value::F32(self.read_f32(order)?),
            FieldKind::F64 => Value::F64(self.read_f64(order)?),
            FieldKind::Str => Value::Str(self.read_string(order)?),
        })
    }

    /// Reads an array of `kind` elements as a [Value::Array].
    ///
    /// `U8` arrays are read as plain bytes and are not reversed for little-endian.
    pub fn read_values<L: ArraySizeLimiter + ?Sized>(
        &mut self,
        kind: FieldKind,
        count: ArrayCount,
        order: ByteOrder,
        limiter: &L,
    ) -> Result<Value, ReadError> {
        fn wrap<T>(values: Vec<T>, f: impl Fn(T) -> Value) -> Value {
            Value::Array(values.into_iter().map(f).collect())
        }

        Ok(match kind {
            FieldKind::Bits(width) => wrap(
                self.read_bits_array(count, width, limiter)?,
                |value| Value::Bits { value, width },
            ),
            FieldKind::Bool => wrap(self.read_bool_array(count, limiter)?, Value::Bool),
            FieldKind::U8 => wrap(
                self.read_byte_array(count, ByteOrder::BigEndian, limiter)?,
                Value::U8,
            ),
            FieldKind::I16 => wrap(self.read_i16_array(count, order, limiter)?, Value::I16),
            FieldKind::U16 => wrap(self.read_u16_array(count, order, limiter)?, Value::U16),
            FieldKind::I32 => wrap(self.read_i32_array(count, order, limiter)?, Value::I32),
            FieldKind::U32 => wrap(self.read_u32_array(count, order, limiter)?, Value::U32),
            FieldKind::I64 => wrap(self.read_i64_array(count, order, limiter)?, Value::I64),
            FieldKind::F32 => wrap(self.read_f32_array(count, order, limiter)?, Value::F32),
            FieldKind::F64 => wrap(self.read_f64_array(count, order, limiter)?, Value::F64),
            FieldKind::Str => wrap(self.read_string_array(count, order, limiter)?, Value::Str),
        })
    }
}

impl<W: Write> BitWriter<W> {
    /// Writes a value; arrays are written element by element.
    pub fn write_value(&mut self, value: &Value, order: ByteOrder) -> Result<(), WriteError> {
        match value {
            Value::Bits { value, width } => self.write_bits(*value, *width),
            Value::Bool(value) => self.write_bool(*value),
            Value::U8(value) => self.write_u8(*value),
            Value::I16(value) => self.write_i16(*value, order),
            Value::U16(value) => self.write_u16(*value, order),
            Value::I32(value) => self.write_i32(*value, order),
            Value::U32(value) => self.write_u32(*value, order),
            Value::I64(value) => self.write_i64(*value, order),
            Value::F32(value) => self.write_f32(*value, order),
            Value::F64(value) => self.write_f64(*value, order),
            Value::Str(value) => self.write_string(value.as_deref(), order),
            Value::Array(values) => values
                .iter()
                .try_for_each(|value| self.write_value(value, order)),
        }
    }
}
