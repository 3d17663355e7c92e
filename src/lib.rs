//! # bitcodec
//!
//! Bit-level reader/writer pair for decoding and encoding arbitrary-width bit
//! fields, multi-byte primitives, arrays and length-prefixed strings over byte
//! streams.
//!
//! A stream is bound to one [BitOrder] for its lifetime, while [ByteOrder] is
//! passed per call so a single stream can mix big- and little-endian fields.
//! Reading the same sequence of widths, types and counts that was written, under
//! the same bit order, reproduces the written values.
//!
//! ## Example
//!
//! ```
//! use bitcodec::{BitOrder, BitReader, BitWidth, BitWriter, ByteOrder};
//!
//! let mut writer = BitWriter::new(Vec::new(), BitOrder::Lsb0);
//! writer.write_bits(0b101, BitWidth::BITS_3).unwrap();
//! writer.write_bits(0b11, BitWidth::BITS_2).unwrap();
//! writer.align(1).unwrap();
//! writer.write_u16(0xCAFE, ByteOrder::LittleEndian).unwrap();
//! writer.write_string(Some("ABC"), ByteOrder::BigEndian).unwrap();
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes, [0b0001_1101, 0xFE, 0xCA, 0x03, b'A', b'B', b'C']);
//!
//! let mut reader = BitReader::new(bytes.as_slice(), BitOrder::Lsb0);
//! assert_eq!(reader.read_bits(BitWidth::BITS_3).unwrap(), Some(0b101));
//! assert_eq!(reader.read_bits(BitWidth::BITS_2).unwrap(), Some(0b11));
//! reader.align(1).unwrap();
//! assert_eq!(reader.read_u16(ByteOrder::LittleEndian).unwrap(), 0xCAFE);
//! assert_eq!(reader.read_string(ByteOrder::BigEndian).unwrap().as_deref(), Some("ABC"));
//! assert_eq!(reader.counter(), 7);
//! ```

pub mod bit_reader;
pub mod bit_width;
pub mod bit_writer;
pub mod bits;
pub mod config;
pub mod errors;
pub mod field;
pub mod limiter;
pub mod order;
pub mod source;
pub mod string;

pub use bit_reader::BitReader;
pub use bit_width::BitWidth;
pub use bit_writer::BitWriter;
pub use config::StreamConfig;
pub use errors::{InvalidBitWidth, ReadError, WriteError};
pub use field::{FieldKind, Value};
pub use limiter::{ArrayCount, ArraySizeLimiter, NoLimit};
pub use order::{BitOrder, ByteOrder};
