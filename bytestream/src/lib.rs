//! Bounded byte cursors for the inkcast stroke codec.
//!
//! This crate provides [`ByteWriter`] and [`ByteReader`] for little-endian
//! encoding into and decoding out of caller-provided buffers.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - A writer never grows or writes past its slice; a
//!   reader never reads past its slice.
//! - **No domain knowledge** - This crate knows nothing about strokes or packets.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bytestream::{ByteReader, ByteWriter};
//!
//! let mut buf = [0u8; 8];
//! let mut writer = ByteWriter::new(&mut buf);
//! writer.write_u16(0xBEEF).unwrap();
//! writer.write_i8(-3).unwrap();
//! let len = writer.finish();
//!
//! let mut reader = ByteReader::new(&buf[..len]);
//! assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
//! assert_eq!(reader.read_i8().unwrap(), -3);
//! assert!(reader.is_empty());
//! ```

mod error;
mod reader;
mod writer;

pub use error::{ByteError, ByteResult};
pub use reader::ByteReader;
pub use writer::ByteWriter;
