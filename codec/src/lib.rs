//! Delta compression for inkcast stroke points.
//!
//! Shrinks an ordered point sequence into small signed deltas, with an
//! absolute escape record whenever a step is too large to fit.
//!
//! # Features
//!
//! - Bounded compression into caller-provided buffers
//! - Exact, lossless decompression of every whole record
//! - Escape records for arbitrary jumps (stroke starts, splice points)
//!
//! # Design Principles
//!
//! - **Never overrun** - Compression stops at the last whole record that fits.
//! - **No steady-state allocations** - Uses caller-provided buffers.
//! - **Deterministic** - Same inputs produce same outputs.
//!
//! # Example
//!
//! ```
//! use codec::{compress, decompress, MAX_RECORD_LEN};
//! use stroke::QuantizedPoint;
//!
//! let origin = QuantizedPoint::new(100, 100, 128);
//! let points = [
//!     QuantizedPoint::new(105, 105, 130),
//!     QuantizedPoint::new(200, 200, 140),
//! ];
//! let mut buf = [0u8; 2 * MAX_RECORD_LEN];
//! let len = compress(origin, &points, &mut buf);
//!
//! let mut out = Vec::new();
//! decompress(origin, &buf[..len], &mut out).unwrap();
//! assert_eq!(out, points);
//! ```

mod delta;
mod error;
mod limits;

pub use delta::{
    compress, compress_prefix, decompress, decompress_with_limits, encoded_len, Compressed,
    DELTA_RECORD_LEN, ESCAPE_MARKER, ESCAPE_RECORD_LEN, MAX_RECORD_LEN, STROKE_ORIGIN,
};
pub use error::{CodecError, CodecResult, LimitKind};
pub use limits::CodecLimits;
