//! Error types for codec operations.

use std::fmt;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decompressing a point payload.
///
/// Compression has no error cases: running out of output space is reported
/// through the returned byte count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload ended in the middle of a record.
    TruncatedRecord {
        /// Byte offset of the incomplete record.
        offset: usize,
        /// Bytes the record needs.
        needed: usize,
        /// Bytes left in the payload.
        available: usize,
    },

    /// A delta moved a coordinate outside the logical space.
    CoordinateOutOfRange {
        /// Byte offset of the offending record.
        offset: usize,
        x: i32,
        y: i32,
    },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PointsPerPayload,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedRecord {
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "truncated record at offset {offset}: need {needed} bytes, have {available}"
                )
            }
            Self::CoordinateOutOfRange { offset, x, y } => {
                write!(
                    f,
                    "record at offset {offset} decodes to ({x}, {y}), outside logical space"
                )
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PointsPerPayload => "points per payload",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {}
