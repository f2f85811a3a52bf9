//! Error types for wire format operations.

use std::fmt;

use codec::CodecError;
use stroke::StrokeId;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// High-level decode errors for wire framing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Packet is too small to contain the required header.
    PacketTooSmall { actual: usize, required: usize },

    /// Invalid magic number in packet header.
    InvalidMagic { found: u16 },

    /// Unsupported wire version.
    UnsupportedVersion { found: u8 },

    /// Unknown packet kind byte.
    UnknownPacketKind { kind: u8 },

    /// Packet body ended before a field was complete.
    Truncated { needed: usize, available: usize },

    /// Bytes left over after the packet body.
    TrailingBytes { count: usize },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PacketBytes,
    PayloadBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall { needed: usize, available: usize },
    LengthOverflow { length: usize },
}

/// Errors reported by [`crate::StrokeSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No Begin was sent for this stroke, or it already ended or aborted.
    UnknownStroke(StrokeId),

    /// Begin was sent twice for the same id.
    AlreadyStarted(StrokeId),

    /// The End packet can only declare up to `u16::MAX` points.
    TooManyPoints { stroke: StrokeId, total: usize },
}

/// A stroke could not be reassembled and was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFault {
    /// Stroke the fault applies to.
    pub stroke: StrokeId,
    /// What went wrong.
    pub kind: FaultKind,
}

/// Reason a stroke was discarded by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// More than one consecutive Update went missing, detected when the
    /// reorder buffer overflows.
    SequenceGap { expected: u16, received: u16 },

    /// The previous Update was lost and this one carried no redundant copy.
    MissingRedundancy { sequence: u16 },

    /// A payload failed to decompress.
    Payload(CodecError),

    /// A primary payload decoded to a different count than declared.
    BatchCountMismatch {
        sequence: u16,
        declared: u8,
        decoded: usize,
    },

    /// End declared a different total than was received.
    CountMismatch { declared: u16, actual: usize },

    /// End checksum disagrees with the received points.
    ChecksumMismatch { declared: u32, actual: u32 },

    /// Too many strokes were waiting on a Begin; this one was dropped.
    MissingBegin,

    /// The stroke was given up on before it completed.
    Abandoned {
        received: usize,
        declared: Option<u16>,
    },
}

impl AssemblyFault {
    pub(crate) const fn new(stroke: StrokeId, kind: FaultKind) -> Self {
        Self { stroke, kind }
    }

    /// Returns `true` if the fault came from lost packets rather than bad data.
    #[must_use]
    pub const fn is_desync(&self) -> bool {
        matches!(
            self.kind,
            FaultKind::SequenceGap { .. }
                | FaultKind::MissingRedundancy { .. }
                | FaultKind::MissingBegin
                | FaultKind::Abandoned { .. }
        )
    }

    /// Returns `true` if the received data failed verification.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        !self.is_desync()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketTooSmall { actual, required } => {
                write!(
                    f,
                    "packet too small: {actual} bytes, need at least {required}"
                )
            }
            Self::InvalidMagic { found } => {
                write!(f, "invalid magic number: 0x{found:04X}")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported wire version: {found}")
            }
            Self::UnknownPacketKind { kind } => {
                write!(f, "unknown packet kind: {kind}")
            }
            Self::Truncated { needed, available } => {
                write!(f, "truncated packet: need {needed} bytes, have {available}")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after packet body")
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
            Self::PacketBytes => "packet bytes",
            Self::PayloadBytes => "payload bytes",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small: need {needed}, have {available}")
            }
            Self::LengthOverflow { length } => {
                write!(f, "length overflow: {length}")
            }
        }
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStroke(id) => write!(f, "stroke {} is not in progress", id.raw()),
            Self::AlreadyStarted(id) => write!(f, "stroke {} already started", id.raw()),
            Self::TooManyPoints { stroke, total } => {
                write!(
                    f,
                    "stroke {} has {total} points, at most {} allowed",
                    stroke.raw(),
                    u16::MAX
                )
            }
        }
    }
}

impl fmt::Display for AssemblyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stroke {}: {}", self.stroke.raw(), self.kind)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceGap { expected, received } => {
                write!(f, "sequence gap: expected {expected}, received {received}")
            }
            Self::MissingRedundancy { sequence } => {
                write!(f, "update {sequence} cannot recover the lost batch before it")
            }
            Self::Payload(err) => write!(f, "payload error: {err}"),
            Self::BatchCountMismatch {
                sequence,
                declared,
                decoded,
            } => {
                write!(
                    f,
                    "update {sequence} declared {declared} points but decoded {decoded}"
                )
            }
            Self::CountMismatch { declared, actual } => {
                write!(f, "end declared {declared} points, received {actual}")
            }
            Self::ChecksumMismatch { declared, actual } => {
                write!(
                    f,
                    "checksum mismatch: declared 0x{declared:08X}, computed 0x{actual:08X}"
                )
            }
            Self::MissingBegin => write!(f, "no begin received"),
            Self::Abandoned { received, declared } => match declared {
                Some(total) => write!(f, "abandoned with {received} of {total} points"),
                None => write!(f, "abandoned with {received} points and no end"),
            },
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}

impl std::error::Error for SendError {}

impl std::error::Error for AssemblyFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            FaultKind::Payload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<bytestream::ByteError> for DecodeError {
    fn from(err: bytestream::ByteError) -> Self {
        match err {
            bytestream::ByteError::UnexpectedEof {
                requested,
                available,
            } => Self::Truncated {
                needed: requested,
                available,
            },
            bytestream::ByteError::BufferOverflow {
                attempted,
                available,
            } => Self::Truncated {
                needed: attempted,
                available,
            },
        }
    }
}

impl From<bytestream::ByteError> for EncodeError {
    fn from(err: bytestream::ByteError) -> Self {
        match err {
            bytestream::ByteError::BufferOverflow {
                attempted,
                available,
            }
            | bytestream::ByteError::UnexpectedEof {
                requested: attempted,
                available,
            } => Self::BufferTooSmall {
                needed: attempted,
                available,
            },
        }
    }
}
