//! Packet header types and constants.

use bytestream::{ByteReader, ByteWriter};
use stroke::StrokeId;

use crate::error::{DecodeError, EncodeError, WireResult};

/// Magic number identifying inkcast packets.
///
/// This value is fixed and must never change across versions.
pub const MAGIC: u16 = 0x494B; // "IK" in ASCII

/// Current wire format version.
pub const VERSION: u8 = 1;

/// Header size in bytes (8 total).
pub const HEADER_SIZE: usize = 2 + 1 + 1 + 4;

/// Packet kind carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    Begin = 1,
    Update = 2,
    End = 3,
    Abort = 4,
}

impl PacketKind {
    /// Parses a kind byte.
    pub fn parse(kind: u8) -> Result<Self, DecodeError> {
        match kind {
            1 => Ok(Self::Begin),
            2 => Ok(Self::Update),
            3 => Ok(Self::End),
            4 => Ok(Self::Abort),
            _ => Err(DecodeError::UnknownPacketKind { kind }),
        }
    }

    /// Returns the kind byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Lowercase name, used by tooling output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Update => "update",
            Self::End => "end",
            Self::Abort => "abort",
        }
    }
}

/// Packet header.
///
/// This struct represents the header fields *after* the magic number.
/// The magic number is validated separately during decoding and is not
/// stored in this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Wire format version.
    pub version: u8,
    /// Packet kind.
    pub kind: PacketKind,
    /// Stroke the packet belongs to.
    pub stroke_id: StrokeId,
}

impl PacketHeader {
    /// Creates a header for the current version.
    #[must_use]
    pub const fn new(kind: PacketKind, stroke_id: StrokeId) -> Self {
        Self {
            version: VERSION,
            kind,
            stroke_id,
        }
    }
}

/// Encodes a packet header into the provided buffer.
///
/// Returns the number of bytes written.
pub fn encode_header(header: &PacketHeader, out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < HEADER_SIZE {
        return Err(EncodeError::BufferTooSmall {
            needed: HEADER_SIZE,
            available: out.len(),
        });
    }
    let mut writer = ByteWriter::new(out);
    writer.write_u16(MAGIC)?;
    writer.write_u8(header.version)?;
    writer.write_u8(header.kind.raw())?;
    writer.write_u32(header.stroke_id.raw())?;
    Ok(writer.finish())
}

/// Decodes and validates a header, leaving `reader` at the start of the body.
pub(crate) fn read_header(reader: &mut ByteReader<'_>) -> WireResult<PacketHeader> {
    if reader.remaining() < HEADER_SIZE {
        return Err(DecodeError::PacketTooSmall {
            actual: reader.remaining(),
            required: HEADER_SIZE,
        });
    }
    let magic = reader.read_u16()?;
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }
    let version = reader.read_u8()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }
    let kind = PacketKind::parse(reader.read_u8()?)?;
    let stroke_id = StrokeId::new(reader.read_u32()?);
    Ok(PacketHeader {
        version,
        kind,
        stroke_id,
    })
}

/// Decodes only the header of a packet.
pub fn decode_header(buf: &[u8]) -> WireResult<PacketHeader> {
    read_header(&mut ByteReader::new(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_is_ik_ascii() {
        assert_eq!(MAGIC, 0x494B);
        assert_eq!(&MAGIC.to_be_bytes(), b"IK");
    }

    #[test]
    fn version_is_one() {
        assert_eq!(VERSION, 1);
    }

    #[test]
    fn header_size_is_correct() {
        // magic(2) + version(1) + kind(1) + stroke_id(4)
        assert_eq!(HEADER_SIZE, 8);
    }

    #[test]
    fn kind_parse_roundtrip() {
        for kind in [
            PacketKind::Begin,
            PacketKind::Update,
            PacketKind::End,
            PacketKind::Abort,
        ] {
            assert_eq!(PacketKind::parse(kind.raw()).unwrap(), kind);
        }
    }

    #[test]
    fn kind_parse_rejects_unknown() {
        assert_eq!(
            PacketKind::parse(0),
            Err(DecodeError::UnknownPacketKind { kind: 0 })
        );
        assert_eq!(
            PacketKind::parse(9),
            Err(DecodeError::UnknownPacketKind { kind: 9 })
        );
    }

    #[test]
    fn header_roundtrip() {
        let header = PacketHeader::new(PacketKind::End, StrokeId::new(0xDEAD_BEEF));
        let mut buf = [0u8; HEADER_SIZE];
        let written = encode_header(&header, &mut buf).unwrap();
        assert_eq!(written, HEADER_SIZE);
        assert_eq!(decode_header(&buf).unwrap(), header);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let header = PacketHeader::new(PacketKind::Update, StrokeId::new(0x0102_0304));
        let mut buf = [0u8; HEADER_SIZE];
        encode_header(&header, &mut buf).unwrap();
        assert_eq!(buf, [0x4B, 0x49, 1, 2, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn encode_header_buffer_too_small() {
        let header = PacketHeader::new(PacketKind::Abort, StrokeId::new(1));
        let mut buf = [0u8; HEADER_SIZE - 1];
        assert_eq!(
            encode_header(&header, &mut buf),
            Err(EncodeError::BufferTooSmall {
                needed: HEADER_SIZE,
                available: HEADER_SIZE - 1,
            })
        );
    }

    #[test]
    fn decode_header_too_small() {
        assert_eq!(
            decode_header(&[0x4B, 0x49, 1]),
            Err(DecodeError::PacketTooSmall {
                actual: 3,
                required: HEADER_SIZE,
            })
        );
    }

    #[test]
    fn decode_header_invalid_magic() {
        let buf = [0xEF, 0xBE, 1, 1, 0, 0, 0, 0];
        assert_eq!(
            decode_header(&buf),
            Err(DecodeError::InvalidMagic { found: 0xBEEF })
        );
    }

    #[test]
    fn decode_header_unsupported_version() {
        let buf = [0x4B, 0x49, 7, 1, 0, 0, 0, 0];
        assert_eq!(
            decode_header(&buf),
            Err(DecodeError::UnsupportedVersion { found: 7 })
        );
    }

    #[test]
    fn header_const_constructible() {
        const HEADER: PacketHeader = PacketHeader::new(PacketKind::Begin, StrokeId::new(0));
        assert_eq!(HEADER.version, VERSION);
    }
}
