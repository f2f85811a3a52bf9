//! Packet bodies, encoding and decoding.

use bytestream::{ByteReader, ByteWriter};
use stroke::{BrushId, Rgba, StrokeId};

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::header::{encode_header, read_header, PacketHeader, PacketKind, HEADER_SIZE};
use crate::limits::Limits;

/// Begin body size in bytes.
pub const BEGIN_BODY_SIZE: usize = 2 + 4 + 4 + 4;

/// End body size in bytes.
pub const END_BODY_SIZE: usize = 2 + 4;

/// Fixed bytes of an Update packet: header, sequence, count and both lengths.
pub const UPDATE_OVERHEAD: usize = HEADER_SIZE + 2 + 1 + 2 + 2;

/// Opens a stroke and carries its immutable attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeginPacket {
    pub stroke_id: StrokeId,
    pub brush: BrushId,
    pub color: Rgba,
    pub size: f32,
    pub seed: u32,
}

impl BeginPacket {
    /// Compares attributes bitwise, so a repeated Begin with a NaN size
    /// still matches itself.
    #[must_use]
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.stroke_id == other.stroke_id
            && self.brush == other.brush
            && self.color == other.color
            && self.size.to_bits() == other.size.to_bits()
            && self.seed == other.seed
    }
}

/// One batch of compressed points plus the previous batch as redundancy.
///
/// Borrows its payloads: a transport must copy them before the send call
/// returns if it keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePacket<'a> {
    pub stroke_id: StrokeId,
    /// Per-stroke wrapping sequence, starting at 0.
    pub sequence: u16,
    /// Points encoded in `payload`.
    pub count: u8,
    /// Primary payload, compressed from the last point of the previous batch.
    pub payload: &'a [u8],
    /// Previous batch's payload, empty for the first batch.
    pub redundant: &'a [u8],
}

impl UpdatePacket<'_> {
    /// Returns `true` if the packet can restore the batch before it.
    #[must_use]
    pub const fn has_redundancy(&self) -> bool {
        !self.redundant.is_empty()
    }
}

/// Closes a stroke with its declared point total and checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndPacket {
    pub stroke_id: StrokeId,
    pub total_points: u16,
    pub checksum: u32,
}

/// Cancels a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortPacket {
    pub stroke_id: StrokeId,
}

/// A decoded packet borrowing from its source buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet<'a> {
    Begin(BeginPacket),
    Update(UpdatePacket<'a>),
    End(EndPacket),
    Abort(AbortPacket),
}

impl Packet<'_> {
    /// Returns the packet kind.
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        match self {
            Self::Begin(_) => PacketKind::Begin,
            Self::Update(_) => PacketKind::Update,
            Self::End(_) => PacketKind::End,
            Self::Abort(_) => PacketKind::Abort,
        }
    }

    /// Returns the stroke the packet belongs to.
    #[must_use]
    pub const fn stroke_id(&self) -> StrokeId {
        match self {
            Self::Begin(p) => p.stroke_id,
            Self::Update(p) => p.stroke_id,
            Self::End(p) => p.stroke_id,
            Self::Abort(p) => p.stroke_id,
        }
    }

    /// Exact encoded size in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        HEADER_SIZE
            + match self {
                Self::Begin(_) => BEGIN_BODY_SIZE,
                Self::Update(p) => 2 + 1 + 2 + p.payload.len() + 2 + p.redundant.len(),
                Self::End(_) => END_BODY_SIZE,
                Self::Abort(_) => 0,
            }
    }

    /// Deep-copies the packet, detaching it from the source buffer.
    #[must_use]
    pub fn to_owned_packet(&self) -> OwnedPacket {
        match *self {
            Self::Begin(p) => OwnedPacket::Begin(p),
            Self::Update(p) => OwnedPacket::Update(OwnedUpdate::from(&p)),
            Self::End(p) => OwnedPacket::End(p),
            Self::Abort(p) => OwnedPacket::Abort(p),
        }
    }
}

/// An Update whose payloads are owned copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedUpdate {
    pub stroke_id: StrokeId,
    pub sequence: u16,
    pub count: u8,
    pub payload: Vec<u8>,
    pub redundant: Vec<u8>,
}

impl OwnedUpdate {
    /// Borrows the owned payloads as a packet view.
    #[must_use]
    pub fn as_packet(&self) -> UpdatePacket<'_> {
        UpdatePacket {
            stroke_id: self.stroke_id,
            sequence: self.sequence,
            count: self.count,
            payload: &self.payload,
            redundant: &self.redundant,
        }
    }
}

impl From<&UpdatePacket<'_>> for OwnedUpdate {
    fn from(packet: &UpdatePacket<'_>) -> Self {
        Self {
            stroke_id: packet.stroke_id,
            sequence: packet.sequence,
            count: packet.count,
            payload: packet.payload.to_vec(),
            redundant: packet.redundant.to_vec(),
        }
    }
}

/// A packet that owns its payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedPacket {
    Begin(BeginPacket),
    Update(OwnedUpdate),
    End(EndPacket),
    Abort(AbortPacket),
}

impl OwnedPacket {
    /// Borrows the packet as a view.
    #[must_use]
    pub fn as_packet(&self) -> Packet<'_> {
        match self {
            Self::Begin(p) => Packet::Begin(*p),
            Self::Update(p) => Packet::Update(p.as_packet()),
            Self::End(p) => Packet::End(*p),
            Self::Abort(p) => Packet::Abort(*p),
        }
    }

    /// Returns the stroke the packet belongs to.
    #[must_use]
    pub fn stroke_id(&self) -> StrokeId {
        self.as_packet().stroke_id()
    }
}

/// Decodes a complete packet.
///
/// Rejects packets over `limits.max_packet_bytes`, payloads over
/// `Limits::payload_capacity`, truncated bodies and trailing bytes.
pub fn decode_packet<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Packet<'a>> {
    if buf.len() > limits.max_packet_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::PacketBytes,
            limit: limits.max_packet_bytes,
            actual: buf.len(),
        });
    }

    let mut reader = ByteReader::new(buf);
    let header = read_header(&mut reader)?;
    let stroke_id = header.stroke_id;

    let packet = match header.kind {
        PacketKind::Begin => Packet::Begin(BeginPacket {
            stroke_id,
            brush: BrushId::new(reader.read_u16()?),
            color: Rgba::from_packed(reader.read_u32()?),
            size: reader.read_f32()?,
            seed: reader.read_u32()?,
        }),
        PacketKind::Update => {
            let sequence = reader.read_u16()?;
            let count = reader.read_u8()?;
            let payload = read_payload(&mut reader, limits)?;
            let redundant = read_payload(&mut reader, limits)?;
            Packet::Update(UpdatePacket {
                stroke_id,
                sequence,
                count,
                payload,
                redundant,
            })
        }
        PacketKind::End => Packet::End(EndPacket {
            stroke_id,
            total_points: reader.read_u16()?,
            checksum: reader.read_u32()?,
        }),
        PacketKind::Abort => Packet::Abort(AbortPacket { stroke_id }),
    };

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining(),
        });
    }
    Ok(packet)
}

fn read_payload<'a>(reader: &mut ByteReader<'a>, limits: &Limits) -> WireResult<&'a [u8]> {
    let len = usize::from(reader.read_u16()?);
    let limit = limits.payload_capacity();
    if len > limit {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::PayloadBytes,
            limit,
            actual: len,
        });
    }
    Ok(reader.read_bytes(len)?)
}

/// Encodes a packet into `out`, returning the bytes written.
///
/// Writes nothing when `out` is too small.
pub fn encode_packet(packet: &Packet<'_>, out: &mut [u8]) -> Result<usize, EncodeError> {
    let needed = packet.encoded_len();
    if out.len() < needed {
        return Err(EncodeError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let header = PacketHeader::new(packet.kind(), packet.stroke_id());
    let offset = encode_header(&header, out)?;
    let mut writer = ByteWriter::new(&mut out[offset..]);
    match packet {
        Packet::Begin(p) => {
            writer.write_u16(p.brush.raw())?;
            writer.write_u32(p.color.packed())?;
            writer.write_f32(p.size)?;
            writer.write_u32(p.seed)?;
        }
        Packet::Update(p) => {
            writer.write_u16(p.sequence)?;
            writer.write_u8(p.count)?;
            write_payload(&mut writer, p.payload)?;
            write_payload(&mut writer, p.redundant)?;
        }
        Packet::End(p) => {
            writer.write_u16(p.total_points)?;
            writer.write_u32(p.checksum)?;
        }
        Packet::Abort(_) => {}
    }
    Ok(offset + writer.finish())
}

fn write_payload(writer: &mut ByteWriter<'_>, payload: &[u8]) -> Result<(), EncodeError> {
    let len = u16::try_from(payload.len()).map_err(|_| EncodeError::LengthOverflow {
        length: payload.len(),
    })?;
    writer.write_u16(len)?;
    writer.write_bytes(payload)?;
    Ok(())
}

/// Encodes a packet into a freshly allocated buffer.
pub fn encode_to_vec(packet: &Packet<'_>) -> Result<Vec<u8>, EncodeError> {
    let mut buf = vec![0u8; packet.encoded_len()];
    let len = encode_packet(packet, &mut buf)?;
    buf.truncate(len);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begin() -> BeginPacket {
        BeginPacket {
            stroke_id: StrokeId::new(7),
            brush: BrushId::new(3),
            color: Rgba::from_channels(10, 20, 30, 255),
            size: 12.5,
            seed: 99,
        }
    }

    fn roundtrip(packet: &Packet<'_>) -> OwnedPacket {
        let bytes = encode_to_vec(packet).unwrap();
        assert_eq!(bytes.len(), packet.encoded_len());
        decode_packet(&bytes, &Limits::default())
            .unwrap()
            .to_owned_packet()
    }

    #[test]
    fn begin_roundtrip() {
        let packet = Packet::Begin(begin());
        assert_eq!(roundtrip(&packet), OwnedPacket::Begin(begin()));
        assert_eq!(packet.encoded_len(), HEADER_SIZE + BEGIN_BODY_SIZE);
    }

    #[test]
    fn update_roundtrip() {
        let update = UpdatePacket {
            stroke_id: StrokeId::new(7),
            sequence: 65_535,
            count: 2,
            payload: &[1, 2, 3, 4, 5, 6],
            redundant: &[9, 9, 9],
        };
        let owned = roundtrip(&Packet::Update(update));
        assert_eq!(owned, OwnedPacket::Update(OwnedUpdate::from(&update)));
        assert_eq!(owned.as_packet(), Packet::Update(update));
    }

    #[test]
    fn end_and_abort_roundtrip() {
        let end = EndPacket {
            stroke_id: StrokeId::new(1),
            total_points: 400,
            checksum: 0xA1B2_C3D4,
        };
        assert_eq!(roundtrip(&Packet::End(end)), OwnedPacket::End(end));

        let abort = AbortPacket {
            stroke_id: StrokeId::new(2),
        };
        assert_eq!(roundtrip(&Packet::Abort(abort)), OwnedPacket::Abort(abort));
        assert_eq!(Packet::Abort(abort).encoded_len(), HEADER_SIZE);
    }

    #[test]
    fn update_layout() {
        let update = UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence: 0x0102,
            count: 1,
            payload: &[0xAA],
            redundant: &[],
        };
        let bytes = encode_to_vec(&Packet::Update(update)).unwrap();
        assert_eq!(
            &bytes[HEADER_SIZE..],
            &[0x02, 0x01, 1, 1, 0, 0xAA, 0, 0]
        );
        assert_eq!(bytes.len(), UPDATE_OVERHEAD + 1);
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let abort = Packet::Abort(AbortPacket {
            stroke_id: StrokeId::new(2),
        });
        let mut bytes = encode_to_vec(&abort).unwrap();
        bytes.push(0);
        assert_eq!(
            decode_packet(&bytes, &Limits::default()),
            Err(DecodeError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn decode_rejects_truncated_body() {
        let bytes = encode_to_vec(&Packet::Begin(begin())).unwrap();
        let result = decode_packet(&bytes[..bytes.len() - 1], &Limits::default());
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn decode_rejects_oversized_payload() {
        let payload = vec![0u8; 200];
        let update = UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence: 0,
            count: 1,
            payload: &payload,
            redundant: &[],
        };
        let bytes = encode_to_vec(&Packet::Update(update)).unwrap();
        let mut limits = Limits::default();
        limits.max_payload_bytes = 100;
        assert_eq!(
            decode_packet(&bytes, &limits),
            Err(DecodeError::LimitsExceeded {
                kind: LimitKind::PayloadBytes,
                limit: 100,
                actual: 200,
            })
        );
    }

    #[test]
    fn decode_rejects_oversized_packet() {
        let bytes = encode_to_vec(&Packet::Begin(begin())).unwrap();
        let mut limits = Limits::default();
        limits.max_packet_bytes = HEADER_SIZE;
        assert!(matches!(
            decode_packet(&bytes, &limits),
            Err(DecodeError::LimitsExceeded {
                kind: LimitKind::PacketBytes,
                ..
            })
        ));
    }

    #[test]
    fn encode_buffer_too_small_writes_nothing() {
        let mut buf = [0xFFu8; HEADER_SIZE + 3];
        let result = encode_packet(&Packet::Begin(begin()), &mut buf);
        assert!(matches!(result, Err(EncodeError::BufferTooSmall { .. })));
        assert!(buf.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn encode_length_overflow() {
        let payload = vec![0u8; usize::from(u16::MAX) + 1];
        let update = UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence: 0,
            count: 0,
            payload: &payload,
            redundant: &[],
        };
        assert_eq!(
            encode_to_vec(&Packet::Update(update)),
            Err(EncodeError::LengthOverflow {
                length: payload.len()
            })
        );
    }

    #[test]
    fn same_attributes_handles_nan() {
        let mut a = begin();
        a.size = f32::NAN;
        let b = a;
        assert!(a.same_attributes(&b));
        let mut c = a;
        c.seed += 1;
        assert!(!a.same_attributes(&c));
    }

    #[test]
    fn owned_copy_is_detached() {
        let mut source = vec![1u8, 2, 3];
        let owned = {
            let update = UpdatePacket {
                stroke_id: StrokeId::new(1),
                sequence: 0,
                count: 1,
                payload: &source,
                redundant: &[],
            };
            Packet::Update(update).to_owned_packet()
        };
        source.fill(0);
        match owned {
            OwnedPacket::Update(update) => assert_eq!(update.payload, vec![1, 2, 3]),
            other => panic!("unexpected packet {other:?}"),
        }
    }
}
