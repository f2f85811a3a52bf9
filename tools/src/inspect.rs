//! Packet inspection.

use std::fmt::Write as _;

use codec::{decompress_with_limits, CodecLimits, ESCAPE_MARKER, STROKE_ORIGIN};
use serde::Serialize;
use wire::{decode_packet, DecodeError, Limits, Packet};

/// Decoded summary of one packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub bytes: usize,
    pub kind: &'static str,
    pub stroke_id: u32,
    pub body: BodyReport,
}

/// Kind-specific packet fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyReport {
    Begin {
        brush: u16,
        eraser: bool,
        color: [u8; 4],
        size: f32,
        seed: u32,
    },
    Update {
        sequence: u16,
        count: u8,
        primary: PayloadReport,
        redundant: PayloadReport,
    },
    End {
        total_points: u16,
        checksum: String,
    },
    Abort,
}

/// What could be learned from one compressed payload in isolation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadReport {
    pub bytes: usize,
    /// Points the payload decodes to, if it decodes.
    pub points: Option<usize>,
    /// First point, when the payload opens with an absolute record.
    pub first_point: Option<[u16; 3]>,
    pub error: Option<String>,
}

/// Decodes `bytes` and summarizes the packet.
pub fn inspect_packet(
    bytes: &[u8],
    limits: &Limits,
    codec_limits: &CodecLimits,
) -> Result<InspectReport, DecodeError> {
    let packet = decode_packet(bytes, limits)?;
    let body = match &packet {
        Packet::Begin(begin) => BodyReport::Begin {
            brush: begin.brush.raw(),
            eraser: begin.brush.is_eraser(),
            color: begin.color.channels(),
            size: begin.size,
            seed: begin.seed,
        },
        Packet::Update(update) => BodyReport::Update {
            sequence: update.sequence,
            count: update.count,
            primary: inspect_payload(update.payload, codec_limits),
            redundant: inspect_payload(update.redundant, codec_limits),
        },
        Packet::End(end) => BodyReport::End {
            total_points: end.total_points,
            checksum: format!("0x{:08x}", end.checksum),
        },
        Packet::Abort(_) => BodyReport::Abort,
    };
    Ok(InspectReport {
        bytes: bytes.len(),
        kind: packet.kind().name(),
        stroke_id: packet.stroke_id().raw(),
        body,
    })
}

/// Payloads are relative to a point carried by an earlier packet, so only
/// the count is meaningful unless the first record is absolute.
fn inspect_payload(payload: &[u8], limits: &CodecLimits) -> PayloadReport {
    let mut points = Vec::new();
    let mut report = PayloadReport {
        bytes: payload.len(),
        ..PayloadReport::default()
    };
    match decompress_with_limits(STROKE_ORIGIN, payload, limits, &mut points) {
        Ok(count) => {
            report.points = Some(count);
            if payload.first() == Some(&ESCAPE_MARKER) {
                report.first_point = points
                    .first()
                    .map(|point| [point.x, point.y, u16::from(point.pressure)]);
            }
        }
        Err(err) => report.error = Some(err.to_string()),
    }
    report
}

/// Renders a report for humans.
#[must_use]
pub fn format_pretty(report: &InspectReport) -> String {
    let mut out = format!(
        "{} stroke {} ({} bytes)\n",
        report.kind, report.stroke_id, report.bytes
    );
    // Writing to a String cannot fail.
    let _ = match &report.body {
        BodyReport::Begin {
            brush,
            eraser,
            color,
            size,
            seed,
        } => writeln!(
            out,
            "  brush: {brush}{} color: #{:02x}{:02x}{:02x}{:02x} size: {size} seed: {seed}",
            if *eraser { " (eraser)" } else { "" },
            color[0],
            color[1],
            color[2],
            color[3]
        ),
        BodyReport::Update {
            sequence,
            count,
            primary,
            redundant,
        } => {
            let _ = writeln!(out, "  sequence: {sequence} count: {count}");
            write_payload(&mut out, "primary", primary);
            write_payload(&mut out, "redundant", redundant);
            Ok(())
        }
        BodyReport::End {
            total_points,
            checksum,
        } => writeln!(out, "  total points: {total_points} checksum: {checksum}"),
        BodyReport::Abort => Ok(()),
    };
    out
}

fn write_payload(out: &mut String, label: &str, payload: &PayloadReport) {
    let points = payload
        .points
        .map_or_else(|| "n/a".to_string(), |points| points.to_string());
    let _ = write!(out, "  {label}: {} bytes, {points} points", payload.bytes);
    if let Some([x, y, pressure]) = payload.first_point {
        let _ = write!(out, ", starts at ({x}, {y}) pressure {pressure}");
    }
    if let Some(err) = &payload.error {
        let _ = write!(out, ", error: {err}");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::compress;
    use stroke::{BrushId, QuantizedPoint, Rgba, StrokeId};
    use wire::{encode_to_vec, BeginPacket, EndPacket, UpdatePacket};

    fn inspect(packet: &Packet<'_>) -> InspectReport {
        let bytes = encode_to_vec(packet).unwrap();
        inspect_packet(&bytes, &Limits::default(), &CodecLimits::default()).unwrap()
    }

    #[test]
    fn begin_report() {
        let report = inspect(&Packet::Begin(BeginPacket {
            stroke_id: StrokeId::new(9),
            brush: BrushId::ERASER,
            color: Rgba::from_channels(1, 2, 3, 4),
            size: 12.5,
            seed: 77,
        }));
        assert_eq!(report.kind, "begin");
        assert_eq!(report.stroke_id, 9);
        assert!(matches!(
            report.body,
            BodyReport::Begin {
                eraser: true,
                color: [1, 2, 3, 4],
                seed: 77,
                ..
            }
        ));
        assert!(format_pretty(&report).contains("(eraser)"));
    }

    #[test]
    fn first_update_shows_absolute_start() {
        let points = [
            QuantizedPoint::new(500, 600, 70),
            QuantizedPoint::new(502, 601, 71),
        ];
        let mut payload = [0u8; 32];
        let len = compress(STROKE_ORIGIN, &points, &mut payload);
        let report = inspect(&Packet::Update(UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence: 0,
            count: 2,
            payload: &payload[..len],
            redundant: &[],
        }));

        let BodyReport::Update {
            primary, redundant, ..
        } = &report.body
        else {
            panic!("expected update, got {:?}", report.body);
        };
        assert_eq!(primary.points, Some(2));
        assert_eq!(primary.first_point, Some([500, 600, 70]));
        assert_eq!(redundant.points, Some(0));
        assert!(format_pretty(&report).contains("starts at (500, 600)"));
    }

    #[test]
    fn truncated_payload_reports_error() {
        let report = inspect(&Packet::Update(UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence: 3,
            count: 1,
            payload: &[ESCAPE_MARKER, 1, 2],
            redundant: &[],
        }));
        let BodyReport::Update { primary, .. } = &report.body else {
            panic!("expected update");
        };
        assert_eq!(primary.points, None);
        assert!(primary.error.is_some());
    }

    #[test]
    fn end_report_json() {
        let report = inspect(&Packet::End(EndPacket {
            stroke_id: StrokeId::new(2),
            total_points: 40,
            checksum: 0xDEAD_BEEF,
        }));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "end");
        assert_eq!(json["body"]["type"], "end");
        assert_eq!(json["body"]["checksum"], "0xdeadbeef");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(inspect_packet(&[1, 2, 3], &Limits::default(), &CodecLimits::default()).is_err());
    }
}
