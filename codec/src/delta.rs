//! Delta compression of ordered point sequences.
//!
//! Each point is written relative to the one before it:
//!
//! ```text
//! delta record:  [dx: i8, dy: i8, pressure: u8]                      3 bytes
//! escape record: [0x80, x: u16 le, y: u16 le, pressure: u8]         6 bytes
//! ```
//!
//! `dx`/`dy` use `-127..=127`; `0x80` (`i8::MIN`) in the first lane marks an
//! escape carrying absolute coordinates. The point after an escape is
//! encoded relative to the escaped point.

use bytestream::{ByteReader, ByteWriter};
use stroke::QuantizedPoint;

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;

/// Size of a delta record in bytes.
pub const DELTA_RECORD_LEN: usize = 3;

/// Size of an escape record in bytes.
pub const ESCAPE_RECORD_LEN: usize = 6;

/// Largest record; `points.len() * MAX_RECORD_LEN` bounds any payload.
pub const MAX_RECORD_LEN: usize = ESCAPE_RECORD_LEN;

/// First byte of an escape record.
pub const ESCAPE_MARKER: u8 = 0x80;

const DELTA_MIN: i32 = -127;
const DELTA_MAX: i32 = 127;

/// Origin shared by sender and receiver for a stroke's first batch.
///
/// A receiver cannot know the first point in advance, so the first batch is
/// encoded against the canvas corner.
pub const STROKE_ORIGIN: QuantizedPoint = QuantizedPoint::new(0, 0, 0);

/// Outcome of a bounded compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compressed {
    /// Bytes written to the output buffer.
    pub bytes_written: usize,
    /// Leading points fully encoded.
    pub points_written: usize,
}

impl Compressed {
    /// Returns `true` if every input point was written.
    #[must_use]
    pub const fn is_complete(&self, total_points: usize) -> bool {
        self.points_written == total_points
    }
}

/// Compresses `points` relative to `origin` into `out`.
///
/// Never writes past `out.len()`. When `out` fills up, stops after the last
/// whole record and returns the bytes written so far; callers detect
/// truncation by comparing against [`encoded_len`].
pub fn compress(origin: QuantizedPoint, points: &[QuantizedPoint], out: &mut [u8]) -> usize {
    compress_prefix(origin, points, out).bytes_written
}

/// Like [`compress`], also reporting how many points fit.
pub fn compress_prefix(
    origin: QuantizedPoint,
    points: &[QuantizedPoint],
    out: &mut [u8],
) -> Compressed {
    let mut writer = ByteWriter::new(out);
    let mut prev = origin;
    let mut points_written = 0;

    for &point in points {
        let (record, len) = encode_record(prev, point);
        if writer.write_bytes(&record[..len]).is_err() {
            break;
        }
        prev = point;
        points_written += 1;
    }

    Compressed {
        bytes_written: writer.finish(),
        points_written,
    }
}

/// Exact number of bytes needed to compress all of `points`.
#[must_use]
pub fn encoded_len(origin: QuantizedPoint, points: &[QuantizedPoint]) -> usize {
    let mut prev = origin;
    let mut len = 0;
    for &point in points {
        len += record_len(prev, point);
        prev = point;
    }
    len
}

/// Decompresses `buf` relative to `origin`, appending to `out`.
///
/// Returns the number of points appended. On error nothing is appended.
pub fn decompress(
    origin: QuantizedPoint,
    buf: &[u8],
    out: &mut Vec<QuantizedPoint>,
) -> CodecResult<usize> {
    decompress_with_limits(origin, buf, &CodecLimits::unlimited(), out)
}

/// Decompresses `buf`, rejecting payloads with more points than `limits` allow.
pub fn decompress_with_limits(
    origin: QuantizedPoint,
    buf: &[u8],
    limits: &CodecLimits,
    out: &mut Vec<QuantizedPoint>,
) -> CodecResult<usize> {
    let start_len = out.len();
    let result = decode_records(origin, buf, limits, out);
    if result.is_err() {
        out.truncate(start_len);
    }
    result
}

fn decode_records(
    origin: QuantizedPoint,
    buf: &[u8],
    limits: &CodecLimits,
    out: &mut Vec<QuantizedPoint>,
) -> CodecResult<usize> {
    let mut reader = ByteReader::new(buf);
    let mut prev = origin;
    let mut count = 0usize;

    while let Some(marker) = reader.peek_u8() {
        if count >= limits.max_points_per_payload {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::PointsPerPayload,
                limit: limits.max_points_per_payload,
                actual: count + 1,
            });
        }

        let offset = reader.position();
        let needed = if marker == ESCAPE_MARKER {
            ESCAPE_RECORD_LEN
        } else {
            DELTA_RECORD_LEN
        };
        if reader.remaining() < needed {
            return Err(CodecError::TruncatedRecord {
                offset,
                needed,
                available: reader.remaining(),
            });
        }

        let point = read_record(&mut reader, prev, offset)?;
        out.push(point);
        prev = point;
        count += 1;
    }

    Ok(count)
}

// Length was checked by the caller, so the reads below cannot run short.
fn read_record(
    reader: &mut ByteReader<'_>,
    prev: QuantizedPoint,
    offset: usize,
) -> CodecResult<QuantizedPoint> {
    let truncated = |_: bytestream::ByteError| CodecError::TruncatedRecord {
        offset,
        needed: DELTA_RECORD_LEN,
        available: 0,
    };

    if reader.peek_u8() == Some(ESCAPE_MARKER) {
        reader.read_u8().map_err(truncated)?;
        let x = reader.read_u16().map_err(truncated)?;
        let y = reader.read_u16().map_err(truncated)?;
        let pressure = reader.read_u8().map_err(truncated)?;
        return Ok(QuantizedPoint::new(x, y, pressure));
    }

    let dx = reader.read_i8().map_err(truncated)?;
    let dy = reader.read_i8().map_err(truncated)?;
    let pressure = reader.read_u8().map_err(truncated)?;
    let x = i32::from(prev.x) + i32::from(dx);
    let y = i32::from(prev.y) + i32::from(dy);
    match (u16::try_from(x), u16::try_from(y)) {
        (Ok(x), Ok(y)) => Ok(QuantizedPoint::new(x, y, pressure)),
        _ => Err(CodecError::CoordinateOutOfRange { offset, x, y }),
    }
}

fn delta_fits(prev: QuantizedPoint, point: QuantizedPoint) -> Option<(i8, i8)> {
    let dx = i32::from(point.x) - i32::from(prev.x);
    let dy = i32::from(point.y) - i32::from(prev.y);
    if (DELTA_MIN..=DELTA_MAX).contains(&dx) && (DELTA_MIN..=DELTA_MAX).contains(&dy) {
        Some((dx as i8, dy as i8))
    } else {
        None
    }
}

fn record_len(prev: QuantizedPoint, point: QuantizedPoint) -> usize {
    if delta_fits(prev, point).is_some() {
        DELTA_RECORD_LEN
    } else {
        ESCAPE_RECORD_LEN
    }
}

#[allow(clippy::cast_sign_loss)]
fn encode_record(prev: QuantizedPoint, point: QuantizedPoint) -> ([u8; MAX_RECORD_LEN], usize) {
    let mut record = [0u8; MAX_RECORD_LEN];
    if let Some((dx, dy)) = delta_fits(prev, point) {
        record[0] = dx as u8;
        record[1] = dy as u8;
        record[2] = point.pressure;
        (record, DELTA_RECORD_LEN)
    } else {
        let [x0, x1] = point.x.to_le_bytes();
        let [y0, y1] = point.y.to_le_bytes();
        record = [ESCAPE_MARKER, x0, x1, y0, y1, point.pressure];
        (record, ESCAPE_RECORD_LEN)
    }
}
