//! Outbound stroke streaming.

use std::collections::HashMap;

use codec::{compress_prefix, STROKE_ORIGIN};
use log::{debug, trace};
use stroke::{QuantizedPoint, StrokeAttrs, StrokeChecksum, StrokeId};

use crate::error::SendError;
use crate::limits::Limits;
use crate::packet::{AbortPacket, BeginPacket, EndPacket, UpdatePacket};
use crate::pool::PayloadPool;
use crate::transport::Transport;

/// Idle payload buffers kept by a sender.
const POOLED_BUFFERS: usize = 4;

/// Totals for one [`StrokeSender::push_points`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushStats {
    /// Update packets sent.
    pub updates: usize,
    /// Points sent.
    pub points: usize,
    /// Primary payload bytes sent.
    pub payload_bytes: usize,
}

#[derive(Debug)]
struct OutgoingStroke {
    next_sequence: u16,
    last_point: QuantizedPoint,
    previous_batch: Vec<u8>,
    checksum: StrokeChecksum,
    total_points: usize,
}

/// Streams local strokes as Begin, Update, End and Abort packets.
///
/// Each Update carries the previous Update's payload as redundancy so a
/// single lost packet can be rebuilt by the receiver.
#[derive(Debug)]
pub struct StrokeSender {
    limits: Limits,
    pool: PayloadPool,
    strokes: HashMap<StrokeId, OutgoingStroke>,
}

impl StrokeSender {
    /// Creates a sender.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        let pool = PayloadPool::new(limits.payload_capacity(), POOLED_BUFFERS);
        Self {
            limits,
            pool,
            strokes: HashMap::new(),
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the payload buffer pool.
    #[must_use]
    pub const fn pool(&self) -> &PayloadPool {
        &self.pool
    }

    /// Returns `true` if the stroke has begun and not yet ended or aborted.
    #[must_use]
    pub fn is_active(&self, id: StrokeId) -> bool {
        self.strokes.contains_key(&id)
    }

    /// Sends Begin for a new stroke.
    pub fn begin(
        &mut self,
        attrs: &StrokeAttrs,
        transport: &mut impl Transport,
    ) -> Result<(), SendError> {
        if self.strokes.contains_key(&attrs.id) {
            return Err(SendError::AlreadyStarted(attrs.id));
        }
        self.strokes.insert(
            attrs.id,
            OutgoingStroke {
                next_sequence: 0,
                last_point: STROKE_ORIGIN,
                previous_batch: Vec::new(),
                checksum: StrokeChecksum::new(),
                total_points: 0,
            },
        );
        transport.send_begin(&BeginPacket {
            stroke_id: attrs.id,
            brush: attrs.brush,
            color: attrs.color,
            size: attrs.size,
            seed: attrs.seed,
        });
        Ok(())
    }

    /// Compresses `points` into as many Updates as the limits require and sends them.
    ///
    /// A batch holds at most `max_batch_points` points; when compression
    /// runs out of payload space the remainder moves to the next batch.
    pub fn push_points(
        &mut self,
        id: StrokeId,
        points: &[QuantizedPoint],
        transport: &mut impl Transport,
    ) -> Result<PushStats, SendError> {
        let batch_points = self.limits.batch_points();
        let stroke = self
            .strokes
            .get_mut(&id)
            .ok_or(SendError::UnknownStroke(id))?;

        let total = stroke.total_points + points.len();
        if total > usize::from(u16::MAX) {
            return Err(SendError::TooManyPoints { stroke: id, total });
        }

        let mut stats = PushStats::default();
        let mut remaining = points;
        while !remaining.is_empty() {
            let batch = &remaining[..remaining.len().min(batch_points)];
            let mut buf = self.pool.acquire();
            let compressed = compress_prefix(stroke.last_point, batch, &mut buf);
            // The pool's buffers always hold at least one record.
            debug_assert!(compressed.points_written > 0);
            let written = &batch[..compressed.points_written];
            let payload = &buf[..compressed.bytes_written];

            transport.send_update(&UpdatePacket {
                stroke_id: id,
                sequence: stroke.next_sequence,
                count: written.len() as u8,
                payload,
                redundant: &stroke.previous_batch,
            });
            trace!(
                "stroke {} update {}: {} points in {} bytes",
                id.raw(),
                stroke.next_sequence,
                written.len(),
                payload.len()
            );

            stroke.previous_batch.clear();
            stroke.previous_batch.extend_from_slice(payload);
            stats.payload_bytes += payload.len();
            self.pool.release(buf);

            stroke.checksum.extend(written);
            stroke.last_point = written[written.len() - 1];
            stroke.total_points += written.len();
            stroke.next_sequence = stroke.next_sequence.wrapping_add(1);
            stats.updates += 1;
            stats.points += written.len();
            remaining = &remaining[written.len()..];
        }
        Ok(stats)
    }

    /// Sends End with the stroke's total and checksum and forgets the stroke.
    ///
    /// If any points were sent, End is preceded by a trailing Update with no
    /// points of its own whose redundant payload is the final batch.
    pub fn end(
        &mut self,
        id: StrokeId,
        transport: &mut impl Transport,
    ) -> Result<EndPacket, SendError> {
        let stroke = self
            .strokes
            .remove(&id)
            .ok_or(SendError::UnknownStroke(id))?;
        if !stroke.previous_batch.is_empty() {
            // Trailer: lets the receiver rebuild a lost final batch.
            transport.send_update(&UpdatePacket {
                stroke_id: id,
                sequence: stroke.next_sequence,
                count: 0,
                payload: &[],
                redundant: &stroke.previous_batch,
            });
        }
        let packet = EndPacket {
            stroke_id: id,
            // push_points keeps the total within u16.
            total_points: stroke.total_points as u16,
            checksum: stroke.checksum.value(),
        };
        transport.send_end(&packet);
        debug!(
            "stroke {} ended with {} points",
            id.raw(),
            packet.total_points
        );
        Ok(packet)
    }

    /// Sends Abort and forgets the stroke. Aborting an unknown stroke still sends.
    pub fn abort(&mut self, id: StrokeId, transport: &mut impl Transport) {
        if self.strokes.remove(&id).is_some() {
            debug!("stroke {} aborted", id.raw());
        }
        transport.send_abort(&AbortPacket { stroke_id: id });
    }
}
