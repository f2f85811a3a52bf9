//! Inbound stroke reassembly.

use std::collections::{HashMap, VecDeque};

use codec::{decompress_with_limits, CodecLimits, STROKE_ORIGIN};
use log::{debug, trace};
use stroke::{
    AuthorId, QuantizedPoint, SequenceAllocator, StrokeAttrs, StrokeBuilder, StrokeEntity,
    StrokeId, StrokeSnapshot,
};

use crate::error::{AssemblyFault, FaultKind};
use crate::limits::Limits;
use crate::packet::{BeginPacket, EndPacket, OwnedUpdate, Packet, UpdatePacket};

/// Sequence distances at or above this are behind the expected sequence.
const BEHIND: u16 = 0x8000;

/// What a packet did to the stroke it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveOutcome {
    /// Begin opened the stroke; `points` held Updates were applied with it.
    Started { points: usize },
    /// Points were appended in order.
    Applied { points: usize },
    /// Points were appended and at least one lost batch was rebuilt from
    /// redundancy.
    Recovered { points: usize, batches: usize },
    /// Update held until the packets before it arrive.
    Buffered,
    /// End arrived before all of the stroke's points.
    AwaitingUpdates { received: usize, declared: u16 },
    /// The stroke is complete and verified.
    Completed(StrokeEntity),
    /// The stroke was cancelled.
    Aborted,
    /// The packet had no effect.
    Ignored(IgnoreReason),
}

/// Why a packet had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Same Begin seen again.
    DuplicateBegin,
    /// Begin with different attributes for an open stroke.
    ConflictingBegin,
    /// Update already applied.
    StaleUpdate { sequence: u16 },
    /// Update already waiting in the reorder buffer.
    DuplicateUpdate { sequence: u16 },
    /// Same End seen again.
    DuplicateEnd,
    /// End disagreeing with an earlier End.
    ConflictingEnd,
    /// The stroke already ended, was aborted or was discarded.
    Closed(ClosedReason),
}

/// How a remembered stroke was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    Ended,
    Aborted,
    Faulted,
}

/// Counters kept by a [`StrokeAssembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Lost batches rebuilt from redundancy.
    pub recovered_batches: u64,
    /// Updates that arrived after they were already applied.
    pub stale_updates: u64,
    /// Updates parked in a reorder buffer.
    pub buffered_updates: u64,
    /// Strokes completed and verified.
    pub completed: u64,
    /// Strokes discarded after a fault.
    pub faults: u64,
}

#[derive(Debug, Default)]
struct IncomingStroke {
    open: Option<(BeginPacket, StrokeBuilder)>,
    next_sequence: u16,
    pending: Vec<OwnedUpdate>,
    end: Option<EndPacket>,
}

impl IncomingStroke {
    fn received(&self) -> usize {
        self.open
            .as_ref()
            .map_or(0, |(_, builder)| builder.points().len())
    }
}

#[derive(Debug, Clone, Copy)]
struct Applied {
    points: usize,
    recovered_batch: bool,
}

#[derive(Debug, Default)]
struct Progress {
    points: usize,
    batches_recovered: usize,
}

impl Progress {
    fn record(&mut self, applied: Applied, stats: &mut AssemblerStats) {
        self.points += applied.points;
        if applied.recovered_batch {
            self.batches_recovered += 1;
            stats.recovered_batches += 1;
        }
    }

    fn outcome(self) -> ReceiveOutcome {
        if self.batches_recovered > 0 {
            ReceiveOutcome::Recovered {
                points: self.points,
                batches: self.batches_recovered,
            }
        } else {
            ReceiveOutcome::Applied {
                points: self.points,
            }
        }
    }
}

/// Bounded memory of closed stroke ids, oldest forgotten first.
#[derive(Debug)]
struct ClosedStrokes {
    capacity: usize,
    order: VecDeque<StrokeId>,
    reasons: HashMap<StrokeId, ClosedReason>,
}

impl ClosedStrokes {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            reasons: HashMap::new(),
        }
    }

    fn get(&self, id: StrokeId) -> Option<ClosedReason> {
        self.reasons.get(&id).copied()
    }

    fn insert(&mut self, id: StrokeId, reason: ClosedReason) {
        if self.capacity == 0 {
            return;
        }
        if self.reasons.insert(id, reason).is_none() {
            self.order.push_back(id);
            if self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.reasons.remove(&oldest);
                }
            }
        }
    }
}

/// Rebuilds one remote author's strokes from their packets.
///
/// Applies Updates in sequence order, rebuilds a single lost Update from the
/// next one's redundant payload, parks out-of-order Updates in a bounded
/// buffer and verifies End against the received points. A stroke that
/// cannot be rebuilt exactly is discarded and reported as an
/// [`AssemblyFault`]; it is never handed out partially.
#[derive(Debug)]
pub struct StrokeAssembler {
    author: AuthorId,
    limits: Limits,
    codec_limits: CodecLimits,
    strokes: HashMap<StrokeId, IncomingStroke>,
    closed: ClosedStrokes,
    scratch: Vec<QuantizedPoint>,
    stats: AssemblerStats,
}

impl StrokeAssembler {
    /// Creates an assembler for packets from `author`.
    #[must_use]
    pub fn new(author: AuthorId, limits: Limits, codec_limits: CodecLimits) -> Self {
        let closed = ClosedStrokes::new(limits.remembered_closed);
        Self {
            author,
            limits,
            codec_limits,
            strokes: HashMap::new(),
            closed,
            scratch: Vec::new(),
            stats: AssemblerStats::default(),
        }
    }

    /// Author whose packets this assembler accepts.
    #[must_use]
    pub const fn author(&self) -> AuthorId {
        self.author
    }

    /// Returns the assembler counters.
    #[must_use]
    pub const fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Ids of strokes still being assembled, including ones whose Begin has
    /// not arrived.
    pub fn open_strokes(&self) -> impl Iterator<Item = StrokeId> + '_ {
        self.strokes.keys().copied()
    }

    /// Snapshot of a stroke still being assembled, for live rendering.
    #[must_use]
    pub fn snapshot(&self, id: StrokeId) -> Option<StrokeSnapshot> {
        self.strokes
            .get(&id)
            .and_then(|stroke| stroke.open.as_ref())
            .map(|(_, builder)| builder.snapshot())
    }

    /// Returns how a remembered stroke was closed.
    #[must_use]
    pub fn closed_reason(&self, id: StrokeId) -> Option<ClosedReason> {
        self.closed.get(id)
    }

    /// Feeds one packet. `sequences` orders newly begun strokes for rendering.
    pub fn receive(
        &mut self,
        packet: &Packet<'_>,
        sequences: &mut SequenceAllocator,
    ) -> Result<ReceiveOutcome, AssemblyFault> {
        let id = packet.stroke_id();
        if let Some(reason) = self.closed.get(id) {
            debug!(
                "ignoring {} for closed stroke {} ({reason:?})",
                packet.kind().name(),
                id.raw()
            );
            return Ok(ReceiveOutcome::Ignored(IgnoreReason::Closed(reason)));
        }

        match packet {
            Packet::Begin(begin) => self.on_begin(begin, sequences),
            Packet::Update(update) => self.on_update(update),
            Packet::End(end) => self.on_end(end),
            Packet::Abort(_) => Ok(self.on_abort(id)),
        }
    }

    /// Gives up on an open stroke, typically after a timeout.
    ///
    /// Returns the fault describing what was missing, or `None` if the
    /// stroke was not open.
    pub fn abandon(&mut self, id: StrokeId) -> Option<AssemblyFault> {
        let stroke = self.strokes.get(&id)?;
        let kind = FaultKind::Abandoned {
            received: stroke.received(),
            declared: stroke.end.map(|end| end.total_points),
        };
        Some(self.fail(id, kind))
    }

    fn on_begin(
        &mut self,
        begin: &BeginPacket,
        sequences: &mut SequenceAllocator,
    ) -> Result<ReceiveOutcome, AssemblyFault> {
        let id = begin.stroke_id;
        let stroke = self.strokes.entry(id).or_default();
        if let Some((existing, _)) = &stroke.open {
            let reason = if existing.same_attributes(begin) {
                IgnoreReason::DuplicateBegin
            } else {
                IgnoreReason::ConflictingBegin
            };
            debug!("ignoring begin for open stroke {}: {reason:?}", id.raw());
            return Ok(ReceiveOutcome::Ignored(reason));
        }

        let attrs = StrokeAttrs {
            id,
            author: self.author,
            brush: begin.brush,
            seed: begin.seed,
            color: begin.color,
            size: begin.size,
            sequence: sequences.allocate(),
        };
        stroke.open = Some((*begin, StrokeBuilder::new(attrs)));

        let mut progress = Progress::default();
        match self.advance(id, &mut progress)? {
            Some(entity) => Ok(ReceiveOutcome::Completed(entity)),
            None => Ok(ReceiveOutcome::Started {
                points: progress.points,
            }),
        }
    }

    fn on_update(&mut self, update: &UpdatePacket<'_>) -> Result<ReceiveOutcome, AssemblyFault> {
        let id = update.stroke_id;
        self.admit(id)?;
        let stroke = self.strokes.entry(id).or_default();

        if stroke.open.is_some() {
            let ahead = update.sequence.wrapping_sub(stroke.next_sequence);
            if ahead >= BEHIND {
                debug!(
                    "stale update {} for stroke {} (expected {})",
                    update.sequence,
                    id.raw(),
                    stroke.next_sequence
                );
                self.stats.stale_updates += 1;
                return Ok(ReceiveOutcome::Ignored(IgnoreReason::StaleUpdate {
                    sequence: update.sequence,
                }));
            }
            if ahead <= 1 {
                let mut progress = Progress::default();
                let applied =
                    apply_update(stroke, update, &self.codec_limits, &mut self.scratch);
                match applied {
                    Ok(applied) => progress.record(applied, &mut self.stats),
                    Err(kind) => return Err(self.fail(id, kind)),
                }
                return match self.advance(id, &mut progress)? {
                    Some(entity) => Ok(ReceiveOutcome::Completed(entity)),
                    None => Ok(progress.outcome()),
                };
            }
        }

        if stroke
            .pending
            .iter()
            .any(|held| held.sequence == update.sequence)
        {
            return Ok(ReceiveOutcome::Ignored(IgnoreReason::DuplicateUpdate {
                sequence: update.sequence,
            }));
        }
        if stroke.pending.len() >= self.limits.reorder_window {
            let kind = FaultKind::SequenceGap {
                expected: stroke.next_sequence,
                received: update.sequence,
            };
            return Err(self.fail(id, kind));
        }
        trace!(
            "holding update {} for stroke {} (expected {})",
            update.sequence,
            id.raw(),
            stroke.next_sequence
        );
        stroke.pending.push(OwnedUpdate::from(update));
        self.stats.buffered_updates += 1;
        Ok(ReceiveOutcome::Buffered)
    }

    fn on_end(&mut self, end: &EndPacket) -> Result<ReceiveOutcome, AssemblyFault> {
        let id = end.stroke_id;
        self.admit(id)?;
        let stroke = self.strokes.entry(id).or_default();
        match stroke.end {
            Some(existing) if existing == *end => {
                return Ok(ReceiveOutcome::Ignored(IgnoreReason::DuplicateEnd));
            }
            Some(_) => {
                debug!("ignoring conflicting end for stroke {}", id.raw());
                return Ok(ReceiveOutcome::Ignored(IgnoreReason::ConflictingEnd));
            }
            None => stroke.end = Some(*end),
        }
        let received = stroke.received();

        match self.check_end(id)? {
            Some(entity) => Ok(ReceiveOutcome::Completed(entity)),
            None => {
                debug!(
                    "end for stroke {} waiting on updates: {received} of {} points",
                    id.raw(),
                    end.total_points
                );
                Ok(ReceiveOutcome::AwaitingUpdates {
                    received,
                    declared: end.total_points,
                })
            }
        }
    }

    /// Makes room for a packet that arrived before its Begin.
    ///
    /// At most `max_unopened` such strokes are held; past that the newcomer
    /// is discarded as a desync.
    fn admit(&mut self, id: StrokeId) -> Result<(), AssemblyFault> {
        if self.strokes.contains_key(&id) {
            return Ok(());
        }
        let unopened = self
            .strokes
            .values()
            .filter(|stroke| stroke.open.is_none())
            .count();
        if unopened >= self.limits.max_unopened {
            return Err(self.fail(id, FaultKind::MissingBegin));
        }
        self.strokes.insert(id, IncomingStroke::default());
        Ok(())
    }

    fn on_abort(&mut self, id: StrokeId) -> ReceiveOutcome {
        if self.strokes.remove(&id).is_some() {
            debug!("stroke {} aborted", id.raw());
        }
        self.closed.insert(id, ClosedReason::Aborted);
        ReceiveOutcome::Aborted
    }

    /// Applies every held Update that has become applicable, then checks End.
    fn advance(
        &mut self,
        id: StrokeId,
        progress: &mut Progress,
    ) -> Result<Option<StrokeEntity>, AssemblyFault> {
        let Some(stroke) = self.strokes.get_mut(&id) else {
            return Ok(None);
        };
        if stroke.open.is_none() {
            return Ok(None);
        }

        let failure = loop {
            let expected = stroke.next_sequence;
            let before = stroke.pending.len();
            stroke
                .pending
                .retain(|held| held.sequence.wrapping_sub(expected) < BEHIND);
            self.stats.stale_updates += (before - stroke.pending.len()) as u64;

            let next = stroke
                .pending
                .iter()
                .position(|held| held.sequence == expected)
                .or_else(|| {
                    stroke
                        .pending
                        .iter()
                        .position(|held| held.sequence == expected.wrapping_add(1))
                });
            let Some(index) = next else {
                break None;
            };
            let held = stroke.pending.swap_remove(index);
            let update = held.as_packet();
            match apply_update(stroke, &update, &self.codec_limits, &mut self.scratch) {
                Ok(applied) => progress.record(applied, &mut self.stats),
                Err(kind) => break Some(kind),
            }
        };
        if let Some(kind) = failure {
            return Err(self.fail(id, kind));
        }
        self.check_end(id)
    }

    /// Verifies End once enough points are present.
    fn check_end(&mut self, id: StrokeId) -> Result<Option<StrokeEntity>, AssemblyFault> {
        let Some(stroke) = self.strokes.get(&id) else {
            return Ok(None);
        };
        let Some(end) = stroke.end else {
            return Ok(None);
        };
        if stroke.open.is_none() || stroke.received() < usize::from(end.total_points) {
            return Ok(None);
        }

        let Some((_, builder)) = self.strokes.remove(&id).and_then(|stroke| stroke.open) else {
            return Ok(None);
        };
        let actual = builder.points().len();
        if actual != usize::from(end.total_points) {
            return Err(self.fail(
                id,
                FaultKind::CountMismatch {
                    declared: end.total_points,
                    actual,
                },
            ));
        }
        let checksum = builder.checksum();
        if checksum != end.checksum {
            return Err(self.fail(
                id,
                FaultKind::ChecksumMismatch {
                    declared: end.checksum,
                    actual: checksum,
                },
            ));
        }

        self.closed.insert(id, ClosedReason::Ended);
        self.stats.completed += 1;
        debug!("stroke {} completed with {actual} points", id.raw());
        Ok(Some(builder.end()))
    }

    fn fail(&mut self, id: StrokeId, kind: FaultKind) -> AssemblyFault {
        self.strokes.remove(&id);
        self.closed.insert(id, ClosedReason::Faulted);
        self.stats.faults += 1;
        let fault = AssemblyFault::new(id, kind);
        debug!("discarding stroke from author {}: {fault}", self.author.raw());
        fault
    }
}

/// Applies `update`, which is either the expected batch or the one after it.
///
/// Nothing is appended unless both payloads decode cleanly.
fn apply_update(
    stroke: &mut IncomingStroke,
    update: &UpdatePacket<'_>,
    limits: &CodecLimits,
    scratch: &mut Vec<QuantizedPoint>,
) -> Result<Applied, FaultKind> {
    let Some((_, builder)) = stroke.open.as_mut() else {
        return Ok(Applied {
            points: 0,
            recovered_batch: false,
        });
    };
    let ahead = update.sequence.wrapping_sub(stroke.next_sequence);
    let mut origin = builder.last_point().unwrap_or(STROKE_ORIGIN);
    scratch.clear();

    let recovered_batch = ahead == 1;
    if recovered_batch {
        if !update.has_redundancy() {
            return Err(FaultKind::MissingRedundancy {
                sequence: update.sequence,
            });
        }
        let recovered = decompress_with_limits(origin, update.redundant, limits, scratch)
            .map_err(FaultKind::Payload)?;
        if let Some(&last) = scratch.last() {
            origin = last;
        }
        debug!(
            "rebuilt update {} of stroke {} from redundancy ({recovered} points)",
            stroke.next_sequence,
            update.stroke_id.raw()
        );
    } else if ahead != 0 {
        return Err(FaultKind::SequenceGap {
            expected: stroke.next_sequence,
            received: update.sequence,
        });
    }

    let decoded =
        decompress_with_limits(origin, update.payload, limits, scratch).map_err(FaultKind::Payload)?;
    if decoded != usize::from(update.count) {
        return Err(FaultKind::BatchCountMismatch {
            sequence: update.sequence,
            declared: update.count,
            decoded,
        });
    }

    builder.append_points(scratch.as_slice());
    stroke.next_sequence = update.sequence.wrapping_add(1);
    Ok(Applied {
        points: scratch.len(),
        recovered_batch,
    })
}
