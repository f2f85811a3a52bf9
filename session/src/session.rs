//! The drawing session.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info, warn};
use spatial::{render_order, EraserEngine};
use stroke::{
    AuthorId, BrushId, QuantizedPoint, Rgba, SequenceAllocator, StrokeAttrs, StrokeBuilder,
    StrokeEntity, StrokeId, StrokeKey, StrokeSnapshot,
};
use wire::{
    decode_packet, AssemblerStats, AssemblyFault, PushStats, ReceiveOutcome, SendError,
    StrokeAssembler, StrokeSender, Transport,
};

use crate::config::SessionConfig;
use crate::event::{SessionEvent, SessionHandle, SessionNotice};

/// Brush settings for a new local stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub brush: BrushId,
    pub color: Rgba,
    /// Brush diameter in logical units.
    pub size: f32,
    pub seed: u32,
}

impl StrokeStyle {
    #[must_use]
    pub fn ink(brush: BrushId, color: Rgba, size: f32) -> Self {
        Self {
            brush,
            color,
            size,
            seed: 0,
        }
    }

    #[must_use]
    pub fn eraser(size: f32) -> Self {
        Self {
            brush: BrushId::ERASER,
            color: Rgba::BLACK,
            size,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }
}

/// How [`DrawingSession::end_stroke`] finished a local stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEnd {
    /// End was sent and the stroke is on the canvas.
    Committed(StrokeKey),
    /// An eraser that touched no active ink; Abort was sent instead of End.
    Discarded,
}

/// Counters kept by a [`DrawingSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Remote packets handled, malformed ones included.
    pub packets: u64,
    pub malformed: u64,
    /// Strokes committed, local and remote.
    pub completed: u64,
    /// Remote strokes discarded after a desync or integrity fault.
    pub faults: u64,
    /// Local erasers aborted for touching nothing.
    pub discarded_erasers: u64,
    pub removed: u64,
}

/// Owns every stroke on one participant's canvas.
///
/// Local strokes are drawn through [`DrawingSession::begin_stroke`],
/// [`DrawingSession::push_points`] and [`DrawingSession::end_stroke`], which
/// stream packets on the transport. Remote packets arrive through the event
/// queue (or [`DrawingSession::receive_packet`]) and are reassembled per
/// author. Ended strokes go into the eraser index and the active set; a
/// local eraser that touches no active ink is aborted instead of ended.
pub struct DrawingSession<T> {
    config: SessionConfig,
    transport: T,
    events: Receiver<SessionEvent>,
    sender: StrokeSender,
    assemblers: HashMap<AuthorId, StrokeAssembler>,
    sequences: SequenceAllocator,
    next_local_id: u32,
    drawing: HashMap<StrokeId, StrokeBuilder>,
    strokes: HashMap<StrokeKey, StrokeEntity>,
    active: HashSet<StrokeKey>,
    eraser: EraserEngine,
    verdicts: HashMap<StrokeKey, bool>,
    notices: Vec<SessionNotice>,
    stats: SessionStats,
    stopped: bool,
}

impl<T: Transport> DrawingSession<T> {
    /// Creates a session and the handle producers use to feed it.
    pub fn new(config: SessionConfig, transport: T) -> (Self, SessionHandle) {
        let (tx, rx) = match config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity),
            None => crossbeam_channel::unbounded(),
        };
        let session = Self {
            sender: StrokeSender::new(config.wire.clone()),
            eraser: EraserEngine::new(config.quadtree, config.hit_test),
            config,
            transport,
            events: rx,
            assemblers: HashMap::new(),
            sequences: SequenceAllocator::new(),
            next_local_id: 0,
            drawing: HashMap::new(),
            strokes: HashMap::new(),
            active: HashSet::new(),
            verdicts: HashMap::new(),
            notices: Vec::new(),
            stats: SessionStats::default(),
            stopped: false,
        };
        (session, SessionHandle::new(tx))
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Reassembly counters for one remote author.
    #[must_use]
    pub fn assembler_stats(&self, author: AuthorId) -> Option<AssemblerStats> {
        self.assemblers.get(&author).map(StrokeAssembler::stats)
    }

    /// Returns `true` once a Shutdown event was handled.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Handles every queued event without blocking. Returns how many.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while !self.stopped {
            match self.events.try_recv() {
                Ok(event) => {
                    handled += 1;
                    if self.handle(event).is_break() {
                        self.stopped = true;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Handles events until Shutdown arrives or every handle is dropped.
    pub fn run(&mut self) -> usize {
        let mut handled = 0;
        while !self.stopped {
            let Ok(event) = self.events.recv() else {
                debug!("all session handles dropped");
                break;
            };
            handled += 1;
            if self.handle(event).is_break() {
                self.stopped = true;
            }
        }
        info!("session loop stopped after {handled} events");
        handled
    }

    fn handle(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Packet { from, bytes } => self.receive_packet(from, &bytes),
            SessionEvent::Abandon(key) => self.abandon_stroke(key),
            SessionEvent::Remove(key) => {
                self.remove_stroke(key);
            }
            SessionEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Decodes and applies one packet from `from`.
    pub fn receive_packet(&mut self, from: AuthorId, bytes: &[u8]) {
        self.stats.packets += 1;
        if from == self.config.author {
            debug!("ignoring packet echoed from local author {}", from.raw());
            return;
        }
        let packet = match decode_packet(bytes, &self.config.wire) {
            Ok(packet) => packet,
            Err(error) => {
                warn!("malformed packet from author {}: {error}", from.raw());
                self.stats.malformed += 1;
                self.notices.push(SessionNotice::MalformedPacket {
                    author: from,
                    error,
                });
                return;
            }
        };

        let key = StrokeKey::new(from, packet.stroke_id());
        let assembler = self.assemblers.entry(from).or_insert_with(|| {
            StrokeAssembler::new(from, self.config.wire.clone(), self.config.codec.clone())
        });
        match assembler.receive(&packet, &mut self.sequences) {
            Ok(ReceiveOutcome::Completed(stroke)) => self.commit(stroke),
            Ok(ReceiveOutcome::Recovered { batches, .. }) => {
                debug!(
                    "recovered {batches} lost batch(es) for stroke {} of author {}",
                    key.stroke.raw(),
                    from.raw()
                );
            }
            Ok(ReceiveOutcome::Aborted) => self.notices.push(SessionNotice::StrokeAborted(key)),
            Ok(_) => {}
            Err(fault) => self.report_fault(from, fault),
        }
    }

    /// Gives up on a remote stroke still being assembled.
    pub fn abandon_stroke(&mut self, key: StrokeKey) {
        let fault = self
            .assemblers
            .get_mut(&key.author)
            .and_then(|assembler| assembler.abandon(key.stroke));
        if let Some(fault) = fault {
            self.report_fault(key.author, fault);
        }
    }

    fn report_fault(&mut self, author: AuthorId, fault: AssemblyFault) {
        self.stats.faults += 1;
        if fault.is_desync() {
            warn!("desync from author {}: {fault}", author.raw());
            self.notices.push(SessionNotice::Desync { author, fault });
        } else {
            warn!("integrity fault from author {}: {fault}", author.raw());
            self.notices
                .push(SessionNotice::IntegrityFault { author, fault });
        }
    }

    /// Starts a local stroke and sends its Begin.
    pub fn begin_stroke(&mut self, style: StrokeStyle) -> Result<StrokeId, SendError> {
        let id = StrokeId::new(self.next_local_id);
        let attrs = StrokeAttrs {
            id,
            author: self.config.author,
            brush: style.brush,
            seed: style.seed,
            color: style.color,
            size: style.size,
            sequence: self.sequences.allocate(),
        };
        self.sender.begin(&attrs, &mut self.transport)?;
        self.next_local_id = self.next_local_id.wrapping_add(1);
        self.drawing.insert(id, StrokeBuilder::new(attrs));
        Ok(id)
    }

    /// Appends points to a local stroke and streams them.
    pub fn push_points(
        &mut self,
        id: StrokeId,
        points: &[QuantizedPoint],
    ) -> Result<PushStats, SendError> {
        let builder = self
            .drawing
            .get_mut(&id)
            .ok_or(SendError::UnknownStroke(id))?;
        let stats = self
            .sender
            .push_points(id, points, &mut self.transport)?;
        builder.append_points(points);
        Ok(stats)
    }

    /// Ends a local stroke.
    ///
    /// An eraser that touches no active ink is aborted rather than ended so
    /// collaborators never store it.
    pub fn end_stroke(&mut self, id: StrokeId) -> Result<LocalEnd, SendError> {
        let builder = self
            .drawing
            .remove(&id)
            .ok_or(SendError::UnknownStroke(id))?;
        let stroke = builder.end();
        if stroke.attrs().is_eraser()
            && !self.eraser.is_eraser_stroke_effective(&stroke, &self.active)
        {
            debug!("eraser {} touched nothing, aborting", id.raw());
            self.sender.abort(id, &mut self.transport);
            self.stats.discarded_erasers += 1;
            self.notices
                .push(SessionNotice::EraserDiscarded(stroke.key()));
            return Ok(LocalEnd::Discarded);
        }
        self.sender.end(id, &mut self.transport)?;
        let key = stroke.key();
        self.commit(stroke);
        Ok(LocalEnd::Committed(key))
    }

    /// Cancels a local stroke. Idempotent.
    pub fn abort_stroke(&mut self, id: StrokeId) {
        self.drawing.remove(&id);
        self.sender.abort(id, &mut self.transport);
    }

    fn commit(&mut self, stroke: StrokeEntity) {
        let key = stroke.key();
        let eraser_effective = if stroke.attrs().is_eraser() {
            let effective = self.eraser.is_eraser_stroke_effective(&stroke, &self.active);
            self.verdicts.insert(key, effective);
            Some(effective)
        } else {
            self.eraser.insert(&stroke);
            None
        };
        debug!(
            "committed stroke {} of author {} ({} points)",
            key.stroke.raw(),
            key.author.raw(),
            stroke.points().len()
        );
        self.active.insert(key);
        self.strokes.insert(key, stroke);
        self.stats.completed += 1;
        self.notices.push(SessionNotice::StrokeCompleted {
            key,
            eraser_effective,
        });
    }

    /// Removes an ended stroke from the canvas, the index and the active set.
    pub fn remove_stroke(&mut self, key: StrokeKey) -> Option<StrokeEntity> {
        let stroke = self.strokes.remove(&key)?;
        self.active.remove(&key);
        self.eraser.remove(&key);
        self.verdicts.remove(&key);
        self.stats.removed += 1;
        debug!(
            "removed stroke {} of author {}",
            key.stroke.raw(),
            key.author.raw()
        );
        Some(stroke)
    }

    /// Returns the ended stroke stored under `key`.
    #[must_use]
    pub fn stroke(&self, key: StrokeKey) -> Option<&StrokeEntity> {
        self.strokes.get(&key)
    }

    /// Whether the ended eraser `key` touched active ink when it completed.
    ///
    /// `false` for unknown keys and for ink strokes.
    #[must_use]
    pub fn is_eraser_effective(&self, key: StrokeKey) -> bool {
        self.verdicts.get(&key).copied().unwrap_or(false)
    }

    /// Keys of strokes currently on the canvas.
    pub fn active_strokes(&self) -> impl Iterator<Item = StrokeKey> + '_ {
        self.active.iter().copied()
    }

    /// Snapshots of ended strokes in drawing order.
    #[must_use]
    pub fn render_order(&self) -> Vec<StrokeSnapshot> {
        render_order(self.strokes.values())
            .into_iter()
            .map(StrokeEntity::snapshot)
            .collect()
    }

    /// Snapshots of strokes still being drawn, local and remote, by sequence.
    #[must_use]
    pub fn in_progress(&self) -> Vec<StrokeSnapshot> {
        let mut snapshots: Vec<_> = self
            .drawing
            .values()
            .map(StrokeBuilder::snapshot)
            .chain(self.assemblers.values().flat_map(|assembler| {
                assembler
                    .open_strokes()
                    .filter_map(move |id| assembler.snapshot(id))
            }))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.attrs.sequence);
        snapshots
    }

    /// Keys of every remote stroke still being assembled, including ones
    /// whose Begin has not arrived. An outer timeout abandons these.
    #[must_use]
    pub fn open_remote_strokes(&self) -> Vec<StrokeKey> {
        let mut keys: Vec<StrokeKey> = self
            .assemblers
            .values()
            .flat_map(|assembler| {
                assembler
                    .open_strokes()
                    .map(move |id| StrokeKey::new(assembler.author(), id))
            })
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Takes the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.notices)
    }
}
