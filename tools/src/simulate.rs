//! Deterministic two-peer loss simulation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use session::{DrawingSession, LocalEnd, SessionConfig, SessionNotice, StrokeStyle};
use stroke::{AuthorId, BrushId, QuantizedPoint, Rgba, StrokeKey};
use wire::{LoopbackTransport, LossPattern};

/// Author id of the drawing peer.
pub const SENDER: AuthorId = AuthorId::new(1);
/// Author id of the receiving peer.
pub const RECEIVER: AuthorId = AuthorId::new(2);

/// Points handed to the session per `push_points` call, like input events.
const INPUT_CHUNK: usize = 12;

/// Parameters for [`simulate`].
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub strokes: u32,
    pub points: u16,
    pub seed: u64,
    /// Drop every nth Update on the way to the receiver; 0 drops nothing.
    pub drop_every: u32,
    /// Every nth stroke is an eraser; 0 draws only ink.
    pub eraser_every: u32,
    pub config: SessionConfig,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            strokes: 32,
            points: 120,
            seed: 1,
            drop_every: 0,
            eraser_every: 4,
            config: SessionConfig::default(),
        }
    }
}

/// Totals printed by the `simulate` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    pub strokes: u32,
    pub points_per_stroke: u16,
    pub seed: u64,
    pub drop_every: u32,
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub bytes_delivered: u64,
    pub avg_packet_bytes: u64,
    pub recovered_batches: u64,
    /// Strokes the receiver completed.
    pub completed: u64,
    /// Completed strokes whose points match what was drawn.
    pub matched: u64,
    pub desyncs: u64,
    pub integrity_faults: u64,
    pub malformed: u64,
    pub erasers_committed: u64,
    pub erasers_discarded: u64,
    pub frames_captured: u64,
}

impl SimulationSummary {
    fn new(options: &SimulateOptions) -> Self {
        Self {
            strokes: options.strokes,
            points_per_stroke: options.points,
            seed: options.seed,
            drop_every: options.drop_every,
            ..Self::default()
        }
    }
}

/// Draws `options.strokes` random strokes on one session and streams them to
/// a second over a lossy loopback. Delivered frames are written to `capture`
/// when given.
pub fn simulate(options: &SimulateOptions, capture: Option<&Path>) -> Result<SimulationSummary> {
    if let Some(dir) = capture {
        fs::create_dir_all(dir).with_context(|| format!("create capture dir {}", dir.display()))?;
    }

    let (mut sender, _) = DrawingSession::new(
        SessionConfig {
            author: SENDER,
            ..options.config.clone()
        },
        LoopbackTransport::with_loss(LossPattern::DropEveryNthUpdate(options.drop_every)),
    );
    let (mut receiver, _) = DrawingSession::new(
        SessionConfig {
            author: RECEIVER,
            ..options.config.clone()
        },
        LoopbackTransport::new(),
    );

    let mut rng = Rng::new(options.seed);
    let mut summary = SimulationSummary::new(options);
    let mut drawn: HashMap<StrokeKey, Vec<QuantizedPoint>> = HashMap::new();
    let mut anchors: Vec<QuantizedPoint> = Vec::new();

    for index in 0..options.strokes {
        let is_eraser = options.eraser_every != 0 && (index + 1) % options.eraser_every == 0;
        // Erasers start on earlier ink half the time so some of them land.
        let start = match anchors.len() {
            0 => rng.point(),
            len if is_eraser && rng.next_u32() % 2 == 0 => anchors[rng.below(len)],
            _ => rng.point(),
        };
        let points = random_walk(&mut rng, start, options.points);
        let style = if is_eraser {
            StrokeStyle::eraser(12.0)
        } else {
            StrokeStyle::ink(
                BrushId::new(1 + (index % 4) as u16),
                Rgba::from_packed(rng.next_u32() | 0xFF),
                f32::from(2 + (rng.next_u32() % 10) as u16),
            )
            .with_seed(rng.next_u32())
        };

        let id = sender.begin_stroke(style)?;
        for chunk in points.chunks(INPUT_CHUNK) {
            sender.push_points(id, chunk)?;
        }
        match sender.end_stroke(id)? {
            LocalEnd::Committed(key) => {
                if is_eraser {
                    summary.erasers_committed += 1;
                } else if let Some(anchor) = points.get(points.len() / 2) {
                    anchors.push(*anchor);
                }
                drawn.insert(key, points);
            }
            LocalEnd::Discarded => summary.erasers_discarded += 1,
        }
        relay(&mut sender, &mut receiver, capture, &mut summary)?;
    }

    // No more packets are coming; whatever is still open never completes.
    for snapshot in receiver.in_progress() {
        debug!("abandoning stroke {}", snapshot.attrs.id.raw());
        receiver.abandon_stroke(snapshot.attrs.key());
    }

    for notice in receiver.take_notices() {
        match notice {
            SessionNotice::Desync { .. } => summary.desyncs += 1,
            SessionNotice::IntegrityFault { .. } => summary.integrity_faults += 1,
            SessionNotice::MalformedPacket { .. } => summary.malformed += 1,
            _ => {}
        }
    }
    summary.matched = drawn
        .iter()
        .filter(|(key, points)| {
            receiver
                .stroke(**key)
                .is_some_and(|stroke| stroke.points() == points.as_slice())
        })
        .count() as u64;
    summary.completed = receiver.stats().completed;
    summary.recovered_batches = receiver
        .assembler_stats(SENDER)
        .map_or(0, |stats| stats.recovered_batches);

    let transport = sender.transport().stats();
    summary.packets_sent = transport.sent;
    summary.packets_dropped = transport.dropped;
    summary.bytes_delivered = transport.bytes;
    let delivered = transport.sent - transport.dropped;
    if delivered > 0 {
        summary.avg_packet_bytes = transport.bytes / delivered;
    }
    info!(
        "simulated {} strokes: {} completed, {} desyncs",
        summary.strokes, summary.completed, summary.desyncs
    );
    Ok(summary)
}

fn relay(
    sender: &mut DrawingSession<LoopbackTransport>,
    receiver: &mut DrawingSession<LoopbackTransport>,
    capture: Option<&Path>,
    summary: &mut SimulationSummary,
) -> Result<()> {
    sender.transport_mut().flush();
    for frame in sender.transport_mut().drain_frames() {
        if let Some(dir) = capture {
            let path = dir.join(format!("frame_{:06}.bin", summary.frames_captured));
            fs::write(&path, &frame).with_context(|| format!("write {}", path.display()))?;
            summary.frames_captured += 1;
        }
        receiver.receive_packet(SENDER, &frame);
    }
    Ok(())
}

fn random_walk(rng: &mut Rng, start: QuantizedPoint, len: u16) -> Vec<QuantizedPoint> {
    let max = i64::from(u16::MAX);
    let mut x = i64::from(start.x);
    let mut y = i64::from(start.y);
    let mut pressure = i64::from(start.pressure);
    let mut points = Vec::with_capacity(usize::from(len));
    for _ in 0..len {
        points.push(QuantizedPoint::new(
            u16::try_from(x).unwrap_or(u16::MAX),
            u16::try_from(y).unwrap_or(u16::MAX),
            u8::try_from(pressure).unwrap_or(u8::MAX),
        ));
        // Occasional flick, too far for a delta record.
        let reach = if rng.next_u32() % 64 == 0 { 400 } else { 6 };
        x = (x + rng.range_i64(-reach, reach)).clamp(0, max);
        y = (y + rng.range_i64(-reach, reach)).clamp(0, max);
        pressure = (pressure + rng.range_i64(-4, 4)).clamp(0, 255);
    }
    points
}

struct Rng {
    state: u64,
}

impl Rng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    #[allow(clippy::cast_possible_wrap)]
    fn range_i64(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min).unsigned_abs().max(1) + 1;
        let value = u64::from(self.next_u32()) % span;
        min + value as i64
    }

    fn below(&mut self, len: usize) -> usize {
        self.next_u32() as usize % len.max(1)
    }

    fn point(&mut self) -> QuantizedPoint {
        let x = self.range_i64(2_000, 63_000);
        let y = self.range_i64(2_000, 63_000);
        QuantizedPoint::new(
            u16::try_from(x).unwrap_or(u16::MAX),
            u16::try_from(y).unwrap_or(u16::MAX),
            128,
        )
    }
}
