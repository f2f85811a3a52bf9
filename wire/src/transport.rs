//! Transport seam and an in-process loopback.

use std::collections::VecDeque;
use std::fmt;

use log::{trace, warn};

use crate::packet::{
    encode_to_vec, AbortPacket, BeginPacket, EndPacket, OwnedPacket, Packet, UpdatePacket,
};

/// Outbound packet sink.
///
/// Sends are fire-and-forget. Borrowed payloads are only valid for the
/// duration of the call; an implementation that keeps them must copy.
pub trait Transport {
    fn send_begin(&mut self, packet: &BeginPacket);
    fn send_update(&mut self, packet: &UpdatePacket<'_>);
    fn send_end(&mut self, packet: &EndPacket);
    fn send_abort(&mut self, packet: &AbortPacket);
}

/// Deterministic loss and reordering applied by [`LoopbackTransport`].
///
/// Only Update packets are affected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LossPattern {
    /// Deliver everything in order.
    #[default]
    None,
    /// Drop every nth Update (the nth, 2nth, ...). Zero drops nothing.
    DropEveryNthUpdate(u32),
    /// Drop Updates with these sequence numbers, for every stroke.
    DropSequences(Vec<u16>),
    /// Swap each pair of consecutive Updates.
    SwapAdjacentUpdates,
}

/// Counters kept by [`LoopbackTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Packets handed to the transport.
    pub sent: u64,
    /// Packets dropped by the loss pattern.
    pub dropped: u64,
    /// Bytes queued for delivery.
    pub bytes: u64,
}

type Listener = Box<dyn FnMut(&OwnedPacket) + Send>;

/// Transport that queues encoded packets in memory.
///
/// Every packet is encoded into a fresh buffer before it is queued or shown
/// to the listener, so nothing refers to the sender's pooled buffers once the
/// send call returns.
#[derive(Default)]
pub struct LoopbackTransport {
    loss: LossPattern,
    updates_seen: u64,
    held: Option<(Vec<u8>, OwnedPacket)>,
    frames: VecDeque<Vec<u8>>,
    listener: Option<Listener>,
    stats: LoopbackStats,
}

impl LoopbackTransport {
    /// Creates a lossless loopback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loopback applying `loss`.
    #[must_use]
    pub fn with_loss(loss: LossPattern) -> Self {
        Self {
            loss,
            ..Self::default()
        }
    }

    /// Installs a callback invoked with a detached copy of every delivered packet.
    pub fn set_listener(&mut self, listener: impl FnMut(&OwnedPacket) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Pops the oldest queued frame.
    pub fn pop_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Takes every queued frame, oldest first.
    ///
    /// A reordered Update still waiting for its partner stays held.
    pub fn drain_frames(&mut self) -> Vec<Vec<u8>> {
        self.frames.drain(..).collect()
    }

    /// Releases any Update held back for reordering.
    pub fn flush(&mut self) {
        if let Some((bytes, owned)) = self.held.take() {
            self.deliver(bytes, &owned);
        }
    }

    /// Number of frames waiting.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.frames.len()
    }

    /// Returns the transport counters.
    #[must_use]
    pub const fn stats(&self) -> LoopbackStats {
        self.stats
    }

    fn send(&mut self, packet: &Packet<'_>) {
        self.stats.sent += 1;
        let is_update = matches!(packet, Packet::Update(_));
        if is_update {
            self.updates_seen += 1;
            if self.should_drop(packet) {
                trace!(
                    "loopback dropped {} for stroke {}",
                    packet.kind().name(),
                    packet.stroke_id().raw()
                );
                self.stats.dropped += 1;
                return;
            }
        }

        let bytes = match encode_to_vec(packet) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("loopback failed to encode packet: {err}");
                self.stats.dropped += 1;
                return;
            }
        };
        let owned = packet.to_owned_packet();

        if self.loss == LossPattern::SwapAdjacentUpdates && is_update {
            match self.held.take() {
                Some((held_bytes, held_owned)) => {
                    self.deliver(bytes, &owned);
                    self.deliver(held_bytes, &held_owned);
                }
                None => self.held = Some((bytes, owned)),
            }
            return;
        }

        self.flush();
        self.deliver(bytes, &owned);
    }

    fn should_drop(&self, packet: &Packet<'_>) -> bool {
        match (&self.loss, packet) {
            (LossPattern::DropEveryNthUpdate(n), _) => {
                *n != 0 && self.updates_seen % u64::from(*n) == 0
            }
            (LossPattern::DropSequences(sequences), Packet::Update(update)) => {
                sequences.contains(&update.sequence)
            }
            _ => false,
        }
    }

    fn deliver(&mut self, bytes: Vec<u8>, owned: &OwnedPacket) {
        self.stats.bytes += bytes.len() as u64;
        if let Some(listener) = self.listener.as_mut() {
            listener(owned);
        }
        self.frames.push_back(bytes);
    }
}

impl fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("loss", &self.loss)
            .field("queued", &self.frames.len())
            .field("held", &self.held.is_some())
            .field("has_listener", &self.listener.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Transport for LoopbackTransport {
    fn send_begin(&mut self, packet: &BeginPacket) {
        self.send(&Packet::Begin(*packet));
    }

    fn send_update(&mut self, packet: &UpdatePacket<'_>) {
        self.send(&Packet::Update(*packet));
    }

    fn send_end(&mut self, packet: &EndPacket) {
        self.send(&Packet::End(*packet));
    }

    fn send_abort(&mut self, packet: &AbortPacket) {
        self.send(&Packet::Abort(*packet));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use stroke::StrokeId;

    use super::*;
    use crate::limits::Limits;
    use crate::packet::decode_packet;

    fn update(sequence: u16, payload: &[u8]) -> UpdatePacket<'_> {
        UpdatePacket {
            stroke_id: StrokeId::new(1),
            sequence,
            count: 1,
            payload,
            redundant: &[],
        }
    }

    fn sequences(frames: &[Vec<u8>]) -> Vec<u16> {
        frames
            .iter()
            .filter_map(|frame| match decode_packet(frame, &Limits::default()) {
                Ok(Packet::Update(update)) => Some(update.sequence),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn lossless_delivers_in_order() {
        let mut transport = LoopbackTransport::new();
        for seq in 0..4 {
            transport.send_update(&update(seq, &[seq as u8]));
        }
        assert_eq!(sequences(&transport.drain_frames()), vec![0, 1, 2, 3]);
        assert_eq!(transport.stats().sent, 4);
        assert_eq!(transport.stats().dropped, 0);
    }

    #[test]
    fn drop_every_nth_update() {
        let mut transport = LoopbackTransport::with_loss(LossPattern::DropEveryNthUpdate(3));
        for seq in 0..6 {
            transport.send_update(&update(seq, &[1]));
        }
        assert_eq!(sequences(&transport.drain_frames()), vec![0, 1, 3, 4]);
        assert_eq!(transport.stats().dropped, 2);
    }

    #[test]
    fn drop_sequences_leaves_other_packets() {
        let mut transport = LoopbackTransport::with_loss(LossPattern::DropSequences(vec![1]));
        transport.send_abort(&AbortPacket {
            stroke_id: StrokeId::new(1),
        });
        transport.send_update(&update(0, &[1]));
        transport.send_update(&update(1, &[1]));
        let frames = transport.drain_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(sequences(&frames), vec![0]);
    }

    #[test]
    fn swap_adjacent_updates() {
        let mut transport = LoopbackTransport::with_loss(LossPattern::SwapAdjacentUpdates);
        for seq in 0..5 {
            transport.send_update(&update(seq, &[1]));
        }
        assert_eq!(transport.queued(), 4);
        transport.send_end(&EndPacket {
            stroke_id: StrokeId::new(1),
            total_points: 5,
            checksum: 0,
        });
        let frames = transport.drain_frames();
        assert_eq!(sequences(&frames), vec![1, 0, 3, 2, 4]);
        assert!(matches!(
            decode_packet(frames.last().unwrap(), &Limits::default()),
            Ok(Packet::End(_))
        ));
    }

    #[test]
    fn listener_receives_detached_copy() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut transport = LoopbackTransport::new();
        transport.set_listener(move |packet| sink.lock().unwrap().push(packet.clone()));

        let mut scratch = vec![7u8, 8, 9];
        transport.send_update(&update(0, &scratch));
        scratch.fill(0);

        let seen = seen.lock().unwrap();
        match &seen[0] {
            OwnedPacket::Update(update) => assert_eq!(update.payload, vec![7, 8, 9]),
            other => panic!("unexpected packet {other:?}"),
        }
        let frame = transport.pop_frame().unwrap();
        match decode_packet(&frame, &Limits::default()).unwrap() {
            Packet::Update(update) => assert_eq!(update.payload, &[7, 8, 9]),
            other => panic!("unexpected packet {other:?}"),
        }
    }
}
