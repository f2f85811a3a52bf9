//! The session event queue and what the session reports back.

use crossbeam_channel::Sender;
use stroke::{AuthorId, StrokeKey};
use wire::{AssemblyFault, DecodeError};

use crate::error::SessionClosed;

/// Work handed to the session's owning loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An encoded packet received from a remote author.
    Packet { from: AuthorId, bytes: Vec<u8> },
    /// Give up on a remote stroke that stopped making progress.
    Abandon(StrokeKey),
    /// Remove an ended stroke from the canvas.
    Remove(StrokeKey),
    /// Stop [`crate::DrawingSession::run`].
    Shutdown,
}

/// Cloneable producer side of the session queue.
///
/// Network readers and input threads hold handles; only the session drains
/// the queue, so all stroke state has a single owner.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) const fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Queues an event, blocking while a bounded queue is full.
    pub fn send(&self, event: SessionEvent) -> Result<(), SessionClosed> {
        self.tx.send(event).map_err(|_| SessionClosed)
    }

    /// Queues a received packet.
    pub fn deliver(&self, from: AuthorId, bytes: Vec<u8>) -> Result<(), SessionClosed> {
        self.send(SessionEvent::Packet { from, bytes })
    }

    pub fn abandon(&self, key: StrokeKey) -> Result<(), SessionClosed> {
        self.send(SessionEvent::Abandon(key))
    }

    pub fn remove(&self, key: StrokeKey) -> Result<(), SessionClosed> {
        self.send(SessionEvent::Remove(key))
    }

    pub fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionEvent::Shutdown)
    }

    /// Events waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Something the session wants its collaborators to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// A stroke ended and was verified. Erasers carry their verdict.
    StrokeCompleted {
        key: StrokeKey,
        eraser_effective: Option<bool>,
    },
    /// A remote author aborted a stroke.
    StrokeAborted(StrokeKey),
    /// A local eraser touched nothing and was aborted instead of ended.
    EraserDiscarded(StrokeKey),
    /// Packets were lost beyond recovery; the stroke was discarded.
    Desync {
        author: AuthorId,
        fault: AssemblyFault,
    },
    /// A stroke failed end-to-end verification and was discarded.
    IntegrityFault {
        author: AuthorId,
        fault: AssemblyFault,
    },
    /// A packet could not be decoded.
    MalformedPacket {
        author: AuthorId,
        error: DecodeError,
    },
}

impl SessionNotice {
    /// Returns `true` for notices that report a discarded stroke or bad input.
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        matches!(
            self,
            Self::Desync { .. } | Self::IntegrityFault { .. } | Self::MalformedPacket { .. }
        )
    }
}
