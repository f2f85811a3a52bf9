//! Stroke packet protocol for inkcast.
//!
//! This crate handles the binary wire format for streaming strokes: packet
//! layouts, limit enforcement, the sending side with per-Update redundancy,
//! and the receiving side that rebuilds strokes from lossy, reordered
//! packets.
//!
//! # Packets
//!
//! - **Begin** opens a stroke with its brush, color, size and seed.
//! - **Update** carries one batch of delta-compressed points plus the
//!   previous batch's bytes, so any single lost Update can be rebuilt.
//! - **End** declares the point total and checksum.
//! - **Abort** cancels the stroke.
//!
//! # Design Principles
//!
//! - **Stable wire format** - The format is versioned and little-endian.
//! - **Bounded decoding** - All length fields are validated against limits.
//! - **Exact or nothing** - A stroke that cannot be rebuilt exactly is
//!   discarded and reported, never rendered as complete.
//! - **Synchronous transport** - Sends are fire-and-forget and borrow their
//!   payloads only for the duration of the call.

mod error;
mod header;
mod limits;
mod packet;
mod pool;
mod receiver;
mod sender;
mod transport;

pub use error::{
    AssemblyFault, DecodeError, EncodeError, FaultKind, LimitKind, SendError, WireResult,
};
pub use header::{
    decode_header, encode_header, PacketHeader, PacketKind, HEADER_SIZE, MAGIC, VERSION,
};
pub use limits::Limits;
pub use packet::{
    decode_packet, encode_packet, encode_to_vec, AbortPacket, BeginPacket, EndPacket,
    OwnedPacket, OwnedUpdate, Packet, UpdatePacket, BEGIN_BODY_SIZE, END_BODY_SIZE,
    UPDATE_OVERHEAD,
};
pub use pool::PayloadPool;
pub use receiver::{AssemblerStats, ClosedReason, IgnoreReason, ReceiveOutcome, StrokeAssembler};
pub use sender::{PushStats, StrokeSender};
pub use transport::{LoopbackStats, LoopbackTransport, LossPattern, Transport};
