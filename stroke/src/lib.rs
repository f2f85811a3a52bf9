//! Fixed-point stroke model for the inkcast shared canvas.
//!
//! This crate defines what a stroke is, independent of how it travels:
//! - [`QuantizedPoint`] in the `[0, 65535]²` logical space with 8-bit pressure
//! - [`StrokeBuilder`] (still drawing) and [`StrokeEntity`] (ended, immutable)
//! - [`StrokeChecksum`], the order-sensitive point sequence checksum
//! - [`SequenceAllocator`] for temporal ordering
//!
//! # Design Principles
//!
//! - **Integer geometry** - Distances and boxes use raw integer coordinates.
//! - **Append-only** - Points are never removed or rewritten.
//! - **Deterministic** - Same points in the same order give the same checksum.

mod checksum;
mod entity;
mod point;
mod rect;
mod sequence;
mod types;

pub use checksum::StrokeChecksum;
pub use entity::{StrokeAttrs, StrokeBuilder, StrokeEntity, StrokeSnapshot};
pub use point::{QuantizedPoint, LOGICAL_MAX};
pub use rect::Rect;
pub use sequence::SequenceAllocator;
pub use types::{AuthorId, BrushId, Rgba, StrokeId, StrokeKey};
