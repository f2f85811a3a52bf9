//! Stroke lifecycle: a building stroke and its immutable ended form.
//!
//! A stroke starts as a [`StrokeBuilder`] that accepts points and becomes a
//! [`StrokeEntity`] through [`StrokeBuilder::end`]. The ended type has no
//! way to append, so a finalized stroke cannot change.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::checksum::StrokeChecksum;
use crate::point::QuantizedPoint;
use crate::rect::Rect;
use crate::types::{AuthorId, BrushId, Rgba, StrokeId, StrokeKey};

/// Attributes fixed at stroke start.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeAttrs {
    pub id: StrokeId,
    pub author: AuthorId,
    pub brush: BrushId,
    /// Seed for procedural brush effects.
    pub seed: u32,
    pub color: Rgba,
    /// Brush diameter in logical units.
    pub size: f32,
    /// Strictly increasing per context; the only temporal ordering.
    pub sequence: u64,
}

impl StrokeAttrs {
    #[must_use]
    pub const fn key(&self) -> StrokeKey {
        StrokeKey::new(self.author, self.id)
    }

    #[must_use]
    pub const fn is_eraser(&self) -> bool {
        self.brush.is_eraser()
    }

    /// Half the brush size, rounded up, in logical units.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn radius(&self) -> u32 {
        if self.size.is_finite() && self.size > 0.0 {
            (self.size / 2.0).ceil().min(f32::from(u16::MAX)) as u32
        } else {
            0
        }
    }
}

/// A stroke that is still being drawn.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    attrs: StrokeAttrs,
    points: Vec<QuantizedPoint>,
    bounds: Option<Rect>,
    checksum: StrokeChecksum,
}

impl StrokeBuilder {
    /// Starts a stroke with zero points.
    #[must_use]
    pub fn new(attrs: StrokeAttrs) -> Self {
        Self {
            attrs,
            points: Vec::new(),
            bounds: None,
            checksum: StrokeChecksum::new(),
        }
    }

    #[must_use]
    pub const fn attrs(&self) -> &StrokeAttrs {
        &self.attrs
    }

    #[must_use]
    pub fn points(&self) -> &[QuantizedPoint] {
        &self.points
    }

    #[must_use]
    pub fn last_point(&self) -> Option<QuantizedPoint> {
        self.points.last().copied()
    }

    #[must_use]
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Checksum of the points appended so far.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    /// Appends points in order.
    pub fn append_points(&mut self, points: &[QuantizedPoint]) {
        for point in points {
            match self.bounds.as_mut() {
                Some(bounds) => bounds.include(*point),
                None => self.bounds = Some(Rect::from_point(*point)),
            }
        }
        self.checksum.extend(points);
        self.points.extend_from_slice(points);
    }

    /// Finalizes the stroke.
    #[must_use]
    pub fn end(self) -> StrokeEntity {
        StrokeEntity {
            checksum: self.checksum.value(),
            attrs: self.attrs,
            points: self.points.into(),
            bounds: self.bounds,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StrokeSnapshot {
        StrokeSnapshot {
            attrs: self.attrs,
            points: self.points.as_slice().into(),
            bounds: self.bounds,
            ended: false,
        }
    }
}

/// A finalized, immutable stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeEntity {
    attrs: StrokeAttrs,
    points: Arc<[QuantizedPoint]>,
    bounds: Option<Rect>,
    checksum: u32,
}

impl StrokeEntity {
    #[must_use]
    pub const fn attrs(&self) -> &StrokeAttrs {
        &self.attrs
    }

    #[must_use]
    pub const fn key(&self) -> StrokeKey {
        self.attrs.key()
    }

    #[must_use]
    pub fn points(&self) -> &[QuantizedPoint] {
        &self.points
    }

    /// Point bounding box, not inflated by the brush radius.
    #[must_use]
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    #[must_use]
    pub const fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Always `true`; present so callers handling both states read the same.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        true
    }

    /// Draw order: lower sequence first; key breaks ties between contexts.
    #[must_use]
    pub fn draw_order(&self, other: &Self) -> Ordering {
        self.attrs
            .sequence
            .cmp(&other.attrs.sequence)
            .then_with(|| self.key().cmp(&other.key()))
    }

    #[must_use]
    pub fn snapshot(&self) -> StrokeSnapshot {
        StrokeSnapshot {
            attrs: self.attrs,
            points: Arc::clone(&self.points),
            bounds: self.bounds,
            ended: true,
        }
    }
}

/// Read-only view handed to rendering collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSnapshot {
    pub attrs: StrokeAttrs,
    pub points: Arc<[QuantizedPoint]>,
    pub bounds: Option<Rect>,
    pub ended: bool,
}
