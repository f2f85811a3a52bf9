//! Closed axis-aligned integer boxes in logical space.

use crate::point::{QuantizedPoint, LOGICAL_MAX};

/// Closed integer box `[min_x, max_x] × [min_y, max_y]`.
///
/// Corners are `i32` so query regions inflated by a brush radius may extend
/// past the edges of the logical canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    /// The whole logical canvas.
    pub const CANVAS: Self = Self {
        min_x: 0,
        min_y: 0,
        max_x: LOGICAL_MAX as i32,
        max_y: LOGICAL_MAX as i32,
    };

    #[must_use]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Degenerate box covering exactly one point.
    #[must_use]
    pub fn from_point(point: QuantizedPoint) -> Self {
        let x = i32::from(point.x);
        let y = i32::from(point.y);
        Self::new(x, y, x, y)
    }

    /// Bounding box of `points`, or `None` when empty.
    #[must_use]
    pub fn bounding(points: &[QuantizedPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = Self::from_point(*first);
        for point in rest {
            rect.include(*point);
        }
        Some(rect)
    }

    /// Grows the box to cover `point`.
    pub fn include(&mut self, point: QuantizedPoint) {
        let x = i32::from(point.x);
        let y = i32::from(point.y);
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Returns the box grown by `radius` on every side.
    #[must_use]
    pub const fn inflate(self, radius: i32) -> Self {
        Self::new(
            self.min_x.saturating_sub(radius),
            self.min_y.saturating_sub(radius),
            self.max_x.saturating_add(radius),
            self.max_y.saturating_add(radius),
        )
    }

    /// Overlap test; touching edges count.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Squared distance from a point to the nearest point of the box (0 inside).
    #[must_use]
    pub fn distance_squared_to(&self, point: QuantizedPoint) -> u64 {
        let x = i64::from(point.x);
        let y = i64::from(point.y);
        let dx = axis_gap(x, i64::from(self.min_x), i64::from(self.max_x));
        let dy = axis_gap(y, i64::from(self.min_y), i64::from(self.max_y));
        dx * dx + dy * dy
    }

    #[must_use]
    pub const fn width(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64 + 1
    }

    #[must_use]
    pub const fn height(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64 + 1
    }
}

#[allow(clippy::cast_sign_loss)]
fn axis_gap(value: i64, min: i64, max: i64) -> u64 {
    if value < min {
        (min - value) as u64
    } else if value > max {
        (value - max) as u64
    } else {
        0
    }
}
