//! Eraser effectiveness.

use std::collections::{HashMap, HashSet};

use stroke::{QuantizedPoint, Rect, StrokeEntity, StrokeKey};

use crate::config::{HitTest, QuadTreeConfig};
use crate::quadtree::QuadTree;

/// Indexes ink strokes and decides whether an eraser stroke touches any.
///
/// An eraser is effective when any one of its points comes within the
/// eraser radius plus the ink radius of an active ink stroke. Every eraser
/// point is tested. Ink already covered by a newer eraser still counts as
/// long as it is in the active set.
#[derive(Debug, Clone)]
pub struct EraserEngine {
    index: QuadTree<StrokeKey>,
    inks: HashMap<StrokeKey, StrokeEntity>,
    hit_test: HitTest,
    max_ink_radius: u32,
}

impl EraserEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new(config: QuadTreeConfig, hit_test: HitTest) -> Self {
        Self {
            index: QuadTree::new(config),
            inks: HashMap::new(),
            hit_test,
            max_ink_radius: 0,
        }
    }

    /// Returns the hit test in use.
    #[must_use]
    pub const fn hit_test(&self) -> HitTest {
        self.hit_test
    }

    /// Returns the underlying spatial index.
    #[must_use]
    pub const fn index(&self) -> &QuadTree<StrokeKey> {
        &self.index
    }

    /// Indexes an ended ink stroke. Eraser strokes and empty strokes are
    /// not indexed; returns whether the stroke was added.
    pub fn insert(&mut self, stroke: &StrokeEntity) -> bool {
        let Some(bounds) = stroke.bounds() else {
            return false;
        };
        if stroke.attrs().is_eraser() {
            return false;
        }
        self.max_ink_radius = self.max_ink_radius.max(stroke.attrs().radius());
        self.index.insert(stroke.key(), bounds);
        self.inks.insert(stroke.key(), stroke.clone());
        true
    }

    /// Drops a stroke from the index. Returns whether it was indexed.
    pub fn remove(&mut self, key: &StrokeKey) -> bool {
        self.index.remove(key);
        self.inks.remove(key).is_some()
    }

    /// Number of indexed ink strokes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inks.is_empty()
    }

    /// Removes every indexed stroke.
    pub fn clear(&mut self) {
        self.index.clear();
        self.inks.clear();
        self.max_ink_radius = 0;
    }

    /// Returns `true` if `eraser` touches ink whose key is in `active`.
    pub fn is_eraser_stroke_effective(
        &self,
        eraser: &StrokeEntity,
        active: &HashSet<StrokeKey>,
    ) -> bool {
        let eraser_radius = i64::from(eraser.attrs().radius());
        // Widest reach any indexed ink stroke can have from an eraser point.
        let reach = eraser_radius + i64::from(self.max_ink_radius);
        let reach = i32::try_from(reach).unwrap_or(i32::MAX);
        let mut candidates = HashSet::new();

        for &point in eraser.points() {
            candidates.clear();
            self.index
                .query_into(Rect::from_point(point).inflate(reach), &mut candidates);
            for key in &candidates {
                if !active.contains(key) {
                    continue;
                }
                let Some(ink) = self.inks.get(key) else {
                    continue;
                };
                let limit = eraser_radius + i64::from(ink.attrs().radius());
                if self.touches(point, ink, limit) {
                    return true;
                }
            }
        }
        false
    }

    #[allow(clippy::cast_precision_loss)]
    fn touches(&self, point: QuantizedPoint, ink: &StrokeEntity, limit: i64) -> bool {
        let limit_sq = limit.unsigned_abs().saturating_mul(limit.unsigned_abs());
        match self.hit_test {
            HitTest::BoundingBox => ink
                .bounds()
                .is_some_and(|bounds| bounds.distance_squared_to(point) <= limit_sq),
            HitTest::Segments => polyline_distance_squared(point, ink.points())
                .is_some_and(|distance| distance <= limit_sq as f64),
        }
    }
}

impl Default for EraserEngine {
    fn default() -> Self {
        Self::new(QuadTreeConfig::default(), HitTest::default())
    }
}

/// Squared distance from `point` to the nearest segment of `line`.
#[allow(clippy::cast_precision_loss)]
fn polyline_distance_squared(point: QuantizedPoint, line: &[QuantizedPoint]) -> Option<f64> {
    let (&first, rest) = line.split_first()?;
    if rest.is_empty() {
        return Some(point.distance_squared(first) as f64);
    }
    let px = f64::from(point.x);
    let py = f64::from(point.y);
    let mut best = f64::INFINITY;
    let mut prev = first;
    for &next in rest {
        let (ax, ay) = (f64::from(prev.x), f64::from(prev.y));
        let (bx, by) = (f64::from(next.x), f64::from(next.y));
        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx.mul_add(dx, dy * dy);
        let t = if len_sq == 0.0 {
            0.0
        } else {
            ((px - ax).mul_add(dx, (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
        };
        let (cx, cy) = (t.mul_add(dx, ax), t.mul_add(dy, ay));
        let distance = (px - cx).mul_add(px - cx, (py - cy) * (py - cy));
        best = best.min(distance);
        prev = next;
    }
    Some(best)
}

/// Orders strokes for drawing: lower sequence first.
#[must_use]
pub fn render_order<'a>(
    strokes: impl IntoIterator<Item = &'a StrokeEntity>,
) -> Vec<&'a StrokeEntity> {
    let mut ordered: Vec<_> = strokes.into_iter().collect();
    ordered.sort_by(|a, b| a.draw_order(b));
    ordered
}
