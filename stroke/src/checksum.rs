//! Deterministic point-sequence checksums.

use blake3::Hasher;

use crate::point::QuantizedPoint;

/// Running checksum over an ordered point sequence.
///
/// Each point contributes `x` and `y` (little-endian `u16`) followed by the
/// pressure byte. The checksum is the first four digest bytes read as a
/// little-endian `u32`. It depends only on the points and their order.
#[derive(Debug, Clone, Default)]
pub struct StrokeChecksum {
    hasher: Hasher,
    points: usize,
}

impl StrokeChecksum {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checksum of a complete sequence.
    #[must_use]
    pub fn of(points: &[QuantizedPoint]) -> u32 {
        let mut checksum = Self::new();
        checksum.extend(points);
        checksum.value()
    }

    pub fn push(&mut self, point: QuantizedPoint) {
        let [x0, x1] = point.x.to_le_bytes();
        let [y0, y1] = point.y.to_le_bytes();
        self.hasher.update(&[x0, x1, y0, y1, point.pressure]);
        self.points += 1;
    }

    pub fn extend(&mut self, points: &[QuantizedPoint]) {
        for point in points {
            self.push(*point);
        }
    }

    /// Number of points folded in so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Current checksum value. Does not consume the running state.
    #[must_use]
    pub fn value(&self) -> u32 {
        let hash = self.hasher.finalize();
        let bytes = hash.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}
