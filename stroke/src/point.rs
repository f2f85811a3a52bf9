//! Fixed-point canvas coordinates.

/// Largest coordinate in the logical canvas space.
pub const LOGICAL_MAX: u16 = u16::MAX;

/// A point in the fixed logical space `[0, 65535]²` with 8-bit pressure.
///
/// `(0, 0)` and `(65535, 65535)` are the corners of the normalized
/// `[0, 1]²` canvas. Equality and distance work on the raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedPoint {
    pub x: u16,
    pub y: u16,
    pub pressure: u8,
}

impl QuantizedPoint {
    /// Creates a point from raw logical components.
    #[must_use]
    pub const fn new(x: u16, y: u16, pressure: u8) -> Self {
        Self { x, y, pressure }
    }

    /// Quantizes a normalized position and pressure.
    ///
    /// Inputs are clamped to `[0, 1]` (NaN maps to 0) and rounded to the
    /// nearest step, so the error is at most half a step per axis.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn from_normalized(u: f32, v: f32, pressure: f32) -> Self {
        Self {
            x: quantize(u, f32::from(LOGICAL_MAX)) as u16,
            y: quantize(v, f32::from(LOGICAL_MAX)) as u16,
            pressure: quantize(pressure, f32::from(u8::MAX)) as u8,
        }
    }

    /// Maps back to normalized `(u, v, pressure)`.
    #[must_use]
    pub fn to_normalized(self) -> (f32, f32, f32) {
        (
            f32::from(self.x) / f32::from(LOGICAL_MAX),
            f32::from(self.y) / f32::from(LOGICAL_MAX),
            f32::from(self.pressure) / f32::from(u8::MAX),
        )
    }

    /// Squared euclidean distance over the integer coordinates.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }
}

fn quantize(value: f32, scale: f32) -> f32 {
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    (clamped * scale).round()
}
