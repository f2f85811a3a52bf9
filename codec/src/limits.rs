//! Limits for codec-level decoding.

/// Codec-specific limits enforced during decompression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecLimits {
    /// Maximum number of points a single payload may decode to.
    pub max_points_per_payload: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            // Updates carry at most 255 primary points; leave room for
            // oversized payloads produced by other tools.
            max_points_per_payload: 1024,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_points_per_payload: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_points_per_payload: usize::MAX,
        }
    }
}
