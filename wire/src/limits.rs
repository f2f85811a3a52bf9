//! Configurable limits for bounded encoding and decoding.

use codec::MAX_RECORD_LEN;

/// Wire-level limits for packet encoding, decoding and reassembly.
///
/// These limits are enforced during decoding to prevent resource exhaustion
/// and bound the reorder buffer. Point payload parsing limits belong to the
/// codec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum packet size in bytes.
    pub max_packet_bytes: usize,

    /// Maximum length of a primary or redundant payload in bytes.
    pub max_payload_bytes: usize,

    /// Maximum points the sender packs into one Update.
    pub max_batch_points: u8,

    /// Out-of-order Updates held per stroke while waiting for a gap to fill.
    pub reorder_window: usize,

    /// Ended, aborted or discarded stroke ids remembered to ignore late packets.
    pub remembered_closed: usize,

    /// Strokes held per author that have Updates or End but no Begin yet.
    pub max_unopened: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Fits a typical datagram MTU with both payloads full.
            max_packet_bytes: 1200,
            max_payload_bytes: 576,
            max_batch_points: 64,
            reorder_window: 8,
            remembered_closed: 256,
            max_unopened: 8,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 256,
            max_payload_bytes: 96,
            max_batch_points: 16,
            reorder_window: 4,
            remembered_closed: 16,
            max_unopened: 4,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
            max_payload_bytes: u16::MAX as usize,
            max_batch_points: u8::MAX,
            reorder_window: usize::MAX,
            remembered_closed: usize::MAX,
            max_unopened: usize::MAX,
        }
    }

    /// Payload buffer size the sender compresses into.
    ///
    /// Always room for one record and never more than the `u16` length field.
    #[must_use]
    pub fn payload_capacity(&self) -> usize {
        self.max_payload_bytes
            .clamp(MAX_RECORD_LEN, usize::from(u16::MAX))
    }

    /// Points per Update, never zero.
    #[must_use]
    pub fn batch_points(&self) -> usize {
        usize::from(self.max_batch_points.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_packet_bytes() {
        let limits = Limits::default();
        assert_eq!(limits.max_packet_bytes, 1200);
        assert!(
            crate::UPDATE_OVERHEAD + 2 * limits.max_payload_bytes <= limits.max_packet_bytes,
            "a full update must fit in one packet"
        );
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_packet_bytes < default_limits.max_packet_bytes);
        assert!(test_limits.max_payload_bytes < default_limits.max_payload_bytes);
        assert!(test_limits.reorder_window < default_limits.reorder_window);
        assert!(
            crate::UPDATE_OVERHEAD + 2 * test_limits.max_payload_bytes
                <= test_limits.max_packet_bytes
        );
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_packet_bytes, usize::MAX);
        assert_eq!(limits.max_batch_points, u8::MAX);
    }

    #[test]
    fn payload_capacity_is_clamped() {
        let mut limits = Limits::for_testing();
        limits.max_payload_bytes = 1;
        assert_eq!(limits.payload_capacity(), MAX_RECORD_LEN);
        limits.max_payload_bytes = usize::MAX;
        assert_eq!(limits.payload_capacity(), usize::from(u16::MAX));
    }

    #[test]
    fn batch_points_never_zero() {
        let mut limits = Limits::default();
        limits.max_batch_points = 0;
        assert_eq!(limits.batch_points(), 1);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_packet_bytes, 256);
    }
}
