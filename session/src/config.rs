//! Session configuration.

use codec::CodecLimits;
use spatial::{HitTest, QuadTreeConfig};
use stroke::AuthorId;
use wire::Limits;

/// Everything a [`crate::DrawingSession`] needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Author id stamped on local strokes.
    pub author: AuthorId,
    /// Packet, batch and reassembly limits.
    pub wire: Limits,
    /// Payload decoding limits.
    pub codec: CodecLimits,
    /// Shape of the eraser index.
    pub quadtree: QuadTreeConfig,
    /// Eraser hit test precision.
    pub hit_test: HitTest,
    /// Events the queue holds before producers block; `None` is unbounded.
    pub queue_capacity: Option<usize>,
}

impl SessionConfig {
    /// Creates a default config for `author`.
    #[must_use]
    pub fn for_author(author: AuthorId) -> Self {
        Self {
            author,
            ..Self::default()
        }
    }

    /// Creates a config with small limits so batching, splitting and
    /// reorder overflow happen quickly.
    #[must_use]
    pub fn for_testing(author: AuthorId) -> Self {
        Self {
            author,
            wire: Limits::for_testing(),
            codec: CodecLimits::for_testing(),
            quadtree: QuadTreeConfig::for_testing(),
            hit_test: HitTest::BoundingBox,
            queue_capacity: Some(64),
        }
    }
}
