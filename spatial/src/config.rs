//! Index and hit-test configuration.

/// Quadtree shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadTreeConfig {
    /// Entries a leaf holds before it splits.
    pub capacity: usize,
    /// Depth below which no node splits; the root is depth 0.
    pub max_depth: u8,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            max_depth: 8,
        }
    }
}

impl QuadTreeConfig {
    /// Creates a config that splits early and often.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            capacity: 2,
            max_depth: 4,
        }
    }

    /// Creates a config that never splits.
    #[must_use]
    pub const fn flat() -> Self {
        Self {
            capacity: usize::MAX,
            max_depth: 0,
        }
    }
}

/// How precisely a candidate ink stroke is tested against an eraser point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitTest {
    /// Distance to the ink stroke's bounding box.
    #[default]
    BoundingBox,
    /// Distance to the ink stroke's polyline.
    Segments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_config_splits_sooner() {
        let test = QuadTreeConfig::for_testing();
        let default = QuadTreeConfig::default();
        assert!(test.capacity < default.capacity);
        assert!(test.max_depth < default.max_depth);
    }

    #[test]
    fn default_hit_test_is_bounding_box() {
        assert_eq!(HitTest::default(), HitTest::BoundingBox);
    }

    #[test]
    fn config_const_constructible() {
        const CONFIG: QuadTreeConfig = QuadTreeConfig::flat();
        assert_eq!(CONFIG.max_depth, 0);
    }
}
