use proptest::prelude::*;
use stroke::{QuantizedPoint, StrokeChecksum};

fn point_strategy() -> impl Strategy<Value = QuantizedPoint> {
    (any::<u16>(), any::<u16>(), any::<u8>()).prop_map(|(x, y, p)| QuantizedPoint::new(x, y, p))
}

#[derive(Clone, Copy, Debug)]
enum Field {
    X,
    Y,
    Pressure,
}

fn field_strategy() -> impl Strategy<Value = Field> {
    prop_oneof![Just(Field::X), Just(Field::Y), Just(Field::Pressure)]
}

proptest! {
    #[test]
    fn prop_checksum_is_deterministic(points in prop::collection::vec(point_strategy(), 0..128)) {
        let first = StrokeChecksum::of(&points);
        let second = StrokeChecksum::of(&points);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_checksum_detects_single_change(
        points in prop::collection::vec(point_strategy(), 1..128),
        index in any::<prop::sample::Index>(),
        field in field_strategy(),
        bump in 1u16..=255,
    ) {
        let i = index.index(points.len());
        let mut changed = points.clone();
        match field {
            Field::X => changed[i].x = changed[i].x.wrapping_add(bump),
            Field::Y => changed[i].y = changed[i].y.wrapping_add(bump),
            Field::Pressure => changed[i].pressure = changed[i].pressure.wrapping_add(bump as u8),
        }
        prop_assume!(changed[i] != points[i]);
        prop_assert_ne!(StrokeChecksum::of(&points), StrokeChecksum::of(&changed));
    }

    #[test]
    fn prop_incremental_matches_one_shot(
        points in prop::collection::vec(point_strategy(), 0..64),
        split in any::<prop::sample::Index>(),
    ) {
        let at = if points.is_empty() { 0 } else { split.index(points.len() + 1) };
        let mut running = StrokeChecksum::new();
        running.extend(&points[..at]);
        running.extend(&points[at..]);
        prop_assert_eq!(running.value(), StrokeChecksum::of(&points));
    }
}
