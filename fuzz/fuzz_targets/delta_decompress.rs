#![no_main]

use codec::{compress, decompress, decompress_with_limits, encoded_len, CodecLimits};
use libfuzzer_sys::fuzz_target;
use stroke::QuantizedPoint;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let origin = QuantizedPoint::new(
        u16::from_le_bytes([data[0], data[1]]),
        u16::from_le_bytes([data[2], data[3]]),
        data[4],
    );
    let buf = &data[5..];

    let mut points = Vec::new();
    let Ok(count) = decompress_with_limits(origin, buf, &CodecLimits::for_testing(), &mut points)
    else {
        assert!(points.is_empty());
        return;
    };
    assert_eq!(count, points.len());

    // Whatever decodes survives a round trip through the encoder.
    let needed = encoded_len(origin, &points);
    let mut out = vec![0u8; needed];
    assert_eq!(compress(origin, &points, &mut out), needed);
    let mut again = Vec::new();
    decompress(origin, &out, &mut again).expect("re-encoded payload decodes");
    assert_eq!(again, points);
});
