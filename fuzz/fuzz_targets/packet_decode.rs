#![no_main]

use codec::{decompress_with_limits, CodecLimits, STROKE_ORIGIN};
use libfuzzer_sys::fuzz_target;
use wire::{decode_packet, encode_to_vec, Limits, Packet};

fuzz_target!(|data: &[u8]| {
    let Ok(packet) = decode_packet(data, &Limits::default()) else {
        return;
    };

    // Anything that decodes re-encodes to the same bytes.
    let bytes = encode_to_vec(&packet).expect("decoded packet re-encodes");
    assert_eq!(bytes, data);

    if let Packet::Update(update) = packet {
        let limits = CodecLimits::default();
        let mut points = Vec::new();
        let _ = decompress_with_limits(STROKE_ORIGIN, update.payload, &limits, &mut points);
        let _ = decompress_with_limits(STROKE_ORIGIN, update.redundant, &limits, &mut points);
    }
});
