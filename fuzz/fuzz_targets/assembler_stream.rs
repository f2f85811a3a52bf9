#![no_main]

use codec::CodecLimits;
use libfuzzer_sys::fuzz_target;
use stroke::{AuthorId, SequenceAllocator};
use wire::{decode_packet, Limits, ReceiveOutcome, StrokeAssembler};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::for_testing();
    let mut assembler = StrokeAssembler::new(AuthorId::new(1), limits.clone(), CodecLimits::for_testing());
    let mut sequences = SequenceAllocator::new();

    // Split the input into length-prefixed frames.
    let mut idx = 0usize;
    while idx < data.len() && idx < 8192 {
        let len = (data[idx] as usize % 160).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let frame = &data[idx..end];
        idx = end;

        let Ok(packet) = decode_packet(frame, &limits) else {
            continue;
        };
        if let Ok(ReceiveOutcome::Completed(stroke)) = assembler.receive(&packet, &mut sequences) {
            assert_eq!(stroke.checksum(), stroke::StrokeChecksum::of(stroke.points()));
        }
    }

    let open: Vec<_> = assembler.open_strokes().collect();
    for id in open {
        assert!(assembler.abandon(id).is_some());
    }
});
