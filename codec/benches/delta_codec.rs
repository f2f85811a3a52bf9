use codec::{compress, decompress, MAX_RECORD_LEN, STROKE_ORIGIN};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stroke::QuantizedPoint;

fn smooth_stroke(len: u16) -> Vec<QuantizedPoint> {
    (0..len)
        .map(|i| {
            let t = f32::from(i) / f32::from(len);
            QuantizedPoint::from_normalized(0.2 + 0.6 * t, 0.5 + 0.1 * (t * 12.0).sin(), t)
        })
        .collect()
}

fn bench_delta(c: &mut Criterion) {
    let points = smooth_stroke(255);
    let mut buf = vec![0u8; points.len() * MAX_RECORD_LEN];
    let len = compress(STROKE_ORIGIN, &points, &mut buf);

    let mut group = c.benchmark_group("delta");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("compress_255", |b| {
        b.iter(|| compress(STROKE_ORIGIN, black_box(&points), black_box(&mut buf)));
    });
    group.bench_function("decompress_255", |b| {
        let mut out = Vec::with_capacity(points.len());
        b.iter(|| {
            out.clear();
            decompress(STROKE_ORIGIN, black_box(&buf[..len]), &mut out).unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_delta);
criterion_main!(benches);
