//! Benchmarks for the CPU simulation path.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rdtype::{
    ConcentrationField, FieldStepper, SimulationParams, TextMask, TextRasterizer, TextStyle,
};

fn seeded(size: usize, text: &str) -> (ConcentrationField, TextMask) {
    let field = ConcentrationField::new(size, size).unwrap();
    let mut mask = TextMask::new(size, size).unwrap();
    TextRasterizer::new().rasterize(text, &TextStyle::default(), &mut mask);
    (field, mask)
}

fn bench_half_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("half_step");
    let params = SimulationParams::default();

    for size in [100, 300, 600] {
        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, &size| {
            let (mut field, mask) = seeded(size, "RD");
            b.iter(|| field.half_step(black_box(&mask), &params))
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for iterations in [1, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("iterations", iterations),
            &iterations,
            |b, &iterations| {
                let (mut field, mask) = seeded(300, "HELLO");
                let mut stepper = FieldStepper::new();
                let params = SimulationParams::default().with_iterations(iterations);
                b.iter(|| black_box(stepper.advance_frame(&mut field, &mask, &params)))
            },
        );
    }

    group.finish();
}

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    let rasterizer = TextRasterizer::new();
    let style = TextStyle::default();

    group.bench_function("single_char", |b| {
        let mut mask = TextMask::new(300, 300).unwrap();
        b.iter(|| rasterizer.rasterize(black_box("A"), &style, &mut mask))
    });

    group.bench_function("two_lines", |b| {
        let mut mask = TextMask::new(300, 300).unwrap();
        b.iter(|| rasterizer.rasterize(black_box("REACTION\nDIFFUSION"), &style, &mut mask))
    });

    group.finish();
}

criterion_group!(benches, bench_half_step, bench_frame, bench_rasterize);
criterion_main!(benches);
