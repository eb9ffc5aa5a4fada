use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use snore::{
    fft::{self, window, Direction, Sample},
    tinn::{activation::Activation, Network, Topology},
};

fn transform(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(12345u64);
    let mut group = c.benchmark_group("fft");
    for log2n in [6u32, 8, 10, 12] {
        let n = 1usize << log2n;
        let signal: Vec<Sample> = (0..n)
            .map(|_| Sample::new(rng.gen_range(0.0..4096.0), 0.0))
            .collect();
        group.bench_with_input(BenchmarkId::new("forward", n), &n, |b, _| {
            b.iter(|| {
                let mut data = signal.clone();
                let kind = window::WindowKind::Hamming;
                window::apply_window(&mut data, log2n, kind, Direction::Forward);
                fft::transform(black_box(&mut data), log2n, Direction::Forward);
                data
            })
        });
    }
    group.finish();
}

fn train(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(12345u64);
    let mut group = c.benchmark_group("tinn");
    for hidden in [10, 40, 100] {
        let topology = Topology::new(33, hidden, 1).unwrap();
        let mut network = Network::build(topology, Activation::Relu, &mut rng);
        let input: Vec<f32> = (0..33).map(|_| rng.gen()).collect();
        group.bench_with_input(BenchmarkId::new("train", hidden), &hidden, |b, _| {
            b.iter(|| network.train(black_box(&input), &[1.0], 0.01))
        });
    }
    group.finish();
}

criterion_group!(benches, transform, train);
criterion_main!(benches);
