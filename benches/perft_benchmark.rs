use chessrules::{perft, Position};

use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("perft depth 4 from the starting position", |b| {
        b.iter(|| perft(&Position::starting_position(), 4))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
