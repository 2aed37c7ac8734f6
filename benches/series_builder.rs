use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tombola_series::cards::Card;
use tombola_series::series::{PerfectSwapBuilder, SeriesBuilder, SeriesList};

fn bench_build_series(c: &mut Criterion) {
    let mut g = c.benchmark_group("series_builder");
    for &avoid in &[false, true] {
        g.bench_with_input(BenchmarkId::new("perfect_swap", avoid), &avoid, |b, &avoid| {
            let mut builder = PerfectSwapBuilder::new(42).with_avoid_empty_column(avoid);
            b.iter(|| black_box(builder.build_series()))
        });
    }
    g.bench_function("random_card", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(Card::random("bench", black_box(seed), false))
        })
    });
    g.finish();
}

fn bench_compare_all(c: &mut Criterion) {
    let mut g = c.benchmark_group("series_list");
    for &n in &[10usize, 50] {
        let mut builder = PerfectSwapBuilder::new(7);
        let mut list = SeriesList::new("bench");
        for _ in 0..n {
            if let Ok(series) = builder.build_series() {
                list.push(series);
            }
        }
        g.bench_with_input(BenchmarkId::new("compare_all", n), &list, |b, list| {
            b.iter(|| {
                let mut list = list.clone();
                black_box(list.compare_all().worst_card())
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_build_series, bench_compare_all);
criterion_main!(benches);
