use core::hint::black_box;
use core::time::Duration;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::{Rng, rng};

use tranche::Tranche;

fn bench_push(c: &mut Criterion) {
    for (size, time, samples) in [
        (100, Duration::from_secs(3), 5000),
        (10_000, Duration::from_secs(10), 2000),
    ] {
        let mut group = c.benchmark_group(format!("Push {size}"));
        group.measurement_time(time);
        group.sample_size(samples);

        group.bench_function("Tranche", |b| {
            b.iter(|| {
                let mut t: Tranche<i32> = Tranche::new();
                for i in 0..size {
                    t.push(i).unwrap();
                }
                black_box(t)
            })
        });

        group.bench_function("Vec", |b| {
            b.iter(|| {
                let mut v: Vec<i32> = Vec::new();
                for i in 0..size {
                    v.push(i);
                }
                black_box(v)
            })
        });

        group.finish();
    }
}

fn bench_from_iter_exact(c: &mut Criterion) {
    let mut group = c.benchmark_group("FromIterator Exact Size");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(2000);
    let size = 1_000_000;

    group.bench_function("Tranche", |b| {
        b.iter(|| black_box(Tranche::from_iter(0..size)))
    });

    group.bench_function("Vec", |b| b.iter(|| black_box(Vec::from_iter(0..size))));

    group.finish();
}

fn bench_from_iter_large_unknown(c: &mut Criterion) {
    let mut group = c.benchmark_group("FromIterator Large Unknown Size");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(2000);
    let size = 1_000_000;
    let gen_bench = || (0..size).filter(|&x| x % 2 == 0).map(|x| x * 2);

    group.bench_function("Tranche", |b| {
        b.iter_batched(
            &gen_bench,
            |iter| {
                black_box(Tranche::from_iter(iter));
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("Vec", |b| {
        b.iter_batched(
            &gen_bench,
            |iter| {
                black_box(Vec::from_iter(iter));
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_from_slice(c: &mut Criterion) {
    for (size, time, samples) in [
        (100, Duration::from_secs(3), 5000),
        (10_000, Duration::from_secs(10), 2500),
        (1_000_000, Duration::from_secs(20), 1000),
    ] {
        let mut group = c.benchmark_group(format!("From Slice {size}"));
        group.measurement_time(time);
        group.sample_size(samples);

        let slice: Vec<i32> = (0..size).collect();

        group.bench_with_input("Tranche", &slice, |b, s| {
            b.iter(|| black_box(Tranche::from(&**s)))
        });

        group.bench_with_input("Vec", &slice, |b, s| b.iter(|| black_box(Vec::from(&**s))));

        group.finish();
    }
}

fn bench_insert_middle(c: &mut Criterion) {
    for size in [100, 10_000] {
        let mut group = c.benchmark_group(format!("Insert Middle {size}"));
        group.measurement_time(Duration::from_secs(10));
        group.sample_size(2000);

        let base: Vec<i32> = (0..size).collect();

        group.bench_function("Tranche", |b| {
            b.iter_batched(
                || Tranche::from(&*base),
                |mut t| {
                    t.insert(t.len() / 2, -1).unwrap();
                    black_box(t);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("Vec", |b| {
            b.iter_batched(
                || base.clone(),
                |mut v| {
                    v.insert(v.len() / 2, -1);
                    black_box(v);
                },
                BatchSize::SmallInput,
            )
        });

        group.finish();
    }
}

fn bench_insert_n_middle(c: &mut Criterion) {
    let size = 10_000;
    let n = 64;
    let mut group = c.benchmark_group(format!("Insert {n} Middle {size}"));
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(2000);

    let base: Vec<i32> = (0..size).collect();

    group.bench_function("Tranche", |b| {
        b.iter_batched(
            || Tranche::from(&*base),
            |mut t| {
                t.insert_n(t.len() / 2, n, -1).unwrap();
                black_box(t);
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("Vec (splice)", |b| {
        b.iter_batched(
            || base.clone(),
            |mut v| {
                let at = v.len() / 2;
                v.splice(at..at, core::iter::repeat_n(-1, n));
                black_box(v);
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_remove_range(c: &mut Criterion) {
    let size = 10_000;
    let mut group = c.benchmark_group(format!("Remove Range {size}"));
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(2000);

    let base: Vec<i32> = (0..size).collect();

    group.bench_function("Tranche", |b| {
        b.iter_batched(
            || Tranche::from(&*base),
            |mut t| {
                t.remove_range(100..4100);
                black_box(t);
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("Vec (drain)", |b| {
        b.iter_batched(
            || base.clone(),
            |mut v| {
                v.drain(100..4100);
                black_box(v);
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_assign_reuse(c: &mut Criterion) {
    let size = 10_000;
    let mut group = c.benchmark_group(format!("Assign Within Capacity {size}"));
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(2000);

    let src: Vec<i32> = (0..size).collect();

    group.bench_function("Tranche", |b| {
        b.iter_batched(
            || Tranche::from(&*src),
            |mut t| {
                t.assign_from_slice(&src).unwrap();
                black_box(t);
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("Vec (clone_from)", |b| {
        b.iter_batched(
            || src.clone(),
            |mut v| {
                v.clone_from(&src);
                black_box(v);
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_push_random_len(c: &mut Criterion) {
    let mut rng = rng();
    for n in [32, 8192] {
        let mut gendex = || rng.random_range(0..n) as usize;
        let mut group = c.benchmark_group(format!("Push random length up to {n}"));
        group.measurement_time(Duration::from_secs(10));
        group.sample_size(2000);

        group.bench_function("Tranche", |b| {
            b.iter_batched(
                || 0..gendex(),
                |range| {
                    let mut t: Tranche<usize> = Tranche::new();
                    for i in range {
                        t.push(i).unwrap();
                    }
                    black_box(t);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("Vec", |b| {
            b.iter_batched(
                || 0..gendex(),
                |range| {
                    let mut v: Vec<usize> = Vec::new();
                    for i in range {
                        v.push(i);
                    }
                    black_box(v);
                },
                BatchSize::SmallInput,
            )
        });

        group.finish();
    }
}

criterion_group!(
    benches,
    bench_push,
    bench_from_iter_exact,
    bench_from_iter_large_unknown,
    bench_from_slice,
    bench_insert_middle,
    bench_insert_n_middle,
    bench_remove_range,
    bench_assign_reuse,
    bench_push_random_len,
);
criterion_main!(benches);
