//! Sparse-set hot paths at varying population sizes, mirroring the gap
//! sweep in `amethyst-specs/benches/storage_sparse.rs` (there swept across
//! storage backends; here across population size, since this crate has
//! only the one sparse backend).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hearth_ecs::entity::Entity;
use hearth_ecs::sparse_set::SparseSet;

const SIZES: [u32; 4] = [128, 1_024, 10_000, 50_000];

fn e(i: u32) -> Entity {
    Entity::new(i, 0)
}

fn filled(n: u32) -> SparseSet {
    let mut set = SparseSet::new();
    for i in 0..n {
        set.insert(e(i));
    }
    set
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set/insert");
    for &n in &SIZES {
        group.bench_function(format!("{n}"), |b| {
            b.iter_batched(
                SparseSet::new,
                |mut set| {
                    for i in 0..n {
                        set.insert(black_box(e(i)));
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set/erase");
    for &n in &SIZES {
        group.bench_function(format!("{n}"), |b| {
            b.iter_batched(
                || filled(n),
                |mut set| {
                    for i in 0..n {
                        set.erase(black_box(e(i)));
                    }
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_fixed_erase_and_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set/fixed_erase_then_pack");
    for &n in &SIZES {
        group.bench_function(format!("{n}"), |b| {
            b.iter_batched(
                || filled(n),
                |mut set| {
                    for i in (0..n).step_by(2) {
                        set.fixed_erase(black_box(e(i)));
                    }
                    set.pack();
                    black_box(set.raw_len());
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set/sort");
    for &n in &SIZES {
        group.bench_function(format!("{n}"), |b| {
            b.iter_batched(
                || filled(n),
                |mut set| set.sort(|a, b| b.index().cmp(&a.index())),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set/find");
    for &n in &SIZES {
        let set = filled(n);
        group.bench_function(format!("{n}"), |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(set.find(black_box(e(i))));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_erase,
    bench_fixed_erase_and_pack,
    bench_sort,
    bench_find
);
criterion_main!(benches);
