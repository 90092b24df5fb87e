use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dictionaries::RedBlackTree;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// Ascending keys hit the rotation-heavy path on every insert.
fn bench_insert_sequential_100k(c: &mut Criterion) {
    c.bench_function("rbtree::insert_sequential_100k", |b| {
        b.iter_batched(
            RedBlackTree::<u64, u64>::new,
            |mut t| {
                for i in 0..100_000u64 {
                    t.insert(i, i).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_random_100k(c: &mut Criterion) {
    c.bench_function("rbtree::insert_random_100k", |b| {
        b.iter_batched(
            RedBlackTree::<u64, u64>::new,
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.insert(x, i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    let keys: Vec<u64> = lcg(2).take(50_000).collect();
    let mut t = RedBlackTree::new();
    for (i, k) in keys.iter().enumerate() {
        t.insert(*k, i as u64).unwrap();
    }
    c.bench_function("rbtree::get_hit_50k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &keys {
                sum = sum.wrapping_add(*t.get(k).unwrap().unwrap());
            }
            black_box(sum)
        })
    });
}

fn bench_remove_random(c: &mut Criterion) {
    c.bench_function("rbtree::remove_random_50k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<u64> = lcg(3).take(50_000).collect();
                let mut t = RedBlackTree::new();
                for k in &keys {
                    t.insert(*k, *k).unwrap();
                }
                (t, keys)
            },
            |(mut t, keys)| {
                for k in keys.iter().rev() {
                    black_box(t.remove(k).unwrap());
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_insert_sequential_100k, bench_insert_random_100k, bench_get_hit, bench_remove_random
}
criterion_main!(benches);
