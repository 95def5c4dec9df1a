use catalog_cache::ResponseCache;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::time::Duration;

const KEYS: usize = 10_000;

fn keys() -> Vec<String> {
    (0..KEYS)
        .map(|i| format!("GET:/products?limit=5&skip={}&sortBy=price&order=asc", i * 5))
        .collect()
}

fn bench_get(c: &mut Criterion) {
    let keys = keys();
    let cache = ResponseCache::new(Duration::from_secs(300));
    for key in &keys {
        cache.put(key.clone(), vec![0u8; 256]);
    }

    let mut rng = rand::thread_rng();
    c.bench_function("response_cache_get_hit", |b| {
        b.iter(|| {
            let key = &keys[rng.gen_range(0..KEYS)];
            black_box(cache.get(key));
        })
    });

    c.bench_function("response_cache_get_miss", |b| {
        b.iter(|| black_box(cache.get("GET:/products/category/none")))
    });
}

fn bench_put(c: &mut Criterion) {
    let keys = keys();
    let cache = ResponseCache::new(Duration::from_secs(300));

    let mut rng = rand::thread_rng();
    c.bench_function("response_cache_put_overwrite", |b| {
        b.iter(|| {
            let key = &keys[rng.gen_range(0..KEYS)];
            cache.put(key.clone(), vec![0u8; 256]);
        })
    });
}

criterion_group!(benches, bench_get, bench_put);
criterion_main!(benches);
