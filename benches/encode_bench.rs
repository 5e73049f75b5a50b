use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use supercookie_codec::{encode, quoted_etag};
use supercookie_core::TrackingRegistry;
use supercookie_transport::dispatch::{set_favicon, Validators};

fn encoder_performance(c: &mut Criterion) {
    let id = "7f9c2ba4-e88f-4d3c-9c1a-55b0a3a1f2e1";

    c.bench_function("favicon_encode", |b| b.iter(|| encode(black_box(id))));
    c.bench_function("quoted_etag", |b| b.iter(|| quoted_etag(black_box(id))));
}

fn set_favicon_contended(c: &mut Criterion) {
    let registry = Arc::new(TrackingRegistry::new());
    let hit = Validators::with_if_none_match(quoted_etag("bench-id"));

    // Background thread keeps the registry lock busy on a fixed pool of
    // identifiers, so the map stops growing once the pool is seen.
    let stop = Arc::new(AtomicBool::new(false));
    let contender = {
        let registry = registry.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            let pool: Vec<String> = (0..256).map(|i| format!("contender-{i}")).collect();
            for id in pool.iter().cycle() {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                registry.observe_set(id, false);
                std::thread::sleep(Duration::from_micros(50));
            }
        })
    };

    c.bench_function("set_favicon_cache_hit", |b| {
        b.iter(|| black_box(set_favicon(&registry, Some("bench-id"), &hit)))
    });
    c.bench_function("set_favicon_cache_miss", |b| {
        b.iter(|| black_box(set_favicon(&registry, Some("bench-id"), &Validators::default())))
    });

    stop.store(true, Ordering::Relaxed);
    contender.join().expect("contender thread panicked");
}

criterion_group!(benches, encoder_performance, set_favicon_contended);
criterion_main!(benches);
