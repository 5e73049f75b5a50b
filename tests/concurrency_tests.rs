//! # Registry Contention Tests
//!
//! Many threads hammering `set` for the same identifier must not lose a
//! sighting, and distinct identifiers must each get exactly one record.

use std::sync::Arc;
use std::thread;
use supercookie_core::{SessionState, TrackingRegistry};
use supercookie_transport::dispatch::{set_favicon, Validators};

const THREADS: usize = 8;
const ROUNDS: usize = 250;

#[test]
fn test_concurrent_sets_for_one_identifier() {
    let registry = Arc::new(TrackingRegistry::new());

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    registry.observe_set("shared", false);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let record = registry.get("shared").unwrap();
    assert_eq!(record.hit_count, (THREADS * ROUNDS) as u64, "Lost update under contention");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concurrent_anonymous_sets_never_collide() {
    let registry = Arc::new(TrackingRegistry::new());

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..ROUNDS)
                    .map(|_| set_favicon(&registry, None, &Validators::default()).identifier)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut issued = Vec::new();
    for worker in workers {
        issued.extend(worker.join().unwrap());
    }

    assert_eq!(registry.len(), THREADS * ROUNDS);
    assert!(issued.iter().all(|id| registry.get(id).map(|r| r.hit_count) == Some(1)));
}

/// Confirmations racing with plain revisits always end confirmed.
#[test]
fn test_confirmation_survives_contention() {
    let registry = Arc::new(TrackingRegistry::new());
    registry.observe_set("racy", false);

    let workers: Vec<_> = (0..THREADS)
        .map(|n| {
            let registry = registry.clone();
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    registry.observe_set("racy", n == 0 && round == ROUNDS / 2);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let record = registry.get("racy").unwrap();
    assert_eq!(record.state, SessionState::Confirmed);
    assert_eq!(record.hit_count, (THREADS * ROUNDS + 1) as u64);
}
