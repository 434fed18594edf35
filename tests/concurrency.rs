//! Multi-threaded producers and consumers against one cache.

use event_cache::{CacheConfig, EventCache};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn shared_cache(max_length: usize) -> Arc<EventCache<u64>> {
    Arc::new(
        EventCache::new(CacheConfig {
            max_length,
            ..Default::default()
        })
        .unwrap(),
    )
}

#[test]
fn test_each_listener_fires_exactly_once() {
    let cache = shared_cache(100);
    let fired = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        let fired = Arc::clone(&fired);
        cache.add_event_listener(
            &1,
            move |events| {
                assert_eq!(events.len(), 1);
                fired.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
    }

    let barrier = Arc::new(Barrier::new(4));
    let producers: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.push(&1, "event", json!(i));
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(fired.load(Ordering::SeqCst), 50);
    assert_eq!(cache.listener_count(&1), 0);
    assert_eq!(cache.queue_len(&1), 4);
}

#[test]
fn test_concurrent_pushes_respect_capacity() {
    let cache = shared_cache(8);

    let producers: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    cache.push(&(i % 3), "event", json!([t, i]));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    for recipient in 0..3 {
        assert_eq!(cache.queue_len(&recipient), 8);
    }
}

#[test]
fn test_long_poll_loop_sees_every_event() {
    let cache = shared_cache(1000);
    let total = 200;

    let consumer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            let mut seen = Vec::new();
            let mut last = None;
            while seen.len() < total {
                let handle = cache.subscribe(&9, last.as_ref());
                let batch = handle
                    .recv_timeout(Duration::from_secs(5))
                    .expect("consumer starved");
                for event in &batch {
                    seen.push(event.data.clone());
                }
                last = batch.last().map(|e| e.id.clone());
            }
            seen
        })
    };

    // Wait for the consumer's first (live) registration.
    while cache.listener_count(&9) == 0 {
        thread::yield_now();
    }

    for i in 0..total {
        cache.push(&9, "event", json!(i));
        if i % 16 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    let seen = consumer.join().unwrap();
    let expected: Vec<_> = (0..total).map(|i| json!(i)).collect();

    assert_eq!(seen, expected);
}

#[test]
fn test_listen_and_push_race() {
    let cache = shared_cache(16);

    // (fire count, removed by remove_event_listener) per registration
    let registrations: Vec<Vec<(Arc<AtomicUsize>, bool)>> = thread::scope(|scope| {
        let listeners: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    let mut outcomes = Vec::new();
                    for i in 0..50 {
                        let fired = Arc::new(AtomicUsize::new(0));
                        let counter = Arc::clone(&fired);
                        let listen = cache.add_event_listener(
                            &5,
                            move |events| {
                                assert_eq!(events.len(), 1);
                                counter.fetch_add(1, Ordering::SeqCst);
                            },
                            None,
                        );
                        let id = listen.listener_id().cloned().unwrap();
                        // Leave every other registration for the pushes.
                        let removed = i % 2 == 0 && cache.remove_event_listener(&5, &id);
                        outcomes.push((fired, removed));
                    }
                    outcomes
                })
            })
            .collect();

        for i in 0..100 {
            cache.push(&5, "event", json!(i));
        }

        listeners
            .into_iter()
            .map(|listener| listener.join().unwrap())
            .collect()
    });

    // Consume whatever is still registered.
    cache.push(&5, "event", json!("final"));
    assert_eq!(cache.listener_count(&5), 0);

    for (fired, removed) in registrations.iter().flatten() {
        let fired = fired.load(Ordering::SeqCst);
        if *removed {
            assert_eq!(fired, 0, "removed listener was notified");
        } else {
            assert_eq!(fired, 1, "listener not notified exactly once");
        }
    }
}
