//! # Ring Cache Demo
//!
//! End-to-end demonstration against a simulated slow backend:
//!
//! - batched resolution (one backend round-trip per miss batch)
//! - negative caching (unknown keys are remembered as absent)
//! - explicit invalidation forcing a re-fetch
//! - generation rollover on a short rotation period
//!
//! ```bash
//! cargo run -p ringcache --bin demo
//! ```

use rand::Rng;
use ringcache::{resolver_fn, CacheConfig, RingCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pretend backend: knows users u0..u7, takes 5–40ms per batch.
fn backend_resolver(
    round_trips: Arc<AtomicUsize>,
) -> impl ringcache::Resolver<String, String> + 'static {
    resolver_fn(move |keys: Vec<String>| {
        let round_trips = Arc::clone(&round_trips);
        async move {
            let jitter = rand::thread_rng().gen_range(5..40);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            round_trips.fetch_add(1, Ordering::Relaxed);

            Ok(keys
                .into_iter()
                .map(|k| {
                    let known = k
                        .strip_prefix('u')
                        .and_then(|n| n.parse::<u32>().ok())
                        .is_some_and(|n| n < 8);
                    let value = known.then(|| format!("profile-of-{k}"));
                    (k, value)
                })
                .collect::<Vec<_>>())
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ringcache::CacheError> {
    let round_trips = Arc::new(AtomicUsize::new(0));
    let config = CacheConfig::default()
        .with_bucket_count(3)
        .with_generation_period(Duration::from_secs(2));
    let cache = RingCache::open("users", backend_resolver(Arc::clone(&round_trips)), config)?;

    println!("=== cold batch (everything misses) ===");
    let started = Instant::now();
    let batch: Vec<String> = (0..6).map(|n| format!("u{n}")).collect();
    let result = cache.get_many_tuples(batch.clone()).await?;
    println!(
        "resolved {} keys in {:?} using {} backend round-trip(s)",
        result.len(),
        started.elapsed(),
        round_trips.load(Ordering::Relaxed)
    );

    println!("\n=== warm batch (everything hits) ===");
    let started = Instant::now();
    cache.get_many_tuples(batch).await?;
    println!(
        "same keys in {:?}; backend round-trips still {}",
        started.elapsed(),
        round_trips.load(Ordering::Relaxed)
    );

    println!("\n=== negative caching ===");
    for _ in 0..2 {
        let value = cache.get("u99".to_string()).await?;
        println!(
            "u99 -> {value:?} (backend round-trips: {})",
            round_trips.load(Ordering::Relaxed)
        );
    }

    println!("\n=== explicit invalidation ===");
    cache.delete("u3".to_string())?;
    cache.inspect_order().await?; // wait for the delete to apply
    let value = cache.get("u3".to_string()).await?;
    println!(
        "u3 after delete -> {value:?} (backend round-trips: {})",
        round_trips.load(Ordering::Relaxed)
    );

    println!("\n=== generation rollover ===");
    println!("ring order before: {:?}", cache.inspect_order().await?);
    tokio::time::sleep(Duration::from_millis(6500)).await;
    println!("ring order after:  {:?}", cache.inspect_order().await?);
    let before = round_trips.load(Ordering::Relaxed);
    cache.get("u0".to_string()).await?;
    println!(
        "u0 after rollover re-resolved: {}",
        round_trips.load(Ordering::Relaxed) > before
    );

    cache.shutdown().await;
    println!("\ncache shut down cleanly");
    Ok(())
}
