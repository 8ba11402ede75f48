//! Read-through cache demo: a byte-budgeted document cache.
//!
//! Replays a Zipf(s=1.0) access trace against a cache whose retriever
//! fabricates documents on demand, with the document size as the entry
//! cost.  Prints hit-rate and eviction figures at the end.
//!
//! Run with:
//!     cargo run --example readthrough --release

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lungo::CacheBuilder;

/// Total cost budget in bytes.
const BUDGET: i64 = 1 << 20; // 1 MiB
/// Key universe size.
const POOL: usize = 100_000;
/// Number of accesses in the trace.
const TRACE: usize = 500_000;

// ---------------------------------------------------------------------------
// Zipf(s=1.0) sampler — no external dependency required.
//
// Inverse-CDF derivation:
//   P(X ≤ k) ≈ ln(k) / ln(N)   for large N
//   ⟹  k = N^u  where u ~ Uniform[0,1]
// ---------------------------------------------------------------------------

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns a uniform float in (0, 1].
    fn uniform(&mut self) -> f64 {
        let bits = self.next() >> 11;
        (bits + 1) as f64 / (1u64 << 53) as f64
    }

    /// Zipf(s=1) sample in [0, pool).
    fn zipf(&mut self, pool: usize) -> usize {
        let u = self.uniform();
        let k = (pool as f64).powf(u) as usize;
        k.saturating_sub(1).min(pool - 1)
    }
}

/// Fabricates the "document" for a key: a pseudo-random payload between
/// 64 bytes and ~4 KiB, deterministic per key.
fn fabricate(key: u64) -> Vec<u8> {
    let mut rng = Xorshift64(key.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1);
    let len = 64 + (rng.next() % 4032) as usize;
    (0..len).map(|_| rng.next() as u8).collect()
}

fn main() {
    println!("lungo read-through demo");
    println!("  budget       : {BUDGET} bytes");
    println!("  key universe : {POOL} documents");
    println!("  trace length : {TRACE} accesses");
    println!();

    let retrievals = Arc::new(AtomicU64::new(0));
    let evicted_bytes = Arc::new(AtomicU64::new(0));

    let counted = Arc::clone(&retrievals);
    let reclaimed = Arc::clone(&evicted_bytes);
    let mut cache: lungo::Cache<u64, Vec<u8>> = CacheBuilder::new(BUDGET)
        .retriever(move |key: &u64| {
            counted.fetch_add(1, Ordering::Relaxed);
            let doc = fabricate(*key);
            let cost = doc.len() as i64;
            Ok((doc, cost))
        })
        .eviction_listener(move |_key: &u64, doc, _cause| {
            reclaimed.fetch_add(doc.len() as u64, Ordering::Relaxed);
        })
        .build();

    let mut rng = Xorshift64(0xDEAD_BEEF_1234_5678);
    let start = Instant::now();
    for _ in 0..TRACE {
        let key = rng.zipf(POOL) as u64;
        cache
            .get(&key)
            .expect("the demo retriever never fails");
    }
    let elapsed = start.elapsed();

    let stats = cache.stats();
    println!("  hits         : {}", stats.hits);
    println!("  misses       : {}", stats.misses);
    println!("  hit rate     : {:.2}%", stats.hit_rate * 100.0);
    println!("  retrievals   : {}", retrievals.load(Ordering::Relaxed));
    println!("  evictions    : {}", stats.evictions);
    println!(
        "  reclaimed    : {} bytes",
        evicted_bytes.load(Ordering::Relaxed)
    );
    println!("  resident     : {} entries, {} bytes", cache.len(), cache.cost());
    println!("  elapsed      : {:.1} ms", elapsed.as_millis());
}
