//! Thumbnail URL memoization.
//!
//! Computing a thumbnail URL means touching the filesystem (and on a cold
//! start, decoding and re-encoding an image). Pages render the same
//! thumbnails over and over, so the resulting URL is remembered for a while
//! in an in-process TTL map.
//!
//! ## Cache keys
//!
//! Keys are built by [`ThumbnailKey::cache_key`](crate::thumbnail::ThumbnailKey::cache_key):
//! `thumbs|<relative thumb path>|<absolute flag>`. The absolute flag is part
//! of the key because the same file is served under two different URLs.
//!
//! ## Expiry
//!
//! Entries live for `[thumbnails] ttl_secs` (24 hours by default). An expired
//! entry is simply recomputed; the thumbnail file itself is never removed, so
//! recomputation after expiry is a cheap existence check.

use moka::sync::Cache;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Upper bound on memoized URLs.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default lifetime of a memoized URL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Thread-safe TTL map from cache key to URL.
///
/// Cloning is cheap and clones share storage.
#[derive(Clone)]
pub struct UrlCache {
    inner: Cache<String, String>,
}

impl UrlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(DEFAULT_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: String, url: String) {
        self.inner.insert(key, url);
    }

    /// Drop every memoized URL.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for UrlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl fmt::Debug for UrlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

/// Counters describing how thumbnail requests were served.
///
/// Atomic so a single cache can be shared across rayon workers.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU32,
    misses: AtomicU32,
    generated: AtomicU32,
    failed: AtomicU32,
}

impl CacheStats {
    /// URL came straight from the memo.
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// URL had to be recomputed.
    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A thumbnail file was written. Always paired with a [`miss`](Self::miss).
    pub fn generate(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Generating a thumbnail failed. Always paired with a [`miss`](Self::miss).
    pub fn fail(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u32 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn generated(&self) -> u32 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Misses answered by a thumbnail already on disk.
    pub fn on_disk(&self) -> u32 {
        self.misses()
            .saturating_sub(self.generated())
            .saturating_sub(self.failed())
    }

    pub fn total(&self) -> u32 {
        self.hits() + self.misses()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hits, on_disk, generated) = (self.hits(), self.on_disk(), self.generated());
        if on_disk > 0 {
            write!(
                f,
                "{} cached, {} on disk, {} generated ({} total)",
                hits,
                on_disk,
                generated,
                self.total()
            )
        } else if hits > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                hits,
                generated,
                self.total()
            )
        } else {
            write!(f, "{} generated", generated)
        }
    }
}
