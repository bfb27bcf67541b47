//! Bounded per-title cache of media lookups.
//!
//! Least-recently-used entries are evicted once `capacity` titles are held.
//! Not-found results are cached too, so a title with no media is not
//! searched again until it falls out of the cache. Concurrent lookups of the
//! same title share a single fetch.

use super::MediaSignal;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: u64 = 50;

/// Where a cached lookup's signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Already cached, or fetched by a concurrent caller.
    Hit,
    /// Fetched by this call and now cached.
    Fetched,
}

pub struct MediaCache {
    cache: Cache<String, MediaSignal>,
}

impl MediaCache {
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    pub async fn get(&self, title: &str) -> Option<MediaSignal> {
        self.cache.get(title).await
    }

    pub async fn insert(&self, title: String, signal: MediaSignal) {
        self.cache.insert(title, signal).await;
    }

    /// Returns the cached signal of `title`, running `fetch` when there is
    /// none. While a fetch is in flight, other callers for the same title
    /// wait for it instead of starting their own. An `Err` is handed to every
    /// waiter and nothing is cached.
    pub async fn get_or_fetch<F, E>(
        &self,
        title: &str,
        fetch: F,
    ) -> Result<(MediaSignal, Lookup), Arc<E>>
    where
        F: Future<Output = Result<MediaSignal, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self
            .cache
            .entry_by_ref(title)
            .or_try_insert_with(fetch)
            .await?;
        let lookup = if entry.is_fresh() {
            Lookup::Fetched
        } else {
            Lookup::Hit
        };
        Ok((entry.into_value(), lookup))
    }

    /// Number of cached titles. Eventually consistent with recent inserts
    /// until [`MediaCache::sync`] runs.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies pending evictions and recency updates.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MediaCache {
    fn default() -> Self {
        MediaCache::new(DEFAULT_CAPACITY)
    }
}
