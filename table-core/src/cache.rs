//! # Query Cache
//!
//! The one resource shared between table instances: fetched pages keyed by
//! `QueryKey`. Instances with different keys never see each other's entries.
//! A successful mutation drops every entry of its endpoint.
//!
//! The map is bounded: stale entries are evicted on insert, and past
//! `max_entries` the oldest entries go first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::models::PageEnvelope;
use crate::domain::query_key::QueryKey;

pub const DEFAULT_MAX_ENTRIES: usize = 100;

struct CacheEntry<R> {
    page: PageEnvelope<R>,
    fetched_at: Instant,
    /// Insertion order, for eviction
    seq: u64,
}

/// Cloning shares the underlying map
pub struct QueryCache<R> {
    entries: Arc<Mutex<HashMap<QueryKey, CacheEntry<R>>>>,
    stale_after: Duration,
    max_entries: usize,
}

impl<R> Clone for QueryCache<R> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            stale_after: self.stale_after,
            max_entries: self.max_entries,
        }
    }
}

impl<R: Clone> QueryCache<R> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stale_after,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Cached page for `key` if present and not stale
    pub fn get_fresh(&self, key: &QueryKey) -> Option<PageEnvelope<R>> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() > self.stale_after {
            return None;
        }
        Some(entry.page.clone())
    }

    pub fn insert(&self, key: QueryKey, page: PageEnvelope<R>) {
        let mut entries = self.lock();
        let stale_after = self.stale_after;
        entries.retain(|_, entry| entry.fetched_at.elapsed() <= stale_after);

        while entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            debug!("Evicting cached page {}", oldest);
            entries.remove(&oldest);
        }

        let seq = entries.values().map(|entry| entry.seq + 1).max().unwrap_or(0);
        entries.insert(
            key,
            CacheEntry {
                page,
                fetched_at: Instant::now(),
                seq,
            },
        );
    }

    /// Drop every entry of `endpoint` so the next load refetches
    pub fn invalidate_endpoint(&self, endpoint: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| key.endpoint() != endpoint);
        let count = before - entries.len();
        debug!("Invalidated {} cached pages of {}", count, endpoint);
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry<R>>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
