//! Time-bounded memoization of upstream fetches.
//!
//! Entries are keyed by (start date, requested series set) and are immutable
//! once written: a stale entry is replaced by a fresh fetch, never patched.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::debug;

use crate::data::{FetchOutcome, SeriesSource, fetch_all};
use crate::domain::SeriesName;

type CacheKey = (NaiveDate, BTreeSet<SeriesName>);

struct CacheEntry {
    fetched_at: Instant,
    outcome: Arc<FetchOutcome>,
}

pub struct SeriesCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached outcome for (`start`, `names`) if it is still fresh,
    /// otherwise fetch and store a new one.
    pub fn get_or_fetch<S: SeriesSource + ?Sized>(
        &mut self,
        source: &S,
        names: &[SeriesName],
        start: NaiveDate,
    ) -> Arc<FetchOutcome> {
        let key: CacheKey = (start, names.iter().copied().collect());

        if let Some(entry) = self.entries.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!(%start, series = key.1.len(), "cache hit");
                return Arc::clone(&entry.outcome);
            }
            debug!(%start, "cache entry expired");
        }

        let outcome = Arc::new(fetch_all(source, names, start));
        self.entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                outcome: Arc::clone(&outcome),
            },
        );
        self.evict_expired();
        outcome
    }

    /// Drop every entry, forcing the next call to refetch.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.fetched_at.elapsed() < ttl);
    }
}
