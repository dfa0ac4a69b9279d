// ── Cache partition ──
//
// Keyed cache-aside storage with in-flight coalescing. Each key holds the
// last good payload, when it was fetched, and whether a fetch is running.
// Shard locks are only held between suspension points, never across a
// fetch.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A cached payload and the instant it was fetched.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Arc<Vec<T>>,
    /// `None` once invalidated: the data is still served as a fallback
    /// but never counts as fresh.
    pub fetched_at: Option<Instant>,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Fresh iff `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }
}

struct Slot<T> {
    entry: Option<CacheEntry<T>>,
    in_flight: bool,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            entry: None,
            in_flight: false,
        }
    }

    /// Best payload we have, fresh or not.
    fn current(&self) -> Arc<Vec<T>> {
        self.entry
            .as_ref()
            .map_or_else(|| Arc::new(Vec::new()), |e| Arc::clone(&e.data))
    }
}

pub(crate) struct Partition<K, T> {
    name: &'static str,
    ttl: Duration,
    slots: DashMap<K, Slot<T>>,
}

impl<K, T> Partition<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slots: DashMap::new(),
        }
    }

    /// Serve `key` from cache or run `fetcher` on behalf of every caller.
    ///
    /// - fresh entry and not `force`: cached payload, no fetch
    /// - fetch already running for `key`: best known payload (possibly empty)
    /// - otherwise: fetch; success replaces the entry, failure returns an
    ///   empty payload and leaves the entry untouched
    ///
    /// Dropping the returned future mid-fetch discards the result and frees
    /// the key for the next caller.
    pub(crate) async fn fetch_or_serve<F, Fut, E>(
        &self,
        key: K,
        force: bool,
        fetcher: F,
    ) -> Arc<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        {
            let now = Instant::now();
            let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::empty);

            if !force {
                if let Some(entry) = slot.entry.as_ref().filter(|e| e.is_fresh(now)) {
                    debug!(partition = self.name, ?key, "cache hit");
                    return Arc::clone(&entry.data);
                }
            }

            if slot.in_flight {
                debug!(partition = self.name, ?key, "fetch in flight, serving current data");
                return slot.current();
            }

            slot.in_flight = true;
        }

        let mut flight = InFlight {
            partition: self,
            key,
            done: false,
        };
        let result = fetcher().await;
        flight.complete(result)
    }

    /// Force the next read of `key` to refetch. Data stays as a fallback.
    pub(crate) fn invalidate(&self, key: &K) {
        if let Some(mut slot) = self.slots.get_mut(key) {
            if let Some(entry) = slot.entry.as_mut() {
                entry.fetched_at = None;
            }
        }
    }

    /// Latest stored payload for `key` without fetching.
    pub(crate) fn peek(&self, key: &K) -> Option<Arc<Vec<T>>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref().map(|e| Arc::clone(&e.data)))
    }

    pub(crate) fn is_fresh(&self, key: &K) -> bool {
        let now = Instant::now();
        self.slots
            .get(key)
            .is_some_and(|slot| slot.entry.as_ref().is_some_and(|e| e.is_fresh(now)))
    }

    pub(crate) fn is_loading(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|slot| slot.in_flight)
    }

    /// Whether any key has a fetch running.
    pub(crate) fn any_loading(&self) -> bool {
        self.slots.iter().any(|slot| slot.in_flight)
    }
}

/// Clears the in-flight marker even if the fetching future is dropped.
struct InFlight<'a, K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    partition: &'a Partition<K, T>,
    key: K,
    done: bool,
}

impl<K, T> InFlight<'_, K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    fn complete<E: Display>(&mut self, result: Result<Vec<T>, E>) -> Arc<Vec<T>> {
        self.done = true;
        let partition = self.partition;
        let mut slot = partition
            .slots
            .entry(self.key.clone())
            .or_insert_with(Slot::empty);
        slot.in_flight = false;

        match result {
            Ok(data) => {
                debug!(
                    partition = partition.name,
                    key = ?self.key,
                    rows = data.len(),
                    "cache refreshed"
                );
                let data = Arc::new(data);
                slot.entry = Some(CacheEntry {
                    data: Arc::clone(&data),
                    fetched_at: Some(Instant::now()),
                    ttl: partition.ttl,
                });
                data
            }
            Err(e) => {
                warn!(
                    partition = partition.name,
                    key = ?self.key,
                    error = %e,
                    "fetch failed, keeping previous data"
                );
                Arc::new(Vec::new())
            }
        }
    }
}

impl<K, T> Drop for InFlight<'_, K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(mut slot) = self.partition.slots.get_mut(&self.key) {
            slot.in_flight = false;
        }
        debug!(partition = self.partition.name, key = ?self.key, "fetch abandoned");
    }
}
