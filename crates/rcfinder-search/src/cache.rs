//! TTL + LRU cache for search results.
//!
//! The one piece of shared mutable state in the search pipeline. A plain
//! synchronized map is enough at this scale; entries expire by TTL and the
//! least-recently-used entry is evicted once the capacity bound is hit.
//! Uses `tokio::time::Instant` so paused-clock tests can drive expiry.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in recency order; most recently used at the back.
    order: VecDeque<String>,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Returns a clone of the live entry for `key`, refreshing its recency.
    /// Expired entries are removed on access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        let value = inner.entries[key].value.clone();
        Self::touch(&mut inner.order, key);
        Some(value)
    }

    /// Inserts `value` under `key`, evicting the least-recently-used entry
    /// if the capacity bound is exceeded.
    pub fn insert(&self, key: String, value: V) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        Self::touch(&mut inner.order, &key);
        while inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(order: &mut VecDeque<String>, key: &str) {
        order.retain(|k| k != key);
        order.push_back(key.to_string());
    }
}
