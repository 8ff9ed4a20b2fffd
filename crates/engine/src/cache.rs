//! Time-boxed read-through cache.
//!
//! ## Semantics
//!
//! - An entry is live while `now - inserted < ttl`; at exactly `ttl` it is dead
//! - A dead entry is evicted on lookup and never returned
//! - `clear()` drops everything regardless of age
//! - Producer failures are returned to the caller and never stored
//!
//! The cache is owned by a single session and mutated through `&mut self`,
//! so a miss either stores a complete value or nothing.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache key for one fetched tab.
///
/// `with_header` is part of the key because the same tab fetched with and
/// without a header row yields different tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub tab: String,
    pub with_header: bool,
    pub bust: Option<String>,
}

impl CacheKey {
    pub fn new(tab: &str, with_header: bool, bust: Option<&str>) -> Self {
        Self {
            tab: tab.to_string(),
            with_header,
            bust: bust.map(str::to_string),
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted: Instant,
}

#[derive(Debug)]
pub struct TimeBoxedCache<K, V, C = SystemClock> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: C,
}

impl<K: Eq + Hash, V: Clone> TimeBoxedCache<K, V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K: Eq + Hash, V: Clone, C: Clock> TimeBoxedCache<K, V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    fn is_live(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted) < self.ttl
    }

    /// Live value for `key`, evicting it if it has expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let live = self.entries.get(key).map(|entry| self.is_live(entry, now))?;
        if live {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Return the live value for `key`, or run `producer` and store its
    /// successful result.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        producer: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = producer()?;
        let inserted = self.clock.now();
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                inserted,
            },
        );
        Ok(value)
    }

    /// Invalidate every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted) < ttl);
        before - self.entries.len()
    }

    /// Number of stored entries, live or not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
