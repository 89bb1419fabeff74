// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keyed cache with a fixed time-to-live.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Entries older than `ttl` are treated as absent. Callers pass `now`.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // A timestamp in the future counts as fresh.
        now.signed_duration_since(stored_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }

    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let fresh = self.entries.get(key).map(|entry| {
            (
                self.is_fresh(entry.stored_at, now),
                entry.value.clone(),
            )
        })?;

        match fresh {
            (true, value) => Some(value),
            (false, _) => {
                self.entries.remove(key);
                None
            }
        }
    }

    pub fn insert(&self, key: String, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| self.is_fresh(entry.stored_at, now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
