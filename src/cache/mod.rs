//! TTL caching behind an injected capability, with a substitutable clock.

use crate::domain::TimeMs;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> TimeMs;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeMs {
        TimeMs::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start: TimeMs) -> Self {
        Self {
            now_ms: AtomicI64::new(start.as_ms()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, at: TimeMs) {
        self.now_ms.store(at.as_ms(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeMs {
        TimeMs::new(self.now_ms.load(Ordering::SeqCst))
    }
}

/// Key/value store whose entries expire after a per-entry TTL.
pub trait CacheStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set_with_ttl(&self, key: &str, value: V, ttl: Duration);
}

struct Entry<V> {
    value: V,
    expires_at: TimeMs,
}

/// Process-local cache. Entries are dropped when read after expiry or
/// swept by `purge_expired`.
pub struct MemoryCache<V> {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone + Send> MemoryCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<V: Clone + Send> CacheStore<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = TimeMs::new(
            self.clock
                .now()
                .as_ms()
                .saturating_add(ttl.as_millis() as i64),
        );
        self.lock()
            .insert(key.to_string(), Entry { value, expires_at });
    }
}

impl<V> std::fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish_non_exhaustive()
    }
}
