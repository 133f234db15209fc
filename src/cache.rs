//! Shared, thread-safe cache of parsed yield curves
//!
//! Entries are keyed by a curve file's canonical path plus its modification
//! time, so rewriting a file naturally misses the old entry. The store is
//! bounded two ways:
//!
//! - **Size**: when an insert pushes the store past `max_size`, the
//!   least-recently-accessed entry is evicted
//! - **Age**: an entry older than `ttl` (since insertion) counts as a miss and
//!   is reloaded; a zero `ttl` disables expiry
//!
//! The store and its hit/miss/eviction counters live behind one mutex, so the
//! totals stay exact under concurrent access. Loads are serialized per key:
//! concurrent requests for the same key invoke the loader once while requests
//! for other keys proceed in parallel.

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::curve::{CurveLimits, RawCurve, YieldCurve};
use crate::error::PricerError;

/// Identity of a curve source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: PathBuf,
    modified: SystemTime,
}

impl CacheKey {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}

/// Cache policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    /// When false every lookup calls the loader and counters stay at zero
    pub enabled: bool,

    /// Maximum number of cached curves (at least 1)
    pub max_size: usize,

    /// Maximum age since insertion; zero disables expiry
    pub ttl: Duration,

    /// Rules applied to loader output before it is cached
    pub limits: CurveLimits,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 4,
            ttl: Duration::from_secs(300),
            limits: CurveLimits::default(),
        }
    }
}

/// Point-in-time view of cache counters and policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: f64,
    pub enabled: bool,
}

impl CacheMetrics {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    curve: Arc<YieldCurve>,
    inserted_at: Instant,
    /// Monotonic access stamp for LRU order
    access_seq: u64,
}

#[derive(Debug, Default)]
struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    seq: u64,
}

impl CacheStore {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// TTL/LRU cache of validated curves, shared across pricing threads
#[derive(Debug)]
pub struct CurveCache {
    settings: CacheSettings,
    store: Mutex<CacheStore>,
    load_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl CurveCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            store: Mutex::new(CacheStore::default()),
            load_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Return the cached curve for `key`, loading and validating it on a miss
    ///
    /// Loader errors are returned unchanged; curve validation failures are
    /// converted into the loader's error type.
    pub fn get_or_load<F, E>(&self, key: &CacheKey, loader: F) -> Result<Arc<YieldCurve>, E>
    where
        F: FnOnce(&CacheKey) -> Result<RawCurve, E>,
        E: From<PricerError>,
    {
        if !self.settings.enabled {
            let raw = loader(key)?;
            return Ok(Arc::new(YieldCurve::from_raw(raw, &self.settings.limits)?));
        }

        let slot = self.load_slot(key);
        let result = {
            let _loading = slot.lock();
            self.lookup_or_load(key, loader)
        };
        self.release_slot(key, slot);
        result
    }

    fn lookup_or_load<F, E>(&self, key: &CacheKey, loader: F) -> Result<Arc<YieldCurve>, E>
    where
        F: FnOnce(&CacheKey) -> Result<RawCurve, E>,
        E: From<PricerError>,
    {
        if let Some(curve) = self.lookup(key) {
            return Ok(curve);
        }

        let raw = loader(key)?;
        let curve = Arc::new(YieldCurve::from_raw(raw, &self.settings.limits)?);
        self.insert(key.clone(), Arc::clone(&curve));
        Ok(curve)
    }

    /// Hit: bump recency and count. Expired or absent: count a miss.
    fn lookup(&self, key: &CacheKey) -> Option<Arc<YieldCurve>> {
        let now = Instant::now();
        let mut guard = self.store.lock();
        let store = &mut *guard;
        let seq = store.next_seq();

        match store.entries.get_mut(key) {
            Some(entry) if !self.is_expired(&*entry, now) => {
                entry.access_seq = seq;
                store.hits += 1;
                debug!("Curve cache hit for {}", key.path.display());
                Some(Arc::clone(&entry.curve))
            }
            Some(_) => {
                store.entries.remove(key);
                store.misses += 1;
                debug!("Curve cache entry for {} expired", key.path.display());
                None
            }
            None => {
                store.misses += 1;
                debug!("Curve cache miss for {}", key.path.display());
                None
            }
        }
    }

    fn insert(&self, key: CacheKey, curve: Arc<YieldCurve>) {
        let now = Instant::now();
        let mut guard = self.store.lock();
        let store = &mut *guard;
        let seq = store.next_seq();

        store.entries.insert(
            key,
            CacheEntry {
                curve,
                inserted_at: now,
                access_seq: seq,
            },
        );

        while store.entries.len() > self.settings.max_size {
            let victim = store
                .entries
                .iter()
                .min_by_key(|(_, e)| e.access_seq)
                .map(|(k, _)| k.clone());
            match victim {
                Some(k) => {
                    store.entries.remove(&k);
                    store.evictions += 1;
                    debug!("Evicted curve cache entry for {}", k.path.display());
                }
                None => break,
            }
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        !self.settings.ttl.is_zero() && now.duration_since(entry.inserted_at) > self.settings.ttl
    }

    fn load_slot(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut slots = self.load_locks.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    fn release_slot(&self, key: &CacheKey, slot: Arc<Mutex<()>>) {
        let mut slots = self.load_locks.lock();
        drop(slot);
        if slots.get(key).map_or(false, |s| Arc::strong_count(s) == 1) {
            slots.remove(key);
        }
    }

    /// Drop one entry; returns whether it was present
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.store.lock().entries.remove(key).is_some()
    }

    /// Drop every generation (modification time) cached for `path`
    pub fn invalidate_path(&self, path: &Path) -> usize {
        let mut store = self.store.lock();
        let before = store.entries.len();
        store.entries.retain(|k, _| k.path != path);
        before - store.entries.len()
    }

    /// Whether `key` is currently cached, without touching recency or counters
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.store.lock().entries.contains_key(key)
    }

    /// Clear all cached curves and counters
    pub fn clear(&self) {
        let mut store = self.store.lock();
        *store = CacheStore::default();
    }

    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        let store = self.store.lock();
        CacheMetrics {
            hits: store.hits,
            misses: store.misses,
            evictions: store.evictions,
            size: store.entries.len(),
            max_size: self.settings.max_size,
            ttl_seconds: self.settings.ttl.as_secs_f64(),
            enabled: self.settings.enabled,
        }
    }
}

impl Default for CurveCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}
