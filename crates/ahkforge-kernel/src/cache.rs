//! Validation result cache keyed by path and modification time.
//!
//! The cache does no I/O. Callers stat the file and pass the timestamp in,
//! so a hit means "same path, same mtime as when this result was stored".
//! An entry whose timestamp no longer matches is a miss; the next `put`
//! overwrites it.
//!
//! One `RwLock` guards the whole map. Lookups share the read lock and writes
//! replace a single entry, last writer wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use ahkforge_types::ValidationResult;
use tracing::trace;

/// One cached verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub result: ValidationResult,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Thread-safe validation cache. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `path` if it was stored with exactly `modified`.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<ValidationResult> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let hit = entries
            .get(path)
            .filter(|entry| entry.modified == modified)
            .map(|entry| entry.result.clone());

        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        trace!(path = %path.display(), hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Insert or overwrite the entry for `path`.
    pub fn put(&self, path: impl Into<PathBuf>, modified: SystemTime, result: ValidationResult) {
        let path = path.into();
        let entry = CacheEntry {
            path: path.clone(),
            modified,
            result,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, entry);
    }

    /// Cached result, or compute, store and return a fresh one.
    ///
    /// The flag is true when the result came from the cache.
    pub fn get_or_insert_with<F>(
        &self,
        path: &Path,
        modified: SystemTime,
        compute: F,
    ) -> (ValidationResult, bool)
    where
        F: FnOnce() -> ValidationResult,
    {
        if let Some(result) = self.get(path, modified) {
            return (result, true);
        }
        let result = compute();
        self.put(path, modified, result.clone());
        (result, false)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Drop one entry. Returns whether it existed.
    pub fn clear_entry(&self, path: &Path) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    /// Snapshot of the stored entry for `path`, whatever its timestamp.
    pub fn entry(&self, path: &Path) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
