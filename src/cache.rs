//! Directory listing cache
//!
//! Caches raw remote listings per remote directory path. Every mutating
//! operation invalidates the affected directories so the next list
//! observes the change. Concurrent invalidations may race with reads;
//! the worst case is one extra remote listing, never stale writes.

use dashmap::DashMap;

use crate::model::Object;
use crate::paths::clean_path;

/// Concurrent map of remote directory path to its listed children.
#[derive(Default)]
pub struct ListingCache {
    entries: DashMap<String, Vec<Object>>,
}

impl ListingCache {
    pub fn new() -> Self {
        ListingCache {
            entries: DashMap::new(),
        }
    }

    /// Cached children of a remote directory, if present.
    pub fn get(&self, dir_path: &str) -> Option<Vec<Object>> {
        self.entries
            .get(&clean_path(dir_path))
            .map(|e| e.value().clone())
    }

    /// Store the children of a remote directory.
    pub fn insert(&self, dir_path: &str, children: Vec<Object>) {
        self.entries.insert(clean_path(dir_path), children);
    }

    /// Drop the cached listing for one remote directory.
    pub fn invalidate(&self, dir_path: &str) {
        self.entries.remove(&clean_path(dir_path));
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
