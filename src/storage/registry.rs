//! Cache Registry
//!
//! Maps a cache name to exactly one [`BitMapCache`]. Caches are created lazily
//! on first reference and live for the lifetime of the process. The width a
//! name was created with is permanent; asking for another width is an error.

use super::cache::BitMapCache;
use super::types::{BitWidth, CacheInfo};
use crate::error::CacheError;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Registry holding every named cache of this node.
///
/// Not synchronised on its own: the dispatcher owns it behind its lock.
pub struct CacheRegistry {
    capacity: u64,
    caches: HashMap<String, BitMapCache>,
}

impl CacheRegistry {
    /// Creates an empty registry whose caches all get `capacity` ids.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            caches: HashMap::new(),
        }
    }

    /// Returns the cache for `name`, creating it with `width` if absent.
    ///
    /// # Errors
    /// * `WidthMismatch` if `name` already exists with a different width.
    pub fn resolve(&mut self, name: &str, width: BitWidth) -> Result<&mut BitMapCache, CacheError> {
        match self.caches.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let cache = entry.into_mut();
                if cache.width() != width {
                    return Err(CacheError::WidthMismatch {
                        name: name.to_string(),
                        existing: cache.bits(),
                        requested: width.bits(),
                    });
                }
                Ok(cache)
            }
            Entry::Vacant(entry) => {
                let cache = entry.insert(BitMapCache::new(width, self.capacity));
                tracing::info!(
                    "Created cache '{}' width={} capacity={} max_id={} count={}",
                    name,
                    width,
                    cache.capacity(),
                    cache.max_seen_id(),
                    cache.occupancy()
                );
                Ok(cache)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&BitMapCache> {
        self.caches.get(name)
    }

    /// Names and widths of every live cache, sorted by name.
    pub fn list(&self) -> Vec<(String, BitWidth)> {
        let mut names: Vec<(String, BitWidth)> = self
            .caches
            .iter()
            .map(|(name, cache)| (name.clone(), cache.width()))
            .collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        names
    }

    pub fn info(&self) -> Vec<CacheInfo> {
        self.list()
            .into_iter()
            .filter_map(|(name, _)| {
                self.caches.get(&name).map(|cache| CacheInfo {
                    width: cache.bits(),
                    capacity: cache.capacity(),
                    max_seen_id: cache.max_seen_id(),
                    occupancy: cache.occupancy(),
                    name,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
