use super::protocol::{CacheRequest, CacheResponse, Operator};
use crate::error::CacheError;
use crate::storage::cache::{BitMapCache, NonzeroRun};
use crate::storage::registry::CacheRegistry;
use crate::storage::types::{BitWidth, CacheInfo};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The single serialization point in front of every cache.
///
/// Owns the registry behind one mutex: resolving a cache and running an
/// operator on it happen inside the same critical section, so no caller ever
/// observes a half-updated counter of a shared-word layout.
pub struct CacheService {
    registry: Mutex<CacheRegistry>,
}

impl CacheService {
    /// Creates a service whose caches all hold `capacity` ids.
    pub fn new(capacity: u64) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(CacheRegistry::new(capacity)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheRegistry> {
        self.registry.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Cache lock was poisoned by a panicking request, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Validates and executes one request.
    ///
    /// Width, operator and array lengths are checked before the lock is taken;
    /// nothing is mutated when any of them is invalid.
    pub fn dispatch(&self, request: CacheRequest) -> Result<CacheResponse, CacheError> {
        let width = BitWidth::try_from(request.width)?;
        let operator: Operator = request.operator.parse()?;

        if operator == Operator::Sync && request.ids.len() != request.flags.len() {
            return Err(CacheError::LengthMismatch {
                ids: request.ids.len(),
                flags: request.flags.len(),
            });
        }

        let mut registry = self.lock();

        if operator == Operator::Info {
            if let Some(cache) = registry.get(&request.name)
                && cache.width() != width
            {
                return Err(CacheError::WidthMismatch {
                    name: request.name,
                    existing: cache.bits(),
                    requested: width.bits(),
                });
            }
            log_caches(&registry.info());
            return Ok(CacheResponse::default());
        }

        let cache = registry.resolve(&request.name, width)?;
        match operator {
            Operator::Get => get_flags(cache, &request),
            Operator::Set => mark_current_window(cache, &request),
            Operator::Sync => merge_flags(cache, &request),
            Operator::Shift => {
                cache.age_by_one_window();
                tracing::info!(
                    "Shifted cache '{}' width={} max_id={} count={}",
                    request.name,
                    width,
                    cache.max_seen_id(),
                    cache.occupancy()
                );
                Ok(CacheResponse::default())
            }
            Operator::Info => Ok(CacheResponse::default()),
        }
    }

    pub fn info(&self) -> Vec<CacheInfo> {
        self.lock().info()
    }

    /// Logs name, width, max id and occupancy of every live cache.
    pub fn log_info(&self) {
        log_caches(&self.info());
    }

    pub fn cache_list(&self) -> Vec<(String, BitWidth)> {
        self.lock().list()
    }

    /// Collects the next run of nonzero counters of `name` under the lock.
    ///
    /// Returns `None` if the cache does not exist.
    pub fn collect_nonzero(
        &self,
        name: &str,
        from: u64,
        max_entries: usize,
        scan_limit: u64,
    ) -> Option<NonzeroRun> {
        self.lock()
            .get(name)
            .map(|cache| cache.collect_nonzero(from, max_entries, scan_limit))
    }
}

fn in_range(id: i64, capacity: u64) -> Option<u64> {
    u64::try_from(id).ok().filter(|&id| id < capacity)
}

fn report_skipped(request: &CacheRequest, skipped: usize, capacity: u64) {
    if skipped > 0 {
        tracing::warn!(
            "Skipped {} out-of-range ids in {} on '{}' (capacity {})",
            skipped,
            request.operator,
            request.name,
            capacity
        );
    }
}

fn get_flags(cache: &BitMapCache, request: &CacheRequest) -> Result<CacheResponse, CacheError> {
    let mut response = CacheResponse::default();
    let mut skipped = 0;

    for &raw in &request.ids {
        match in_range(raw, cache.capacity()) {
            Some(id) => {
                response.ids.push(raw);
                response.flags.push(cache.get_flags(id)?);
            }
            None => {
                tracing::debug!("GET '{}': id {} out of range", request.name, raw);
                skipped += 1;
            }
        }
    }

    report_skipped(request, skipped, cache.capacity());
    Ok(response)
}

fn mark_current_window(
    cache: &mut BitMapCache,
    request: &CacheRequest,
) -> Result<CacheResponse, CacheError> {
    let mut response = CacheResponse::default();
    let mut skipped = 0;

    for &raw in &request.ids {
        match in_range(raw, cache.capacity()) {
            Some(id) => {
                if cache.set_last_window_flag(id)? {
                    response.ids.push(raw);
                }
            }
            None => {
                tracing::debug!("SET '{}': id {} out of range", request.name, raw);
                skipped += 1;
            }
        }
    }

    report_skipped(request, skipped, cache.capacity());
    Ok(response)
}

fn merge_flags(cache: &mut BitMapCache, request: &CacheRequest) -> Result<CacheResponse, CacheError> {
    let mut skipped = 0;

    for (&raw, &incoming) in request.ids.iter().zip(&request.flags) {
        match in_range(raw, cache.capacity()) {
            Some(id) => {
                let merged = cache.get_flags(id)? | incoming;
                cache.set_flags(id, merged)?;
            }
            None => {
                tracing::debug!("SYNC '{}': id {} out of range", request.name, raw);
                skipped += 1;
            }
        }
    }

    report_skipped(request, skipped, cache.capacity());
    Ok(CacheResponse::default())
}

fn log_caches(caches: &[CacheInfo]) {
    if caches.is_empty() {
        tracing::info!("No caches yet");
    }
    for info in caches {
        tracing::info!(
            "Cache '{}' width={} max_id={} count={}",
            info.name,
            info.width,
            info.max_seen_id,
            info.occupancy
        );
    }
}
