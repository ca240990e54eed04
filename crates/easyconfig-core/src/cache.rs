//! Read-through result-set cache partitioned into named regions.
//!
//! Group-shaped queries share `config_group`, exact-key queries use
//! `config_key`. Keys inside a region must encode every bound query
//! parameter, otherwise two query shapes in the same region would read each
//! other's result sets.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::error::{ConfigError, Result};

/// Named cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheRegion {
    ConfigGroup,
    ConfigKey,
}

impl CacheRegion {
    pub const ALL: [Self; 2] = [Self::ConfigGroup, Self::ConfigKey];

    #[must_use]
    const fn index(self) -> usize {
        match self {
            Self::ConfigGroup => 0,
            Self::ConfigKey => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigGroup => "config_group",
            Self::ConfigKey => "config_key",
        }
    }
}

impl fmt::Display for CacheRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Injected cache used by the store for its query methods.
pub trait CachePort<E>: Send + Sync {
    /// Return the cached result set for `key`, or run `compute` and cache
    /// its result. Errors from `compute` are returned and never cached.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute`, or a storage error if the cache
    /// itself is unusable.
    fn get_or_compute(
        &self,
        region: CacheRegion,
        key: &str,
        compute: &mut dyn FnMut() -> Result<Vec<E>>,
    ) -> Result<Vec<E>>;

    /// Drop every result set in `region`.
    fn invalidate(&self, region: CacheRegion);

    fn invalidate_all(&self) {
        for region in CacheRegion::ALL {
            self.invalidate(region);
        }
    }
}

impl<E, C: CachePort<E> + ?Sized> CachePort<E> for Box<C> {
    fn get_or_compute(
        &self,
        region: CacheRegion,
        key: &str,
        compute: &mut dyn FnMut() -> Result<Vec<E>>,
    ) -> Result<Vec<E>> {
        (**self).get_or_compute(region, key, compute)
    }

    fn invalidate(&self, region: CacheRegion) {
        (**self).invalidate(region);
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<E> CachePort<E> for NoCache {
    fn get_or_compute(
        &self,
        _region: CacheRegion,
        _key: &str,
        compute: &mut dyn FnMut() -> Result<Vec<E>>,
    ) -> Result<Vec<E>> {
        compute()
    }

    fn invalidate(&self, _region: CacheRegion) {}
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// In-process region cache.
///
/// Each region carries a generation bumped on invalidation. A result set
/// computed across an invalidation is returned to its caller but not stored.
pub struct RegionCache<E> {
    regions: Mutex<HashMap<CacheRegion, HashMap<String, Vec<E>>>>,
    generations: [AtomicU64; 2],
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<E: Clone> RegionCache<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(HashMap::new()),
            generations: [AtomicU64::new(0), AtomicU64::new(0)],
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached result sets in `region`.
    #[must_use]
    pub fn len(&self, region: CacheRegion) -> usize {
        self.regions
            .lock()
            .map(|regions| regions.get(&region).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        CacheRegion::ALL.iter().all(|r| self.len(*r) == 0)
    }
}

impl<E: Clone> Default for RegionCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + Sync> CachePort<E> for RegionCache<E> {
    fn get_or_compute(
        &self,
        region: CacheRegion,
        key: &str,
        compute: &mut dyn FnMut() -> Result<Vec<E>>,
    ) -> Result<Vec<E>> {
        let generation = &self.generations[region.index()];
        let started = {
            let regions = self
                .regions
                .lock()
                .map_err(|_| ConfigError::poisoned("cache"))?;
            if let Some(hit) = regions.get(&region).and_then(|r| r.get(key)) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(%region, key, "cache hit");
                return Ok(hit.clone());
            }
            generation.load(Ordering::Acquire)
        };

        // Computed outside the lock; a concurrent miss on the same key
        // computes twice and the later insert wins.
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(%region, key, "cache miss");
        let rows = compute()?;

        let mut regions = self
            .regions
            .lock()
            .map_err(|_| ConfigError::poisoned("cache"))?;
        if generation.load(Ordering::Acquire) == started {
            regions
                .entry(region)
                .or_default()
                .insert(key.to_string(), rows.clone());
        } else {
            trace!(%region, key, "region invalidated during compute; not cached");
        }

        Ok(rows)
    }

    fn invalidate(&self, region: CacheRegion) {
        // A poisoned map is cleared as well; stale sets must not survive.
        let mut regions = match self.regions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.generations[region.index()].fetch_add(1, Ordering::AcqRel);
        if regions.remove(&region).is_some() {
            trace!(%region, "cache region invalidated");
        }
    }
}
