/// Process-wide projector cache keyed by `Shape`
///
/// Entries are never evicted. Each shape gets a slot that is initialized at
/// most once: concurrent first requests for the same shape wait on the slot
/// instead of building twice, while requests for other shapes proceed.
/// Build failures are stored in the slot too, so a broken target type fails
/// fast on every later request.
use crate::codegen::projector::Projector;
use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::shape::Shape;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

pub type Erased = Arc<dyn Any + Send + Sync>;
type Slot = Arc<OnceLock<ProjectionResult<Erased>>>;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Distinct shapes seen
    pub shapes: usize,
    /// Builder invocations (successful or not)
    pub builds: u64,
    /// Requests served from an existing slot
    pub hits: u64,
}

pub struct ShapeCache {
    entries: DashMap<Shape, Slot, ahash::RandomState>,
    builds: AtomicU64,
    hits: AtomicU64,
    /// Warn once when the shape count passes this (0 = never)
    warn_after: usize,
    warned: AtomicBool,
}

impl Default for ShapeCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ShapeCache {
    pub fn new(warn_after: usize) -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            builds: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            warn_after,
            warned: AtomicBool::new(false),
        }
    }

    /// Return the cached value for `shape`, running `build` if this is the first request
    pub fn get_or_create<F>(&self, shape: &Shape, build: F) -> ProjectionResult<Erased>
    where
        F: FnOnce() -> ProjectionResult<Erased>,
    {
        let slot = self.slot(shape);

        let mut built = false;
        let result = slot.get_or_init(|| {
            built = true;
            self.builds.fetch_add(1, Ordering::Relaxed);
            debug!(
                target_type = shape.target_name(),
                columns = shape.len(),
                prefix = shape.prefix().unwrap_or(""),
                "building projector"
            );
            build()
        });
        if !built {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        result.clone()
    }

    /// Typed wrapper over `get_or_create` for projectors
    pub fn get_or_create_projector<T, F>(&self, shape: &Shape, build: F) -> ProjectionResult<Projector<T>>
    where
        T: 'static,
        F: FnOnce() -> ProjectionResult<Projector<T>>,
    {
        let erased = self.get_or_create(shape, || build().map(|p| Arc::new(p) as Erased))?;
        erased
            .downcast::<Projector<T>>()
            .map(|projector| (*projector).clone())
            .map_err(|_| {
                ProjectionError::internal(format!(
                    "cached projector for {} has the wrong type",
                    shape.target_name()
                ))
            })
    }

    /// Existing slot for `shape`, or a fresh one. The map shard lock is
    /// released before the caller initializes the slot.
    fn slot(&self, shape: &Shape) -> Slot {
        if let Some(slot) = self.entries.get(shape) {
            return Arc::clone(slot.value());
        }

        let slot = Arc::clone(
            self.entries
                .entry(shape.clone())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .value(),
        );
        self.check_growth();
        slot
    }

    fn check_growth(&self) {
        if self.warn_after == 0 || self.warned.load(Ordering::Relaxed) {
            return;
        }
        let shapes = self.entries.len();
        if shapes > self.warn_after && !self.warned.swap(true, Ordering::Relaxed) {
            warn!(
                shapes,
                threshold = self.warn_after,
                "projector cache keeps growing; shapes are never evicted"
            );
        }
    }

    pub fn contains(&self, shape: &Shape) -> bool {
        self.entries.contains_key(shape)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            shapes: self.entries.len(),
            builds: self.builds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}
