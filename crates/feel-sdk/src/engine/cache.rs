//! Compiled artifact cache
//!
//! One slot per key. The slot mutex, not the map, serializes compilation, so
//! a key compiles at most once at a time while unrelated keys proceed in
//! parallel. A failed compile empties its slot, and the slot is dropped
//! when no other caller is waiting on it.

use crate::error::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

type Slot<A> = Arc<Mutex<Option<A>>>;

/// Artifacts by fingerprint
pub struct ArtifactCache<A> {
    slots: DashMap<String, Slot<A>>,
}

impl<A: Clone> ArtifactCache<A> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Cached artifact for `key`, or the result of `compile` stored under it
    pub fn get_or_compile<F>(&self, key: &str, compile: F) -> Result<A>
    where
        F: FnOnce() -> Result<A>,
    {
        // Clone the slot out so the shard lock is released before compiling
        let slot = self.slots.entry(key.to_string()).or_default().clone();
        let mut guard = slot.lock();
        if let Some(artifact) = guard.as_ref() {
            debug!(key, "Artifact cache hit");
            return Ok(artifact.clone());
        }
        match compile() {
            Ok(artifact) => {
                *guard = Some(artifact.clone());
                Ok(artifact)
            }
            Err(err) => {
                warn!(key, error = %err, "Compilation failed; slot stays empty");
                drop(guard);
                // Only the map and this call hold the slot
                self.slots.remove_if(key, |_, held| {
                    Arc::ptr_eq(held, &slot) && Arc::strong_count(held) == 2
                });
                Err(err)
            }
        }
    }

    /// Cached artifact, if any
    pub fn get(&self, key: &str) -> Option<A> {
        let slot = self.slots.get(key)?.clone();
        let artifact = slot.lock().clone();
        artifact
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}

impl<A: Clone> Default for ArtifactCache<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeelError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_compiles_once_per_key() {
        let cache: ArtifactCache<String> = ArtifactCache::new();
        let calls = AtomicUsize::new(0);
        let compile = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("artifact".to_string())
        };
        assert_eq!(cache.get_or_compile("k", compile).unwrap(), "artifact");
        assert_eq!(cache.get_or_compile("k", compile).unwrap(), "artifact");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").as_deref(), Some("artifact"));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache: ArtifactCache<String> = ArtifactCache::new();
        let failed = cache.get_or_compile("k", || Err(FeelError::LoadError("k".to_string())));
        assert!(failed.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.slots.len(), 0);

        let retried = cache.get_or_compile("k", || Ok("second".to_string()));
        assert_eq!(retried.unwrap(), "second");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failing_keys_do_not_accumulate() {
        let cache: ArtifactCache<String> = ArtifactCache::new();
        for n in 0..100 {
            let key = format!("broken {}", n);
            let failed = cache.get_or_compile(&key, || Err(FeelError::LoadError(key.clone())));
            assert!(failed.is_err());
        }
        assert_eq!(cache.slots.len(), 0);
    }
}
