//! Frame registry.
//!
//! Maps frame IDs to live instances. Instances add themselves when mounted
//! and remove themselves when destroyed.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::frame::Instance;

// ============================================================================
// Registry
// ============================================================================

/// Live instances keyed by frame ID.
#[derive(Default)]
pub struct Registry {
    frames: RwLock<FxHashMap<String, Instance>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("frames", &self.frame_ids())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance registered under `frame_id`.
    #[must_use]
    pub fn get(&self, frame_id: &str) -> Option<Instance> {
        self.frames.read().get(frame_id).cloned()
    }

    /// Returns the registered frame IDs, sorted.
    #[must_use]
    pub fn frame_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.frames.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }

    /// Returns the instance under `frame_id`, creating it if absent.
    pub(crate) fn get_or_insert_with(
        &self,
        frame_id: &str,
        create: impl FnOnce() -> Instance,
    ) -> Instance {
        if let Some(instance) = self.get(frame_id) {
            return instance;
        }
        self.frames
            .write()
            .entry(frame_id.to_string())
            .or_insert_with(create)
            .clone()
    }

    /// Registers `instance` under `frame_id` unless the slot is taken.
    pub(crate) fn register(&self, frame_id: &str, instance: &Instance) {
        let mut frames = self.frames.write();
        match frames.get(frame_id) {
            Some(existing) if existing.same_instance(instance) => {}
            Some(_) => debug!(%frame_id, "Frame ID held by another instance"),
            None => {
                frames.insert(frame_id.to_string(), instance.clone());
                trace!(%frame_id, "Instance registered");
            }
        }
    }

    /// Removes `instance` from `frame_id`. Other instances are left alone.
    pub(crate) fn deregister(&self, frame_id: &str, instance: &Instance) -> bool {
        let mut frames = self.frames.write();
        let owned = frames
            .get(frame_id)
            .is_some_and(|existing| existing.same_instance(instance));
        if owned {
            frames.remove(frame_id);
            trace!(%frame_id, "Instance deregistered");
        }
        owned
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::surface::HeadlessSurface;

    fn instance() -> Instance {
        Instance::new(Arc::new(HeadlessSurface::new("https://host")))
    }

    #[test]
    fn test_get_or_insert_reuses() {
        let registry = Registry::new();
        let first = registry.get_or_insert_with("a", instance);
        let second = registry.get_or_insert_with("a", instance);
        assert!(first.same_instance(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_only_owner() {
        let registry = Registry::new();
        let owner = registry.get_or_insert_with("a", instance);
        let stranger = instance();

        assert!(!registry.deregister("a", &stranger));
        assert_eq!(registry.len(), 1);
        registry.register("a", &stranger);
        assert!(registry.get("a").is_some_and(|i| i.same_instance(&owner)));

        assert!(registry.deregister("a", &owner));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_frame_ids_sorted() {
        let registry = Registry::new();
        registry.register("b", &instance());
        registry.register("a", &instance());
        assert_eq!(registry.frame_ids(), vec!["a", "b"]);
    }
}
