//! Shared template cache.
//!
//! Resolved iframe paths, iframe styles and loader templates are computed
//! once per key and cloned out on every hit. Cached values are never
//! mutated; a frame that is torn down and mounted again drops its paths
//! with [`TemplateCache::invalidate_frame`] so a changed configuration is
//! resolved afresh.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::{Config, DeviceClass, Mode};
use crate::surface::{LoaderTemplate, Style};

// ============================================================================
// Keys
// ============================================================================

/// Key of a resolved iframe path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey {
    /// Frame mode.
    pub mode: Mode,
    /// Item ID, if any.
    pub id: Option<String>,
    /// Frame ID.
    pub frame_id: String,
}

impl PathKey {
    /// Builds the key for a configuration.
    #[must_use]
    pub fn of(config: &Config) -> Self {
        Self {
            mode: config.mode(),
            id: config.id(),
            frame_id: config.frame_id().to_string(),
        }
    }
}

/// Key of a size-dependent template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleKey {
    /// CSS width.
    pub width: String,
    /// CSS height.
    pub height: String,
    /// Device class.
    pub device: DeviceClass,
}

impl StyleKey {
    /// Builds the key for a configuration.
    #[must_use]
    pub fn of(config: &Config) -> Self {
        Self {
            width: config.width().to_string(),
            height: config.height().to_string(),
            device: config.device(),
        }
    }
}

// ============================================================================
// TemplateCache
// ============================================================================

/// Cache of paths, iframe styles and loader templates.
#[derive(Default)]
pub struct TemplateCache {
    paths: RwLock<FxHashMap<PathKey, String>>,
    iframe_styles: RwLock<FxHashMap<StyleKey, Style>>,
    loaders: RwLock<FxHashMap<StyleKey, LoaderTemplate>>,
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("paths", &self.paths.read().len())
            .field("iframe_styles", &self.iframe_styles.read().len())
            .field("loaders", &self.loaders.read().len())
            .finish()
    }
}

impl TemplateCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached path for `key`, building it on a miss.
    pub fn path(&self, key: PathKey, build: impl FnOnce() -> String) -> String {
        get_or_build(&self.paths, key, build)
    }

    /// Returns the cached iframe style for `key`, building it on a miss.
    pub fn iframe_style(&self, key: StyleKey, build: impl FnOnce() -> Style) -> Style {
        get_or_build(&self.iframe_styles, key, build)
    }

    /// Returns the cached loader template for `key`, building it on a miss.
    pub fn loader(&self, key: StyleKey, build: impl FnOnce() -> LoaderTemplate) -> LoaderTemplate {
        get_or_build(&self.loaders, key, build)
    }

    /// Drops every cached path of `frame_id`. Returns the number dropped.
    pub fn invalidate_frame(&self, frame_id: &str) -> usize {
        let mut paths = self.paths.write();
        let before = paths.len();
        paths.retain(|key, _| key.frame_id != frame_id);
        let dropped = before - paths.len();
        if dropped > 0 {
            trace!(%frame_id, dropped, "Cached paths invalidated");
        }
        dropped
    }

    /// Returns `true` if a path is cached for `key`.
    #[must_use]
    pub fn has_path(&self, key: &PathKey) -> bool {
        self.paths.read().contains_key(key)
    }

    /// Returns the number of cached paths.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.read().len()
    }
}

/// Looks `key` up, inserting `build()` on a miss, and returns a clone.
fn get_or_build<K, V>(map: &RwLock<FxHashMap<K, V>>, key: K, build: impl FnOnce() -> V) -> V
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(value) = map.read().get(&key) {
        return value.clone();
    }
    map.write().entry(key).or_insert_with(build).clone()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    #[test]
    fn test_path_built_once() {
        let cache = TemplateCache::new();
        let key = PathKey::of(&Config::new().with_frame_id("a").with_id(7));
        let builds = Cell::new(0);

        for _ in 0..3 {
            let path = cache.path(key.clone(), || {
                builds.set(builds.get() + 1);
                "/rooms/shared/7/filter".to_string()
            });
            assert_eq!(path, "/rooms/shared/7/filter");
        }
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn test_invalidate_frame_only_touches_that_frame() {
        let cache = TemplateCache::new();
        let a = PathKey::of(&Config::new().with_frame_id("a"));
        let b = PathKey::of(&Config::new().with_frame_id("b"));
        cache.path(a.clone(), || "/a".to_string());
        cache.path(b.clone(), || "/b".to_string());

        assert_eq!(cache.invalidate_frame("a"), 1);
        assert!(!cache.has_path(&a));
        assert!(cache.has_path(&b));

        let rebuilt = cache.path(a, || "/a2".to_string());
        assert_eq!(rebuilt, "/a2");
    }

    #[test]
    fn test_style_keys_include_device() {
        let desktop = StyleKey::of(&Config::new());
        let mobile = StyleKey::of(&Config::new().with_device(DeviceClass::Mobile));
        assert_ne!(desktop, mobile);

        let cache = TemplateCache::new();
        let style = cache.iframe_style(desktop.clone(), || Style::new().set("width", "1px"));
        // Mutating the returned clone leaves the cache untouched
        let _changed = style.set("width", "2px");
        let again = cache.iframe_style(desktop, Style::new);
        assert_eq!(again.get("width"), Some("1px"));
    }
}
