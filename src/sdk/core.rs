//! SDK entry point and frame factory.
//!
//! The [`Sdk`] is created once per page and owns the registry of live
//! frames. Calling [`Sdk::init`] with a frame ID that is already registered
//! mounts the existing instance again instead of creating a second one.
//!
//! # Example
//!
//! ```ignore
//! let sdk = Sdk::builder().surface(surface).build()?;
//!
//! let manager = sdk.init_manager(Config::new().with_frame_id("files"));
//! let picker = sdk.init_room_selector(
//!     Config::new()
//!         .with_frame_id("picker")
//!         .on("onSelectCallback", |rooms| println!("{rooms}")),
//! );
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{Config, Mode};
use crate::csp::CspValidator;
use crate::frame::{Instance, TemplateCache};
use crate::surface::Surface;

use super::builder::SdkBuilder;
use super::registry::Registry;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the SDK.
pub(crate) struct SdkInner {
    /// Page capabilities shared by every frame.
    pub surface: Arc<dyn Surface>,
    /// CSP allow-list source, if checks are enabled.
    pub csp: Option<Arc<dyn CspValidator>>,
    /// Configuration applied under every `init` call.
    pub defaults: Config,
    /// Template cache shared by every frame.
    pub cache: Arc<TemplateCache>,
    /// Live frames.
    pub registry: Arc<Registry>,
}

// ============================================================================
// Sdk
// ============================================================================

/// Factory and registry of embedded frames.
#[derive(Clone)]
pub struct Sdk {
    /// Shared inner state.
    pub(crate) inner: Arc<SdkInner>,
}

impl fmt::Debug for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdk")
            .field("frames", &self.frame_ids())
            .field("csp", &self.inner.csp.is_some())
            .finish_non_exhaustive()
    }
}

impl Sdk {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SdkBuilder {
        SdkBuilder::new()
    }

    /// Creates the SDK. Use [`Sdk::builder`].
    pub(crate) fn new(
        surface: Arc<dyn Surface>,
        csp: Option<Arc<dyn CspValidator>>,
        defaults: Config,
    ) -> Self {
        Self {
            inner: Arc::new(SdkInner {
                surface,
                csp,
                defaults,
                cache: Arc::new(TemplateCache::new()),
                registry: Arc::new(Registry::new()),
            }),
        }
    }
}

// ============================================================================
// Sdk - Factory
// ============================================================================

impl Sdk {
    /// Mounts a frame, reusing the instance registered under its frame ID.
    ///
    /// The instance is returned even if the placeholder was missing; check
    /// [`Instance::iframe`] or [`Instance::phase`] to see whether it mounted.
    pub fn init(&self, config: Config) -> Instance {
        let config = self.inner.defaults.merged(&config);
        let frame_id = config.frame_id().to_string();

        let instance = self.inner.registry.get_or_insert_with(&frame_id, || {
            debug!(%frame_id, "Creating instance");
            Instance::from_parts(
                Arc::clone(&self.inner.surface),
                Arc::clone(&self.inner.cache),
                self.inner.csp.clone(),
                Arc::downgrade(&self.inner.registry),
            )
        });

        instance.init_frame(config);
        instance
    }

    /// Mounts a frame in [`Mode::Manager`].
    #[inline]
    pub fn init_manager(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::Manager))
    }

    /// Mounts a frame in [`Mode::Viewer`].
    #[inline]
    pub fn init_viewer(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::Viewer))
    }

    /// Mounts a frame in [`Mode::Editor`].
    #[inline]
    pub fn init_editor(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::Editor))
    }

    /// Mounts a frame in [`Mode::RoomSelector`].
    #[inline]
    pub fn init_room_selector(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::RoomSelector))
    }

    /// Mounts a frame in [`Mode::FileSelector`].
    #[inline]
    pub fn init_file_selector(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::FileSelector))
    }

    /// Mounts a frame in [`Mode::System`].
    #[inline]
    pub fn init_system(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::System))
    }

    /// Mounts a frame in [`Mode::PublicRoom`].
    #[inline]
    pub fn init_public_room(&self, config: Config) -> Instance {
        self.init(config.with_mode(Mode::PublicRoom))
    }
}

// ============================================================================
// Sdk - Lookup
// ============================================================================

impl Sdk {
    /// Returns the live instance for `frame_id`.
    #[inline]
    #[must_use]
    pub fn frame(&self, frame_id: &str) -> Option<Instance> {
        self.inner.registry.get(frame_id)
    }

    /// Returns the IDs of live frames, sorted.
    #[inline]
    #[must_use]
    pub fn frame_ids(&self) -> Vec<String> {
        self.inner.registry.frame_ids()
    }

    /// Returns the number of live frames.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Returns the shared template cache.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &TemplateCache {
        &self.inner.cache
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::frame::Phase;
    use crate::surface::HeadlessSurface;

    const HOST: &str = "https://host.example.com";
    const APP: &str = "https://app.example.com";

    fn sdk() -> (Arc<HeadlessSurface>, Sdk) {
        let surface = Arc::new(HeadlessSurface::new(HOST));
        let sdk = Sdk::builder()
            .surface(surface.clone())
            .defaults(Config::new().with_src(APP))
            .build()
            .expect("built");
        (surface, sdk)
    }

    #[test]
    fn test_init_same_frame_id_reuses_instance() {
        let (surface, sdk) = sdk();
        surface.insert_element("a", "slot");

        let first = sdk.init(Config::new().with_frame_id("a").with_theme("Light"));
        let first_iframe = first.iframe().expect("mounted");
        let second = sdk.init(Config::new().with_frame_id("a").with_theme("Dark"));

        assert!(first.same_instance(&second));
        assert_eq!(sdk.frame_count(), 1);
        assert_eq!(second.get_config().theme(), "Dark");
        assert_ne!(second.iframe(), Some(first_iframe));
        assert_eq!(second.phase(), Phase::Initializing);
    }

    #[test]
    fn test_distinct_frames() {
        let (surface, sdk) = sdk();
        surface.insert_element("a", "");
        surface.insert_element("b", "");

        let a = sdk.init_manager(Config::new().with_frame_id("a"));
        let b = sdk.init_room_selector(Config::new().with_frame_id("b"));

        assert!(!a.same_instance(&b));
        assert_eq!(sdk.frame_ids(), vec!["a", "b"]);
        assert_eq!(b.get_config().mode(), Mode::RoomSelector);
        assert!(sdk.frame("b").is_some_and(|f| f.same_instance(&b)));
    }

    #[test]
    fn test_mode_wrappers_force_mode() {
        let (surface, sdk) = sdk();
        let cases = [
            ("m", Mode::Manager),
            ("v", Mode::Viewer),
            ("e", Mode::Editor),
            ("r", Mode::RoomSelector),
            ("f", Mode::FileSelector),
            ("s", Mode::System),
            ("p", Mode::PublicRoom),
        ];
        for (id, _) in cases {
            surface.insert_element(id, "");
        }

        let base = |id: &str| Config::new().with_frame_id(id).with_mode(Mode::Manager);
        let frames = [
            sdk.init_manager(base("m")),
            sdk.init_viewer(base("v")),
            sdk.init_editor(base("e")),
            sdk.init_room_selector(base("r")),
            sdk.init_file_selector(base("f")),
            sdk.init_system(base("s")),
            sdk.init_public_room(base("p")),
        ];
        for (frame, (_, mode)) in frames.iter().zip(cases) {
            assert_eq!(frame.get_config().mode(), mode);
        }
    }

    #[test]
    fn test_destroy_deregisters() {
        let (surface, sdk) = sdk();
        surface.insert_element("a", "");
        let frame = sdk.init(Config::new().with_frame_id("a"));
        assert_eq!(sdk.frame_count(), 1);

        frame.destroy_frame();
        assert_eq!(sdk.frame_count(), 0);

        // Mounting again puts it back
        frame.init_frame(Config::new());
        assert!(sdk.frame("a").is_some_and(|f| f.same_instance(&frame)));
    }

    #[test]
    fn test_missing_placeholder_still_returns_instance() {
        let (_surface, sdk) = sdk();
        let frame = sdk.init(Config::new().with_frame_id("nowhere"));
        assert!(frame.iframe().is_none());
        assert_eq!(frame.phase(), Phase::Uninitialized);
        assert!(sdk.frame("nowhere").is_some());
    }

    #[test]
    fn test_frames_share_cache() {
        let (surface, sdk) = sdk();
        surface.insert_element("a", "");
        surface.insert_element("b", "");
        sdk.init(Config::new().with_frame_id("a"));
        sdk.init(Config::new().with_frame_id("b"));
        assert_eq!(sdk.cache().path_count(), 2);
    }

    #[test]
    fn test_events_reach_the_right_frame() {
        let (surface, sdk) = sdk();
        surface.insert_element("a", "");
        surface.insert_element("b", "");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log_a = Arc::clone(&seen);
        let log_b = Arc::clone(&seen);
        let a = sdk.init(
            Config::new()
                .with_frame_id("a")
                .on("onSelectCallback", move |_| log_a.lock().push("a")),
        );
        let b = sdk.init(
            Config::new()
                .with_frame_id("b")
                .on("onSelectCallback", move |_| log_b.lock().push("b")),
        );
        for frame in [&a, &b] {
            assert!(surface.fire_load(frame.iframe().expect("iframe")));
        }

        surface.dispatch_json(&json!({
            "frameId": "b",
            "type": "onEventReturn",
            "eventReturnData": { "event": "onSelectCallback" }
        }));
        assert_eq!(*seen.lock(), vec!["b"]);
    }
}
