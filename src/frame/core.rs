//! Core Instance struct and accessors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::csp::CspValidator;
use crate::identifiers::{ListenerId, NodeId};
use crate::sdk::Registry;
use crate::surface::Surface;
use crate::transport::MessageBus;

use super::cache::TemplateCache;
use super::dispatch::CommandTable;

// ============================================================================
// Phase
// ============================================================================

/// Lifecycle phase of a frame.
///
/// ```text
/// Uninitialized ──init_frame──► Initializing ──load──► Connected
///                                    │                     │
///                                    └──── set_is_loaded ──┴──► Loaded
///
/// Initializing | Connected | Loaded ──destroy_frame──► Destroyed
/// Destroyed ──init_frame──► Initializing
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Never mounted, or the placeholder was missing.
    #[default]
    Uninitialized,
    /// Iframe mounted, waiting for its load event.
    Initializing,
    /// Iframe loaded; calls are sent.
    Connected,
    /// Content shown and loader gone.
    Loaded,
    /// Torn down; inert until mounted again.
    Destroyed,
}

impl Phase {
    /// Returns the phase name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Connected => "connected",
            Self::Loaded => "loaded",
            Self::Destroyed => "destroyed",
        }
    }

    /// Returns `true` while an iframe is mounted.
    #[inline]
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        matches!(self, Self::Initializing | Self::Connected | Self::Loaded)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Internal State
// ============================================================================

/// Nodes created for a mounted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameNodes {
    /// The iframe.
    pub iframe: NodeId,
    /// Loading indicator, until removed.
    pub loader: Option<NodeId>,
    /// Container that replaced the placeholder.
    pub container: NodeId,
}

/// Mutable frame state.
#[derive(Default)]
pub(crate) struct FrameState {
    /// Current configuration (defaults merged in).
    pub config: Config,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Mounted nodes.
    pub nodes: Option<FrameNodes>,
    /// Window message listener, while connected.
    pub listener: Option<ListenerId>,
    /// Class attribute of the replaced placeholder.
    pub class_name: String,
    /// Bumped on every mount and teardown; stale callbacks compare it.
    pub generation: u64,
    /// Running CSP check.
    pub csp_task: Option<JoinHandle<()>>,
}

/// Internal shared state for an instance.
pub(crate) struct InstanceInner {
    /// Page capabilities.
    pub surface: Arc<dyn Surface>,
    /// Shared template cache.
    pub cache: Arc<TemplateCache>,
    /// CSP allow-list source, if checks are enabled.
    pub csp: Option<Arc<dyn CspValidator>>,
    /// Owning registry, if created through an [`Sdk`](crate::Sdk).
    pub registry: Weak<Registry>,
    /// Call queue.
    pub bus: MessageBus,
    /// Commands callable by the embedded application.
    pub commands: RwLock<CommandTable>,
    /// Lifecycle state.
    pub state: Mutex<FrameState>,
}

// ============================================================================
// Instance
// ============================================================================

/// One embedded frame.
///
/// Cloning is cheap and yields a handle to the same frame.
#[derive(Clone)]
pub struct Instance {
    pub(crate) inner: Arc<InstanceInner>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Instance")
            .field("frame_id", &state.config.frame_id())
            .field("phase", &state.phase)
            .field("nodes", &state.nodes)
            .finish_non_exhaustive()
    }
}

impl Instance {
    /// Creates an unmounted instance with its own template cache.
    #[must_use]
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::from_parts(surface, Arc::new(TemplateCache::new()), None, Weak::new())
    }

    /// Creates an unmounted instance that checks the CSP allow-list.
    #[must_use]
    pub fn with_csp(surface: Arc<dyn Surface>, validator: Arc<dyn CspValidator>) -> Self {
        Self::from_parts(
            surface,
            Arc::new(TemplateCache::new()),
            Some(validator),
            Weak::new(),
        )
    }

    /// Creates an instance from shared parts.
    pub(crate) fn from_parts(
        surface: Arc<dyn Surface>,
        cache: Arc<TemplateCache>,
        csp: Option<Arc<dyn CspValidator>>,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                bus: MessageBus::new(Arc::clone(&surface)),
                surface,
                cache,
                csp,
                registry,
                commands: RwLock::new(CommandTable::with_builtins()),
                state: Mutex::new(FrameState::default()),
            }),
        }
    }

    /// Returns a weak handle for surface callbacks.
    #[inline]
    pub(crate) fn downgrade(&self) -> Weak<InstanceInner> {
        Arc::downgrade(&self.inner)
    }

    /// Rebuilds a handle from a weak one.
    #[inline]
    pub(crate) fn upgrade(weak: &Weak<InstanceInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

// ============================================================================
// Instance - Accessors
// ============================================================================

impl Instance {
    /// Returns the frame ID.
    #[must_use]
    pub fn frame_id(&self) -> String {
        self.inner.state.lock().config.frame_id().to_string()
    }

    /// Returns the lifecycle phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Returns `true` while the bus may send calls.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.bus.is_connected()
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn get_config(&self) -> Config {
        self.inner.state.lock().config.clone()
    }

    /// Returns the mounted iframe.
    #[must_use]
    pub fn iframe(&self) -> Option<NodeId> {
        self.inner.state.lock().nodes.map(|nodes| nodes.iframe)
    }

    /// Returns the loader, while it is shown.
    #[must_use]
    pub fn loader(&self) -> Option<NodeId> {
        self.inner.state.lock().nodes.and_then(|nodes| nodes.loader)
    }

    /// Returns the number of calls awaiting a reply.
    #[inline]
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.bus.pending_count()
    }

    /// Returns the number of calls not yet posted.
    #[inline]
    #[must_use]
    pub fn queued_calls(&self) -> usize {
        self.inner.bus.queued_count()
    }

    /// Returns `true` if both handles refer to the same frame.
    #[inline]
    #[must_use]
    pub fn same_instance(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the template cache.
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

    use crate::surface::HeadlessSurface;

    #[test]
    fn test_new_instance_is_uninitialized() {
        let frame = Instance::new(Arc::new(HeadlessSurface::new("https://host")));
        assert_eq!(frame.phase(), Phase::Uninitialized);
        assert!(!frame.is_connected());
        assert!(frame.iframe().is_none());
        assert_eq!(frame.frame_id(), "ds-frame");
    }

    #[test]
    fn test_clones_share_state() {
        let frame = Instance::new(Arc::new(HeadlessSurface::new("https://host")));
        let other = Instance::new(Arc::new(HeadlessSurface::new("https://host")));
        assert!(frame.same_instance(&frame.clone()));
        assert!(!frame.same_instance(&other));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Connected.to_string(), "connected");
        assert!(Phase::Loaded.is_mounted());
        assert!(!Phase::Destroyed.is_mounted());
    }
}
