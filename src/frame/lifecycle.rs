//! Frame lifecycle: mounting, loading and teardown.
//!
//! # DOM Layout
//!
//! ```text
//! placeholder #frameId          container #frameId-container
//!                        ──►    ├── loader #frameId-loader   (optional)
//!                               └── iframe #frameId
//! ```
//!
//! Load and paint callbacks hold a weak handle and the generation that
//! scheduled them; a remount or teardown bumps the generation and turns
//! them into no-ops.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use crate::config::events::ON_CONTENT_READY;
use crate::config::{Config, path};
use crate::csp;
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::protocol::Method;
use crate::surface::{ContainerSpec, IframeSpec, MessageEvent};
use crate::transport::MethodCall;

use super::assets;
use super::cache::{PathKey, StyleKey};
use super::core::{FrameNodes, Phase};
use super::styles;
use super::Instance;

// ============================================================================
// Constants
// ============================================================================

/// Name attribute of the iframe.
const FRAME_NAME: &str = "frameDocSpace";

/// Permissions granted to the embedded application.
const FRAME_ALLOW: &str = "clipboard-read; clipboard-write; storage-access";

/// Returns `true` if `config` mounts a loader in front of the iframe.
fn shows_loader(config: &Config) -> bool {
    !config.no_loader() && !config.mode().skips_loader()
}

// ============================================================================
// Instance - Mounting
// ============================================================================

impl Instance {
    /// Mounts the iframe in place of the placeholder element.
    ///
    /// `config` is merged over the library defaults and the previous
    /// configuration. Any previous listener and queued calls are dropped.
    /// A container left by an earlier mount of the same frame ID is
    /// replaced, and the cached paths of that frame are dropped.
    ///
    /// Returns the new iframe, or `None` if neither the placeholder nor a
    /// previous container exists.
    pub fn init_frame(&self, config: Config) -> Option<NodeId> {
        let surface = &self.inner.surface;

        let (config, previous_frame_id, listener, csp_task, generation) = {
            let mut state = self.inner.state.lock();
            let previous_frame_id = state.config.frame_id().to_string();
            let merged = Config::defaults().merged(&state.config).merged(&config);
            state.config = merged.clone();
            state.generation += 1;
            state.nodes = None;
            (
                merged,
                previous_frame_id,
                state.listener.take(),
                state.csp_task.take(),
                state.generation,
            )
        };

        if let Some(task) = csp_task {
            task.abort();
        }
        if let Some(listener) = listener {
            surface.remove_message_listener(listener);
        }
        self.inner.bus.reset();

        let frame_id = config.frame_id().to_string();
        if previous_frame_id != frame_id {
            self.deregister(&previous_frame_id);
        }

        let container_id = format!("{frame_id}-container");
        let (target, residual) = match surface.find_element(&container_id) {
            Some(container) => (Some(container), true),
            None => (surface.find_element(&frame_id), false),
        };

        let Some(target) = target else {
            warn!(%frame_id, "Placeholder element not found");
            self.inner.state.lock().phase = Phase::Uninitialized;
            return None;
        };

        if residual {
            debug!(%frame_id, "Replacing residual container");
            self.inner.cache.invalidate_frame(&frame_id);
        } else {
            let class_name = surface.class_name(target);
            self.inner.state.lock().class_name = class_name;
        }

        let host_origin = surface.host_origin();
        let src = config
            .src()
            .map_or_else(|| host_origin.clone(), str::to_string);
        let mode = config.mode();
        let path = self
            .inner
            .cache
            .path(PathKey::of(&config), || path::resolve(mode, &config));

        let style_key = StyleKey::of(&config);
        let (width, height) = (config.width(), config.height());
        let base_style = self
            .inner
            .cache
            .iframe_style(style_key.clone(), || styles::iframe(width, height));

        let show_loader = shows_loader(&config);
        let style = if show_loader {
            base_style.merged(&styles::iframe_hidden())
        } else {
            base_style
        };

        let iframe = surface.create_iframe(&IframeSpec {
            id: frame_id.clone(),
            name: FRAME_NAME.to_string(),
            src: path::frame_url(&src, &path),
            style,
            allow: FRAME_ALLOW.to_string(),
        });

        let loader = show_loader.then(|| {
            let template = self
                .inner
                .cache
                .loader(style_key, || styles::loader(width, height, config.device()));
            surface.create_loader(&format!("{frame_id}-loader"), &template)
        });

        let children: Vec<NodeId> = loader.into_iter().chain([iframe]).collect();
        let container = surface.create_container(
            &ContainerSpec {
                id: container_id,
                style: styles::container(width, height),
            },
            &children,
        );
        surface.replace_node(target, container);

        self.inner.bus.attach(frame_id.clone(), iframe, src);

        {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                debug!(%frame_id, "Mount superseded");
                return Some(iframe);
            }
            state.phase = Phase::Initializing;
            state.nodes = Some(FrameNodes {
                iframe,
                loader,
                container,
            });
        }

        let weak = self.downgrade();
        surface.on_load(
            iframe,
            Box::new(move || {
                if let Some(frame) = Instance::upgrade(&weak) {
                    frame.handle_load(generation);
                }
            }),
        );

        if config.check_csp() {
            self.spawn_csp_check(generation);
        }

        self.register(&frame_id);
        info!(%frame_id, %mode, %iframe, loader = show_loader, "Frame mounted");
        Some(iframe)
    }

    /// Starts the CSP check on the current runtime, if any.
    fn spawn_csp_check(&self, generation: u64) {
        if self.inner.csp.is_none() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime, CSP check skipped");
            return;
        };

        let weak = self.downgrade();
        let task = runtime.spawn(async move {
            let Some(frame) = Instance::upgrade(&weak) else {
                return;
            };
            if let Err(e) = frame.check_csp().await {
                debug!(error = %e, "CSP check failed");
            }
        });

        let mut state = self.inner.state.lock();
        if state.generation == generation {
            state.csp_task = Some(task);
        } else {
            task.abort();
        }
    }
}

// ============================================================================
// Instance - Loading
// ============================================================================

impl Instance {
    /// Handles the iframe load event.
    fn handle_load(&self, generation: u64) {
        let no_loader = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                trace!("Stale load event");
                return;
            }
            match state.phase {
                Phase::Initializing => state.phase = Phase::Connected,
                Phase::Loaded => {}
                _ => return,
            }
            !shows_loader(&state.config)
        };

        self.inner.bus.connect();

        let weak = self.downgrade();
        let listener = self
            .inner
            .surface
            .add_message_listener(Arc::new(move |event: &MessageEvent| {
                if let Some(frame) = Instance::upgrade(&weak) {
                    frame.handle_message(event);
                }
            }));

        let stale = {
            let mut state = self.inner.state.lock();
            if state.generation == generation {
                state.listener.replace(listener)
            } else {
                Some(listener)
            }
        };
        if let Some(stale) = stale {
            self.inner.surface.remove_message_listener(stale);
        }

        info!(frame_id = %self.frame_id(), "Frame connected");

        if no_loader {
            self.emit_event(ON_CONTENT_READY, Value::Object(Map::new()));
        }
    }

    /// Shows the frame content and retires the loader.
    ///
    /// The loader fades on the next paint and is removed on the one after,
    /// then `onContentReady` fires. Without a loader it fires at once.
    pub fn set_is_loaded(&self) {
        let (nodes, generation, config) = {
            let mut state = self.inner.state.lock();
            match state.phase {
                Phase::Initializing | Phase::Connected => {}
                Phase::Loaded => {
                    trace!("Frame already loaded");
                    return;
                }
                Phase::Uninitialized | Phase::Destroyed => {
                    debug!(phase = %state.phase, "set_is_loaded on unmounted frame");
                    return;
                }
            }
            let Some(nodes) = state.nodes else {
                return;
            };
            state.phase = Phase::Loaded;
            (nodes, state.generation, state.config.clone())
        };

        let surface = &self.inner.surface;
        surface.set_style(
            nodes.container,
            &styles::container_loaded(config.width(), config.height()),
        );
        surface.set_style(nodes.iframe, &styles::iframe_visible());
        debug!(frame_id = %config.frame_id(), "Frame loaded");

        match nodes.loader {
            Some(loader) => {
                let weak = self.downgrade();
                surface.schedule_after_paint(Box::new(move || {
                    if let Some(frame) = Instance::upgrade(&weak) {
                        frame.fade_loader(generation, loader);
                    }
                }));
            }
            None => self.emit_event(ON_CONTENT_READY, Value::Object(Map::new())),
        }
    }

    /// First paint step: fade the loader out.
    fn fade_loader(&self, generation: u64, loader: NodeId) {
        if !self.is_generation(generation) {
            return;
        }
        self.inner.surface.set_style(loader, &styles::loader_faded());

        let weak = self.downgrade();
        self.inner.surface.schedule_after_paint(Box::new(move || {
            if let Some(frame) = Instance::upgrade(&weak) {
                frame.remove_loader(generation, loader);
            }
        }));
    }

    /// Second paint step: remove the loader and announce the content.
    fn remove_loader(&self, generation: u64, loader: NodeId) {
        {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return;
            }
            if let Some(nodes) = state.nodes.as_mut() {
                nodes.loader = None;
            }
        }
        self.inner.surface.remove_node(loader);
        self.emit_event(ON_CONTENT_READY, Value::Object(Map::new()));
    }

    /// Returns `true` if `generation` is still current.
    fn is_generation(&self, generation: u64) -> bool {
        self.inner.state.lock().generation == generation
    }
}

// ============================================================================
// Instance - Teardown
// ============================================================================

impl Instance {
    /// Tears the frame down.
    ///
    /// Removes the message listener, drops queued calls (their futures
    /// resolve to [`Error::ChannelClosed`]), disconnects the bus and puts
    /// back a placeholder with the original class and `destroyText`. The
    /// instance leaves its registry and stays inert until
    /// [`init_frame`](Self::init_frame) runs again.
    pub fn destroy_frame(&self) {
        let (nodes, listener, csp_task, config, class_name) = {
            let mut state = self.inner.state.lock();
            if !state.phase.is_mounted() {
                debug!(phase = %state.phase, "Nothing to destroy");
                return;
            }
            state.phase = Phase::Destroyed;
            state.generation += 1;
            (
                state.nodes.take(),
                state.listener.take(),
                state.csp_task.take(),
                state.config.clone(),
                state.class_name.clone(),
            )
        };

        let surface = &self.inner.surface;
        if let Some(task) = csp_task {
            task.abort();
        }
        if let Some(listener) = listener {
            surface.remove_message_listener(listener);
        }
        self.inner.bus.reset();

        let frame_id = config.frame_id();
        if let Some(nodes) = nodes {
            let placeholder =
                surface.create_placeholder(frame_id, &class_name, config.destroy_text());
            surface.replace_node(nodes.container, placeholder);
        }

        self.inner.cache.invalidate_frame(frame_id);
        self.deregister(frame_id);
        info!(%frame_id, "Frame destroyed");
    }
}

// ============================================================================
// Instance - Configuration
// ============================================================================

impl Instance {
    /// Merges `config` into the current configuration.
    ///
    /// If a changed key is listed in `keysForReload`, the frame is mounted
    /// again and the call resolves at once with the merged configuration.
    /// Otherwise the full merged configuration is pushed with `setConfig`,
    /// which is allowed before the frame has loaded.
    pub fn set_config(&self, config: Config) -> MethodCall {
        let (merged, reload) = {
            let mut state = self.inner.state.lock();
            let reload = state.phase.is_mounted() && state.config.requires_reload(&config);
            if !reload {
                state.config = state.config.merged(&config);
            }
            (state.config.clone(), reload)
        };

        if reload {
            info!(frame_id = %merged.frame_id(), "Reloading frame for new configuration");
            self.init_frame(config);
            return MethodCall::ready(Ok(self.get_config().to_value()));
        }

        self.call(Method::SetConfig(merged.to_value()))
    }
}

// ============================================================================
// Instance - CSP
// ============================================================================

impl Instance {
    /// Checks the host origin against the embedded application's CSP
    /// allow-list.
    ///
    /// On failure the iframe shows an error page, `onAppError` receives
    /// the validator message and the frame is forced loaded.
    ///
    /// # Errors
    ///
    /// Returns the validation error. Succeeds when no validator is set.
    pub async fn check_csp(&self) -> Result<()> {
        let Some(validator) = self.inner.csp.clone() else {
            return Ok(());
        };

        let (src, generation) = {
            let state = self.inner.state.lock();
            (state.config.src().map(str::to_string), state.generation)
        };
        let host_origin = self.inner.surface.host_origin();
        let src = src.unwrap_or_else(|| host_origin.clone());

        match csp::validate(validator.as_ref(), &src, &host_origin).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail_csp(generation, &src, &host_origin, &err);
                Err(err)
            }
        }
    }

    /// Shows the CSP error page and unblocks the host.
    fn fail_csp(&self, generation: u64, src: &str, host_origin: &str, err: &Error) {
        let iframe = {
            let state = self.inner.state.lock();
            if state.generation != generation {
                trace!("Stale CSP result");
                return;
            }
            state.nodes.map(|nodes| nodes.iframe)
        };

        if let Some(iframe) = iframe {
            let html = assets::csp_error_document(host_origin, src, &err.app_message());
            self.inner.surface.show_document(iframe, &html);
        }
        self.report_error(err);
        self.set_is_loaded();
    }
}

// ============================================================================
// Instance - Registry
// ============================================================================

impl Instance {
    /// Adds this instance to its registry under `frame_id`.
    fn register(&self, frame_id: &str) {
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.register(frame_id, self);
        }
    }

    /// Removes this instance from its registry entry for `frame_id`.
    fn deregister(&self, frame_id: &str) {
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.deregister(frame_id, self);
        }
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

    use crate::config::Mode;
    use crate::config::events::ON_APP_ERROR;
    use crate::csp::AllowList;
    use crate::error::CSP_ERROR_TEXT;
    use crate::frame::testing::{APP_ORIGIN, HOST_ORIGIN, connected, mounted, recorder};
    use crate::surface::{HeadlessSurface, NodeKind};

    #[test]
    fn test_missing_placeholder() {
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        let frame = Instance::new(surface.clone());
        assert!(frame.init_frame(Config::new().with_src(APP_ORIGIN)).is_none());
        assert_eq!(frame.phase(), Phase::Uninitialized);
        assert!(frame.iframe().is_none());
    }

    #[test]
    fn test_mount_builds_nodes() {
        let (surface, frame, iframe) = mounted(
            Config::new()
                .with_mode(Mode::Manager)
                .with_id(12)
                .with_size("800px", "600px"),
        );

        assert_eq!(frame.phase(), Phase::Initializing);
        assert!(!frame.is_connected());

        let node = surface.node(iframe).expect("iframe");
        assert_eq!(node.kind, NodeKind::Iframe);
        assert!(node.attached);
        assert!(
            node.src
                .as_deref()
                .is_some_and(|src| src.starts_with("https://app.example.com/rooms/shared/12/filter"))
        );
        assert_eq!(node.style.get("opacity"), Some("0"));
        assert_eq!(node.style.get("width"), Some("800px"));

        let loader = surface.element("ds-frame-loader").expect("loader");
        assert_eq!(loader.kind, NodeKind::Loader);
        let container = surface.element("ds-frame-container").expect("container");
        assert_eq!(container.children.len(), 2);
        assert_eq!(container.children[1], iframe);
    }

    #[test]
    fn test_empty_src_uses_host_origin() {
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "");
        let frame = Instance::new(surface.clone());
        let iframe = frame
            .init_frame(Config::new().with_mode(Mode::System))
            .expect("mounted");
        let node = surface.node(iframe).expect("iframe");
        assert_eq!(node.src.as_deref(), Some("https://host.example.com/sdk/system"));
    }

    #[test]
    fn test_load_connects_and_listens() {
        let (surface, frame, iframe) = mounted(Config::new());
        assert_eq!(surface.listener_count(), 0);
        assert!(surface.fire_load(iframe));
        assert_eq!(frame.phase(), Phase::Connected);
        assert!(frame.is_connected());
        assert_eq!(surface.listener_count(), 1);
    }

    #[test]
    fn test_loader_fades_then_content_ready() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (surface, frame) = connected(recorder(&seen, ON_CONTENT_READY));
        let loader = frame.loader().expect("loader");
        assert!(seen.lock().is_empty());

        frame.set_is_loaded();
        assert_eq!(frame.phase(), Phase::Loaded);
        let iframe = surface.node(frame.iframe().expect("iframe")).expect("node");
        assert_eq!(iframe.style.get("opacity"), Some("1"));
        assert!(seen.lock().is_empty());

        assert_eq!(surface.flush_paint(), 2);
        assert_eq!(surface.node(loader).expect("loader").style.get("opacity"), Some("0"));
        assert!(surface.element("ds-frame-loader").is_none());
        assert!(frame.loader().is_none());
        assert_eq!(seen.lock().len(), 1);

        // Second call is a no-op
        frame.set_is_loaded();
        assert_eq!(surface.flush_paint(), 0);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_no_loader_content_ready_on_load() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (surface, frame) = connected(recorder(&seen, ON_CONTENT_READY).with_no_loader(true));
        assert!(surface.element("ds-frame-loader").is_none());
        assert_eq!(seen.lock().len(), 1);

        let node = surface.node(frame.iframe().expect("iframe")).expect("node");
        assert_eq!(node.style.get("opacity"), None);

        frame.set_is_loaded();
        assert_eq!(surface.pending_paint(), 0);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_system_mode_skips_loader() {
        let (surface, frame, _) = mounted(Config::new().with_mode(Mode::System));
        assert!(frame.loader().is_none());
        assert!(surface.element("ds-frame-loader").is_none());
    }

    #[tokio::test]
    async fn test_destroy_drops_calls_and_restores_placeholder() {
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "frame-slot");
        let frame = Instance::new(surface.clone());
        let iframe = frame
            .init_frame(
                Config::new()
                    .with_src(APP_ORIGIN)
                    .with_destroy_text("Frame closed"),
            )
            .expect("mounted");
        surface.fire_load(iframe);

        let first = frame.get_files();
        let second = frame.get_folders();
        assert_eq!(frame.pending_calls(), 2);

        frame.destroy_frame();
        assert_eq!(frame.phase(), Phase::Destroyed);
        assert!(!frame.is_connected());
        assert_eq!(surface.listener_count(), 0);
        assert!(first.await.unwrap_err().is_connection_error());
        assert!(second.await.unwrap_err().is_connection_error());

        let placeholder = surface.element("ds-frame").expect("placeholder");
        assert_eq!(placeholder.kind, NodeKind::Element);
        assert_eq!(placeholder.class_name, "frame-slot");
        assert_eq!(placeholder.text, "Frame closed");
        assert!(surface.element("ds-frame-container").is_none());

        // Inert until mounted again
        frame.destroy_frame();
        frame.set_is_loaded();
        assert_eq!(frame.phase(), Phase::Destroyed);
    }

    #[test]
    fn test_destroy_then_reinit_is_fresh() {
        let (surface, frame) = connected(Config::new().with_id("7"));
        let old_iframe = frame.iframe().expect("iframe");
        let old_key = PathKey::of(&frame.get_config());
        assert!(frame.cache().has_path(&old_key));

        let _dropped = frame.get_files();
        surface.take_posted();
        frame.destroy_frame();
        assert!(!frame.cache().has_path(&old_key));

        let new_iframe = frame
            .init_frame(Config::new().with_id("7").with_root_path("/rooms/personal/"))
            .expect("remounted");
        assert_ne!(new_iframe, old_iframe);
        assert_eq!(frame.phase(), Phase::Initializing);
        assert!(!frame.is_connected());
        assert_eq!(frame.pending_calls(), 0);
        assert_eq!(frame.queued_calls(), 0);

        let src = surface.node(new_iframe).and_then(|n| n.src).expect("src");
        assert!(src.contains("/rooms/personal/7/filter"));

        // Not connected until the new iframe loads
        assert!(frame.get_files().is_settled());
        assert!(surface.posted().is_empty());
        surface.fire_load(new_iframe);
        assert!(frame.is_connected());
    }

    #[test]
    fn test_reinit_replaces_residual_container() {
        let (surface, frame) = connected(Config::new().with_id("1"));
        let key = PathKey::of(&frame.get_config());
        assert!(frame.cache().has_path(&key));

        let iframe = frame
            .init_frame(Config::new().with_root_path("/rooms/archive/"))
            .expect("remounted");
        let src = surface.node(iframe).and_then(|n| n.src).expect("src");
        assert!(src.contains("/rooms/archive/1/filter"));
        assert_eq!(surface.listener_count(), 0);
        assert!(!frame.is_connected());

        let container = surface.element("ds-frame-container").expect("container");
        assert!(container.children.contains(&iframe));
    }

    #[test]
    fn test_stale_load_is_ignored() {
        let (surface, frame, first) = mounted(Config::new());
        let second = frame.init_frame(Config::new()).expect("remounted");

        surface.fire_load(first);
        assert!(!frame.is_connected());
        assert_eq!(surface.listener_count(), 0);

        surface.fire_load(second);
        assert!(frame.is_connected());
    }

    #[test]
    fn test_set_config_pushes_merged_config() {
        let (surface, frame) = connected(Config::new());
        let call = frame.set_config(Config::new().with_theme("Dark"));
        assert!(!call.is_settled());

        let posted = surface.take_posted();
        assert_eq!(posted.len(), 1);
        let json = posted[0].json();
        assert_eq!(json["data"]["methodName"], "setConfig");
        assert_eq!(json["data"]["data"]["theme"], "Dark");
        assert_eq!(json["data"]["data"]["frameId"], "ds-frame");
        assert_eq!(frame.get_config().theme(), "Dark");
    }

    #[test]
    fn test_set_config_before_load_is_sent() {
        let (surface, frame, _) = mounted(Config::new());
        let call = frame.set_config(Config::new().with_locale("de"));
        assert!(!call.is_settled());
        assert_eq!(surface.posted().len(), 1);
    }

    #[tokio::test]
    async fn test_set_config_reload_key_remounts() {
        let (surface, frame) = connected(Config::new());
        let old_iframe = frame.iframe().expect("iframe");

        let value = frame
            .set_config(Config::new().with_mode(Mode::RoomSelector))
            .await
            .expect("resolved");
        assert_eq!(value["mode"], json!("room-selector"));
        assert!(surface.posted().is_empty());

        let new_iframe = frame.iframe().expect("iframe");
        assert_ne!(new_iframe, old_iframe);
        let src = surface.node(new_iframe).and_then(|n| n.src).expect("src");
        assert!(src.ends_with("/sdk/room-selector"));
    }

    #[tokio::test]
    async fn test_csp_failure_shows_error_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "");
        let frame = Instance::with_csp(
            surface.clone(),
            Arc::new(AllowList::new(["https://partner.example.com"])),
        );
        let iframe = frame
            .init_frame(
                recorder(&seen, ON_APP_ERROR)
                    .with_src(APP_ORIGIN)
                    .with_check_csp(false),
            )
            .expect("mounted");

        let err = frame.check_csp().await.unwrap_err();
        assert!(matches!(err, Error::Csp { .. }));

        let document = surface.node(iframe).and_then(|n| n.document).expect("document");
        assert!(document.contains(HOST_ORIGIN));
        assert_eq!(*seen.lock(), vec![json!(CSP_ERROR_TEXT)]);
        assert_eq!(frame.phase(), Phase::Loaded);
    }

    #[tokio::test]
    async fn test_load_after_csp_failure_keeps_single_content_ready() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "");
        let frame = Instance::with_csp(surface.clone(), Arc::new(AllowList::default()));
        let iframe = frame
            .init_frame(
                recorder(&seen, ON_CONTENT_READY)
                    .with_src(APP_ORIGIN)
                    .with_check_csp(false),
            )
            .expect("mounted");

        frame.check_csp().await.unwrap_err();
        assert_eq!(surface.flush_paint(), 2);
        assert!(frame.loader().is_none());
        assert_eq!(seen.lock().len(), 1);

        // The error document triggers the native load event afterwards
        assert!(surface.fire_load(iframe));
        assert!(frame.is_connected());
        assert_eq!(frame.phase(), Phase::Loaded);
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_csp_pass_leaves_frame_alone() {
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "");
        let frame = Instance::with_csp(
            surface.clone(),
            Arc::new(AllowList::new(["https://*.example.com"])),
        );
        let iframe = frame
            .init_frame(Config::new().with_src(APP_ORIGIN).with_check_csp(false))
            .expect("mounted");

        frame.check_csp().await.expect("allowed");
        assert!(surface.node(iframe).and_then(|n| n.document).is_none());
        assert_eq!(frame.phase(), Phase::Initializing);
    }

    #[tokio::test]
    async fn test_csp_check_spawned_on_mount() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let surface = Arc::new(HeadlessSurface::new(HOST_ORIGIN));
        surface.insert_element("ds-frame", "");
        let frame = Instance::with_csp(surface.clone(), Arc::new(AllowList::default()));
        frame
            .init_frame(recorder(&seen, ON_APP_ERROR).with_src(APP_ORIGIN))
            .expect("mounted");

        for _ in 0..10 {
            if frame.phase() == Phase::Loaded {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(frame.phase(), Phase::Loaded);
        assert_eq!(seen.lock().len(), 1);
    }
}
