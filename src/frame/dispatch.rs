//! Inbound message dispatch.
//!
//! Every message the embedded application posts lands in
//! [`Instance::handle_message`]:
//!
//! | Kind | Effect |
//! |------|--------|
//! | `onMethodReturn` | resolves the oldest pending call |
//! | `onEventReturn` | runs the host handler named by the event |
//! | `onCallCommand` | runs a command from the [`CommandTable`] |
//! | `error` | reported to `onAppError` |
//! | anything else | logged and dropped |
//!
//! Messages addressed to another frame are dropped before dispatch.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use crate::config::Config;
use crate::config::events::ON_APP_ERROR;
use crate::error::{Error, Result};
use crate::protocol::{MessageKind, decode};
use crate::surface::MessageEvent;

use super::Instance;

// ============================================================================
// Constants
// ============================================================================

/// Command marking the frame content as shown.
pub const SET_IS_LOADED: &str = "setIsLoaded";

/// Command merging a configuration patch.
pub const SET_CONFIG: &str = "setConfig";

/// Command tearing the frame down.
pub const DESTROY_FRAME: &str = "destroyFrame";

// ============================================================================
// CommandTable
// ============================================================================

/// Host function callable by the embedded application.
pub type CommandHandler = Arc<dyn Fn(&Instance, Value) + Send + Sync>;

/// Closed mapping from command name to handler.
///
/// Only registered names are callable; nothing else on the instance is
/// reachable from the embedded application.
#[derive(Clone, Default)]
pub struct CommandTable {
    handlers: FxHashMap<String, CommandHandler>,
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandTable {
    /// Creates a table holding the built-in commands.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut table = Self::default();
        table.insert(SET_IS_LOADED, Arc::new(|frame, _| frame.set_is_loaded()));
        table.insert(SET_CONFIG, Arc::new(apply_config_command));
        table.insert(DESTROY_FRAME, Arc::new(|frame, _| frame.destroy_frame()));
        table
    }

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty or taken.
    pub fn register(&mut self, name: &str, handler: CommandHandler) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::invalid_argument("command name is empty"));
        }
        if self.handlers.contains_key(name) {
            return Err(Error::invalid_argument(format!(
                "command {name} is already registered"
            )));
        }
        self.insert(name, handler);
        Ok(())
    }

    /// Returns the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CommandHandler> {
        self.handlers.get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn insert(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }
}

/// Built-in `setConfig` command.
fn apply_config_command(frame: &Instance, data: Value) {
    match Config::from_value(data) {
        Ok(patch) => {
            let call = frame.set_config(patch);
            trace!(?call, "setConfig command applied");
        }
        Err(e) => frame.report_error(&e),
    }
}

// ============================================================================
// Instance - Dispatch
// ============================================================================

impl Instance {
    /// Handles a window message event.
    ///
    /// Non-text data and messages for other frames are ignored. Never
    /// panics, whatever the payload.
    pub fn handle_message(&self, event: &MessageEvent) {
        let Some(text) = event.as_text() else {
            trace!(origin = %event.origin, "Ignoring non-text message");
            return;
        };

        let message = decode(text);
        if message.is_parse_error() {
            warn!(
                origin = %event.origin,
                detail = message.error_message().unwrap_or_default(),
                "Undecodable message"
            );
        }

        let frame_id = self.frame_id();
        if message.frame_id != frame_id {
            trace!(%frame_id, from = %message.frame_id, "Message for another frame");
            return;
        }

        match message.kind {
            MessageKind::MethodReturn => {
                self.inner.bus.on_method_return(message.method_return_data);
            }
            MessageKind::EventReturn => match message.event_return_data {
                Some(event) => {
                    let data = event.data.unwrap_or_else(|| Value::Object(Map::new()));
                    self.emit_event(&event.event, data);
                }
                None => debug!(%frame_id, "Event message without event data"),
            },
            MessageKind::CallCommand => {
                let name = message.command_name.unwrap_or_default();
                self.call_command(&name, message.command_data.unwrap_or(Value::Null));
            }
            MessageKind::Error => {
                let text = message.error_message().unwrap_or("Unknown error").to_string();
                error!(%frame_id, error = %text, "Error from frame");
                self.emit_event(ON_APP_ERROR, Value::String(text));
            }
            MessageKind::Other(kind) => {
                warn!(%frame_id, %kind, "Unknown message kind");
            }
        }
    }

    /// Registers a command callable by the embedded application.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty or taken.
    pub fn register_command<F>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&Instance, Value) + Send + Sync + 'static,
    {
        self.inner.commands.write().register(name, Arc::new(handler))
    }

    /// Returns `true` if `name` is a registered command.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.inner.commands.read().contains(name)
    }

    /// Runs a command; unknown names are ignored.
    fn call_command(&self, name: &str, data: Value) {
        let handler = self.inner.commands.read().get(name);
        let Some(handler) = handler else {
            debug!(command = %name, "Unknown command ignored");
            return;
        };

        trace!(command = %name, "Running command");
        if catch_unwind(AssertUnwindSafe(|| handler(self, data))).is_err() {
            error!(command = %name, "Command handler panicked");
        }
    }

    /// Invokes the host handler for `event`, if any.
    pub(crate) fn emit_event(&self, event: &str, data: Value) {
        let handler = self.inner.state.lock().config.handler(event);
        let Some(handler) = handler else {
            trace!(%event, "No handler registered");
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| handler(data))).is_err() {
            error!(%event, "Event handler panicked");
        }
    }

    /// Logs `err` and passes its message to `onAppError`.
    pub(crate) fn report_error(&self, err: &Error) {
        error!(frame_id = %self.frame_id(), error = %err, "Frame error");
        self.emit_event(ON_APP_ERROR, Value::String(err.app_message()));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::frame::Phase;
    use crate::frame::testing::{APP_ORIGIN, connected, recorder};
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_builtin_commands() {
        let table = CommandTable::with_builtins();
        assert_eq!(table.names(), vec![DESTROY_FRAME, SET_CONFIG, SET_IS_LOADED]);
    }

    #[test]
    fn test_register_validates_name() {
        let mut table = CommandTable::with_builtins();
        assert!(table.register("", Arc::new(|_, _| {})).is_err());
        assert!(table.register("  ", Arc::new(|_, _| {})).is_err());
        assert!(table.register(SET_IS_LOADED, Arc::new(|_, _| {})).is_err());
        table.register("refresh", Arc::new(|_, _| {})).expect("new name");
        assert!(table.contains("refresh"));
    }

    #[test]
    fn test_event_reaches_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = recorder(&seen, "onSelectCallback");
        let (surface, frame) = connected(config);

        surface.dispatch_json(&json!({
            "frameId": "ds-frame",
            "type": "onEventReturn",
            "eventReturnData": { "event": "onSelectCallback", "data": { "id": 5 } }
        }));
        surface.dispatch_json(&json!({
            "frameId": "ds-frame",
            "type": "onEventReturn",
            "eventReturnData": { "event": "onSelectCallback" }
        }));

        assert_eq!(*seen.lock(), vec![json!({ "id": 5 }), json!({})]);
        assert!(frame.is_connected());
    }

    #[test]
    fn test_missing_handler_is_noop() {
        let (surface, frame) = connected(Config::new());
        let before = frame.get_config().to_value();

        surface.dispatch_json(&json!({
            "frameId": "ds-frame",
            "type": "onEventReturn",
            "eventReturnData": { "event": "onNoSuchEvent", "data": { "x": 1 } }
        }));

        assert_eq!(frame.phase(), Phase::Connected);
        assert_eq!(frame.get_config().to_value(), before);
        assert!(surface.posted().is_empty());
    }

    #[test]
    fn test_other_frame_is_ignored() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = recorder(&seen, "onSelectCallback").with_frame_id("A");
        let surface = Arc::new(HeadlessSurface::new("https://host.example.com"));
        surface.insert_element("A", "slot");
        let frame = Instance::new(surface.clone());
        let iframe = frame.init_frame(config.with_src(APP_ORIGIN)).expect("mounted");
        surface.fire_load(iframe);

        let returned = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&returned);
        frame
            .execute_method("getFiles", None, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("sent");

        for payload in [
            json!({ "frameId": "B", "type": "onMethodReturn", "methodReturnData": {} }),
            json!({ "frameId": "B", "type": "onEventReturn",
                    "eventReturnData": { "event": "onSelectCallback" } }),
            json!({ "frameId": "B", "type": "onCallCommand", "commandName": "destroyFrame" }),
            json!({ "frameId": "B", "type": "onCallCommand", "commandName": "setIsLoaded" }),
        ] {
            surface.dispatch_json(&payload);
        }

        assert_eq!(returned.load(Ordering::SeqCst), 0);
        assert!(seen.lock().is_empty());
        assert_eq!(frame.phase(), Phase::Connected);
        assert_eq!(frame.pending_calls(), 1);
    }

    #[test]
    fn test_parse_error_never_reaches_frame() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (surface, frame) = connected(recorder(&seen, ON_APP_ERROR));

        surface.dispatch_message(&MessageEvent::text(APP_ORIGIN, "{not json"));
        surface.dispatch_message(&MessageEvent::text(APP_ORIGIN, "null"));
        surface.dispatch_message(&MessageEvent {
            origin: APP_ORIGIN.to_string(),
            data: json!({ "frameId": "ds-frame", "type": "onCallCommand" }),
        });

        assert!(seen.lock().is_empty());
        assert_eq!(frame.phase(), Phase::Connected);
    }

    #[test]
    fn test_error_message_reported() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (surface, _frame) = connected(recorder(&seen, ON_APP_ERROR));

        surface.dispatch_json(&json!({
            "frameId": "ds-frame",
            "type": "error",
            "error": { "message": "Access denied", "code": 403 }
        }));

        assert_eq!(*seen.lock(), vec![json!("Access denied")]);
    }

    #[test]
    fn test_commands() {
        let (surface, frame) = connected(Config::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        frame
            .register_command("refresh", move |_, data| {
                counter.fetch_add(data.as_u64().unwrap_or(0) as usize, Ordering::SeqCst);
            })
            .expect("registered");
        assert!(frame.register_command("refresh", |_, _| {}).is_err());

        surface.dispatch_json(&json!({
            "frameId": "ds-frame", "type": "onCallCommand",
            "commandName": "refresh", "commandData": 3
        }));
        surface.dispatch_json(&json!({
            "frameId": "ds-frame", "type": "onCallCommand", "commandName": "noSuchCommand"
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        surface.dispatch_json(&json!({
            "frameId": "ds-frame", "type": "onCallCommand", "commandName": "setIsLoaded"
        }));
        assert_eq!(frame.phase(), Phase::Loaded);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_dispatch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = recorder(&seen, "onAppReady").on("onSignOut", |_| panic!("host bug"));
        let (surface, frame) = connected(config);
        frame
            .register_command("explode", |_, _| panic!("command bug"))
            .expect("registered");

        for event in ["onSignOut", "onAppReady"] {
            surface.dispatch_json(&json!({
                "frameId": "ds-frame",
                "type": "onEventReturn",
                "eventReturnData": { "event": event }
            }));
        }
        surface.dispatch_json(&json!({
            "frameId": "ds-frame", "type": "onCallCommand", "commandName": "explode"
        }));

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(frame.phase(), Phase::Connected);
    }

    #[test]
    fn test_unknown_kind_is_dropped() {
        let (surface, frame) = connected(Config::new());
        surface.dispatch_json(&json!({ "frameId": "ds-frame", "type": "onSomethingNew" }));
        assert_eq!(frame.phase(), Phase::Connected);
    }

    proptest! {
        #[test]
        fn prop_arbitrary_text_never_panics(text in ".{0,200}") {
            let (surface, frame) = connected(Config::new());
            surface.dispatch_message(&MessageEvent::text(APP_ORIGIN, text));
            prop_assert_eq!(frame.phase(), Phase::Connected);
        }
    }
}
