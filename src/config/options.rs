//! Frame configuration record.
//!
//! A [`Config`] is a shallow JSON record plus a map of host event handlers.
//! Records are merged field by field, later values winning, which is how
//! defaults, the previous configuration and a new one combine on every
//! `init_frame`/`set_config` call.
//!
//! # Example
//!
//! ```ignore
//! use frame_bus::{Config, Mode};
//!
//! let config = Config::new()
//!     .with_frame_id("ds-frame")
//!     .with_src("https://docspace.example.com")
//!     .with_mode(Mode::Manager)
//!     .with_size("100%", "720px")
//!     .on("onAppReady", |_| println!("ready"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

use super::mode::{DeviceClass, Mode};

// ============================================================================
// Constants
// ============================================================================

/// Frame ID used when the configuration does not name one.
pub const DEFAULT_FRAME_ID: &str = "ds-frame";

/// Dimension used when width or height is missing.
pub const DEFAULT_DIMENSION: &str = "100%";

// ============================================================================
// Types
// ============================================================================

/// Host callback invoked with an event payload.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

// ============================================================================
// Config
// ============================================================================

/// Configuration of one embedded frame.
///
/// [`Config::new`] is empty; [`Config::defaults`] holds the library
/// defaults. Accessors fall back to the defaults when a field is missing.
#[derive(Clone, Default)]
pub struct Config {
    /// Plain configuration fields, camelCase keys.
    values: Map<String, Value>,
    /// Host handlers keyed by event name.
    events: FxHashMap<String, EventHandler>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.events.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("Config")
            .field("values", &self.values)
            .field("events", &events)
            .finish()
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Config {
    /// Creates an empty configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the library default configuration.
    #[must_use]
    pub fn defaults() -> Self {
        let values = json!({
            "frameId": DEFAULT_FRAME_ID,
            "mode": Mode::Manager.as_str(),
            "width": DEFAULT_DIMENSION,
            "height": DEFAULT_DIMENSION,
            "type": DeviceClass::Desktop.as_str(),
            "theme": "System",
            "locale": null,
            "rootPath": "/rooms/shared/",
            "requestToken": null,
            "id": null,
            "editorType": "desktop",
            "editorGoBack": true,
            "selectorType": "exceptPrivacyRoom",
            "showHeader": false,
            "showTitle": true,
            "showMenu": false,
            "showFilter": false,
            "viewAs": "row",
            "checkCSP": true,
            "waiting": false,
            "noLoader": false,
            "destroyText": "",
            "filter": {
                "count": 100,
                "page": 1,
                "sortorder": "descending",
                "sortby": "DateAndTime",
                "search": "",
                "withSubfolders": false,
            },
            "keysForReload": [
                "src",
                "rootPath",
                "width",
                "height",
                "name",
                "type",
                "id",
                "mode",
                "editorType",
                "requestToken",
            ],
        });

        match values {
            Value::Object(values) => Self {
                values,
                events: FxHashMap::default(),
            },
            _ => Self::default(),
        }
    }

    /// Builds a configuration from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self {
                values,
                events: FxHashMap::default(),
            }),
            other => Err(Error::invalid_argument(format!(
                "configuration must be an object, got {other}"
            ))),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets an arbitrary field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Sets the frame ID (the DOM id of the placeholder element).
    #[inline]
    #[must_use]
    pub fn with_frame_id(self, frame_id: impl Into<String>) -> Self {
        self.with("frameId", frame_id.into())
    }

    /// Sets the origin of the embedded application.
    #[inline]
    #[must_use]
    pub fn with_src(self, src: impl Into<String>) -> Self {
        self.with("src", src.into())
    }

    /// Sets the mode.
    #[inline]
    #[must_use]
    pub fn with_mode(self, mode: Mode) -> Self {
        self.with("mode", mode.as_str())
    }

    /// Sets the item ID (folder, room or file depending on mode).
    #[inline]
    #[must_use]
    pub fn with_id(self, id: impl Into<Value>) -> Self {
        self.with("id", id)
    }

    /// Sets width and height (CSS lengths).
    #[must_use]
    pub fn with_size(self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.with("width", width.into()).with("height", height.into())
    }

    /// Sets the device class.
    #[inline]
    #[must_use]
    pub fn with_device(self, device: DeviceClass) -> Self {
        self.with("type", device.as_str())
    }

    /// Sets the theme name.
    #[inline]
    #[must_use]
    pub fn with_theme(self, theme: impl Into<String>) -> Self {
        self.with("theme", theme.into())
    }

    /// Sets the locale.
    #[inline]
    #[must_use]
    pub fn with_locale(self, locale: impl Into<String>) -> Self {
        self.with("locale", locale.into())
    }

    /// Suppresses the loading indicator.
    #[inline]
    #[must_use]
    pub fn with_no_loader(self, no_loader: bool) -> Self {
        self.with("noLoader", no_loader)
    }

    /// Enables or disables the CSP allow-list check.
    #[inline]
    #[must_use]
    pub fn with_check_csp(self, check_csp: bool) -> Self {
        self.with("checkCSP", check_csp)
    }

    /// Sets the waiting flag.
    #[inline]
    #[must_use]
    pub fn with_waiting(self, waiting: bool) -> Self {
        self.with("waiting", waiting)
    }

    /// Sets the text shown in the placeholder after the frame is destroyed.
    #[inline]
    #[must_use]
    pub fn with_destroy_text(self, text: impl Into<String>) -> Self {
        self.with("destroyText", text.into())
    }

    /// Sets the request token (public links, shared rooms).
    #[inline]
    #[must_use]
    pub fn with_request_token(self, token: impl Into<String>) -> Self {
        self.with("requestToken", token.into())
    }

    /// Sets the manager root path.
    #[inline]
    #[must_use]
    pub fn with_root_path(self, root_path: impl Into<String>) -> Self {
        self.with("rootPath", root_path.into())
    }

    /// Sets the list filter.
    #[inline]
    #[must_use]
    pub fn with_filter(self, filter: Value) -> Self {
        self.with("filter", filter)
    }

    /// Sets the list view (`row`, `table`, `tile`).
    #[inline]
    #[must_use]
    pub fn with_view_as(self, view: impl Into<String>) -> Self {
        self.with("viewAs", view.into())
    }

    /// Sets the editor flavor (`desktop`, `embedded`, `mobile`).
    #[inline]
    #[must_use]
    pub fn with_editor_type(self, editor_type: impl Into<String>) -> Self {
        self.with("editorType", editor_type.into())
    }

    /// Shows or hides the editor's "go back" button.
    #[inline]
    #[must_use]
    pub fn with_editor_go_back(self, go_back: bool) -> Self {
        self.with("editorGoBack", go_back)
    }

    /// Sets which rooms the room selector offers.
    #[inline]
    #[must_use]
    pub fn with_selector_type(self, selector_type: impl Into<String>) -> Self {
        self.with("selectorType", selector_type.into())
    }

    /// Sets the keys whose change forces a frame reload in `set_config`.
    #[must_use]
    pub fn with_keys_for_reload<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<Value> = keys.into_iter().map(|k| Value::String(k.into())).collect();
        self.with("keysForReload", keys)
    }

    /// Registers a handler for an event.
    #[must_use]
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.events.insert(event.into(), Arc::new(handler));
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Config {
    /// Returns a raw field.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a string field, ignoring empty strings.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Returns a boolean field, or `default` when missing.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Returns the frame ID.
    #[must_use]
    pub fn frame_id(&self) -> &str {
        self.get_str("frameId").unwrap_or(DEFAULT_FRAME_ID)
    }

    /// Returns the embedded application origin, if set.
    #[inline]
    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.get_str("src")
    }

    /// Returns the mode. Unknown names fall back to [`Mode::Manager`].
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.get_str("mode").and_then(Mode::parse).unwrap_or_default()
    }

    /// Returns the item ID as a string. Numeric IDs are formatted.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.values.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns the width (CSS length).
    #[must_use]
    pub fn width(&self) -> &str {
        self.get_str("width").unwrap_or(DEFAULT_DIMENSION)
    }

    /// Returns the height (CSS length).
    #[must_use]
    pub fn height(&self) -> &str {
        self.get_str("height").unwrap_or(DEFAULT_DIMENSION)
    }

    /// Returns the device class.
    #[must_use]
    pub fn device(&self) -> DeviceClass {
        self.get_str("type").map(DeviceClass::parse).unwrap_or_default()
    }

    /// Returns the theme name.
    #[must_use]
    pub fn theme(&self) -> &str {
        self.get_str("theme").unwrap_or("System")
    }

    /// Returns `true` if the loading indicator is suppressed.
    #[inline]
    #[must_use]
    pub fn no_loader(&self) -> bool {
        self.get_bool("noLoader", false)
    }

    /// Returns `true` if the CSP allow-list must be checked.
    #[inline]
    #[must_use]
    pub fn check_csp(&self) -> bool {
        self.get_bool("checkCSP", true)
    }

    /// Returns the waiting flag.
    #[inline]
    #[must_use]
    pub fn waiting(&self) -> bool {
        self.get_bool("waiting", false)
    }

    /// Returns the text shown after the frame is destroyed.
    #[must_use]
    pub fn destroy_text(&self) -> &str {
        self.get_str("destroyText").unwrap_or_default()
    }

    /// Returns the request token, if any.
    #[inline]
    #[must_use]
    pub fn request_token(&self) -> Option<&str> {
        self.get_str("requestToken")
    }

    /// Returns the list filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&Map<String, Value>> {
        self.values.get("filter").and_then(Value::as_object)
    }

    /// Returns the keys whose change forces a reload.
    #[must_use]
    pub fn keys_for_reload(&self) -> Vec<&str> {
        self.values
            .get("keysForReload")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the handler registered for `event`.
    #[must_use]
    pub fn handler(&self, event: &str) -> Option<EventHandler> {
        self.events.get(event).cloned()
    }

    /// Returns `true` if a handler is registered for `event`.
    #[inline]
    #[must_use]
    pub fn has_handler(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Returns the plain fields as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

// ============================================================================
// Merging
// ============================================================================

impl Config {
    /// Returns `self` overlaid with `later`; later fields and handlers win.
    #[must_use]
    pub fn merged(&self, later: &Config) -> Config {
        let mut merged = self.clone();
        for (key, value) in &later.values {
            merged.values.insert(key.clone(), value.clone());
        }
        for (event, handler) in &later.events {
            merged.events.insert(event.clone(), Arc::clone(handler));
        }
        merged
    }

    /// Returns the fields of `patch` whose value differs from `self`.
    #[must_use]
    pub fn changed_keys<'a>(&self, patch: &'a Config) -> Vec<&'a str> {
        patch
            .values
            .iter()
            .filter(|(key, value)| self.values.get(key.as_str()) != Some(*value))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Returns `true` if applying `patch` changes a reload key.
    #[must_use]
    pub fn requires_reload(&self, patch: &Config) -> bool {
        let reload_keys = self.keys_for_reload();
        self.changed_keys(patch)
            .iter()
            .any(|key| reload_keys.contains(key))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_is_empty() {
        let config = Config::new();
        assert!(config.get("frameId").is_none());
        assert_eq!(config.frame_id(), DEFAULT_FRAME_ID);
        assert_eq!(config.mode(), Mode::Manager);
        assert_eq!(config.width(), "100%");
    }

    #[test]
    fn test_defaults() {
        let config = Config::defaults();
        assert_eq!(config.frame_id(), "ds-frame");
        assert!(config.check_csp());
        assert!(!config.no_loader());
        assert_eq!(config.theme(), "System");
        assert!(config.keys_for_reload().contains(&"src"));
        assert_eq!(
            config.filter().and_then(|f| f.get("count")),
            Some(&json!(100))
        );
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::new()
            .with_frame_id("frame-a")
            .with_src("https://docspace.example.com")
            .with_mode(Mode::RoomSelector)
            .with_id(42)
            .with_size("800px", "600px")
            .with_device(DeviceClass::Mobile)
            .with_no_loader(true);

        assert_eq!(config.frame_id(), "frame-a");
        assert_eq!(config.src(), Some("https://docspace.example.com"));
        assert_eq!(config.mode(), Mode::RoomSelector);
        assert_eq!(config.id().as_deref(), Some("42"));
        assert_eq!(config.width(), "800px");
        assert_eq!(config.height(), "600px");
        assert_eq!(config.device(), DeviceClass::Mobile);
        assert!(config.no_loader());
    }

    #[test]
    fn test_merge_later_wins() {
        let base = Config::defaults().with_theme("Dark");
        let patch = Config::new().with_frame_id("b").with_theme("Light");

        let merged = base.merged(&patch);
        assert_eq!(merged.frame_id(), "b");
        assert_eq!(merged.theme(), "Light");
        // Untouched defaults survive
        assert_eq!(merged.get_str("rootPath"), Some("/rooms/shared/"));
    }

    #[test]
    fn test_merge_keeps_and_overrides_handlers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&hits);
        let second = Arc::clone(&hits);

        let base = Config::new().on("onAppReady", move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let patch = Config::new().on("onAppReady", move |_| {
            second.fetch_add(10, Ordering::SeqCst);
        });

        let merged = base.merged(&patch);
        let handler = merged.handler("onAppReady").expect("handler");
        handler(Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_serialize_skips_handlers() {
        let config = Config::new().with_frame_id("a").on("onAppReady", |_| {});
        let json = serde_json::to_value(&config).expect("serialize");
        assert_eq!(json, json!({ "frameId": "a" }));
    }

    #[test]
    fn test_from_value() {
        let config = Config::from_value(json!({ "theme": "Dark" })).expect("object");
        assert_eq!(config.theme(), "Dark");
        assert!(Config::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_requires_reload() {
        let current = Config::defaults().with_src("https://a.example.com");

        let same = Config::new().with_src("https://a.example.com");
        assert!(!current.requires_reload(&same));

        let moved = Config::new().with_src("https://b.example.com");
        assert!(current.requires_reload(&moved));

        let cosmetic = Config::new().with_theme("Dark");
        assert!(!current.requires_reload(&cosmetic));
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let config = Config::new().with_src("").with_frame_id("");
        assert_eq!(config.src(), None);
        assert_eq!(config.frame_id(), DEFAULT_FRAME_ID);
    }
}
