//! Presentation surface capability.
//!
//! The frame logic never touches a DOM directly. Everything it needs from
//! the page (finding the placeholder, creating and replacing nodes,
//! styling, load and message events, after-paint scheduling and posting
//! into the iframe) goes through the [`Surface`] trait.
//!
//! A browser binding implements [`Surface`] over `document`/`window`;
//! [`HeadlessSurface`] implements it in memory for tests and non-browser
//! hosts.
//!
//! # Callbacks
//!
//! Surfaces invoke callbacks ([`LoadCallback`], [`PaintCallback`],
//! [`MessageListener`]) from their own event loop. Implementations must
//! not hold internal locks while doing so: callbacks re-enter the frame,
//! which calls back into the surface.

// ============================================================================
// Submodules
// ============================================================================

/// In-memory surface.
pub mod headless;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::identifiers::{ListenerId, NodeId};

// ============================================================================
// Re-exports
// ============================================================================

pub use headless::{HeadlessSurface, Node, NodeKind, PostedMessage};

// ============================================================================
// Callback Types
// ============================================================================

/// One-shot callback fired by the iframe's native load event.
pub type LoadCallback = Box<dyn FnOnce() + Send>;

/// Callback run after the next paint.
pub type PaintCallback = Box<dyn FnOnce() + Send>;

/// Listener for window-level message events.
pub type MessageListener = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

// ============================================================================
// MessageEvent
// ============================================================================

/// A window-level message event.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Origin of the sender.
    pub origin: String,
    /// Message data. Only strings are bus messages.
    pub data: Value,
}

impl MessageEvent {
    /// Creates a text message event.
    #[must_use]
    pub fn text(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: Value::String(text.into()),
        }
    }

    /// Returns the data as text, if it is a string.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.data.as_str()
    }
}

// ============================================================================
// Style
// ============================================================================

/// Ordered inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(Vec<(String, String)>);

impl Style {
    /// Creates an empty style.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing a previous value.
    #[must_use]
    pub fn set(mut self, property: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value,
            None => self.0.push((property.to_string(), value)),
        }
        self
    }

    /// Returns a property value.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `self` with every declaration of `other` applied on top.
    #[must_use]
    pub fn merged(&self, other: &Style) -> Style {
        other
            .0
            .iter()
            .fold(self.clone(), |style, (p, v)| style.set(p, v.clone()))
    }

    /// Iterates declarations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Renders the declarations as CSS text.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// Node Specs
// ============================================================================

/// Everything needed to create the iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IframeSpec {
    /// DOM id (the frame ID).
    pub id: String,
    /// Frame name attribute.
    pub name: String,
    /// Document URL.
    pub src: String,
    /// Initial style.
    pub style: Style,
    /// Permissions policy (`allow` attribute).
    pub allow: String,
}

/// Cached loader look for one frame size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderTemplate {
    /// Wrapper style.
    pub style: Style,
    /// Spinner style.
    pub spinner_style: Style,
}

/// Container that replaces the host placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// DOM id (`{frameId}-container`).
    pub id: String,
    /// Container style.
    pub style: Style,
}

// ============================================================================
// Surface
// ============================================================================

/// Page capabilities used by a frame.
pub trait Surface: Send + Sync {
    /// Origin of the host page (`https://host.example.com`).
    fn host_origin(&self) -> String;

    /// Finds an attached node by DOM id.
    fn find_element(&self, id: &str) -> Option<NodeId>;

    /// Returns the class attribute of a node.
    fn class_name(&self, node: NodeId) -> String;

    /// Creates a detached iframe.
    fn create_iframe(&self, spec: &IframeSpec) -> NodeId;

    /// Creates a detached loading indicator with DOM id `id`.
    fn create_loader(&self, id: &str, template: &LoaderTemplate) -> NodeId;

    /// Creates a detached container holding `children` in order.
    fn create_container(&self, spec: &ContainerSpec, children: &[NodeId]) -> NodeId;

    /// Creates a detached placeholder element showing `text`.
    fn create_placeholder(&self, id: &str, class_name: &str, text: &str) -> NodeId;

    /// Replaces attached node `old` with `new`.
    fn replace_node(&self, old: NodeId, new: NodeId);

    /// Removes a node from the page.
    fn remove_node(&self, node: NodeId);

    /// Applies style declarations to a node.
    fn set_style(&self, node: NodeId, style: &Style);

    /// Replaces the iframe's displayed document with inline HTML.
    fn show_document(&self, iframe: NodeId, html: &str);

    /// Registers a one-shot callback for the iframe's load event.
    fn on_load(&self, iframe: NodeId, callback: LoadCallback);

    /// Runs `callback` after the next paint.
    fn schedule_after_paint(&self, callback: PaintCallback);

    /// Adds a window-level message listener.
    fn add_message_listener(&self, listener: MessageListener) -> ListenerId;

    /// Removes a message listener.
    fn remove_message_listener(&self, listener: ListenerId);

    /// Posts `payload` to the iframe's content window.
    fn post_message(&self, iframe: NodeId, payload: &str, target_origin: &str);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_set_replaces() {
        let style = Style::new().set("width", "100%").set("opacity", "0").set("width", "50%");
        assert_eq!(style.get("width"), Some("50%"));
        assert_eq!(style.to_css(), "width: 50%; opacity: 0;");
    }

    #[test]
    fn test_style_merged() {
        let base = Style::new().set("opacity", "0").set("z-index", "2");
        let top = Style::new().set("opacity", "1");
        let merged = base.merged(&top);
        assert_eq!(merged.get("opacity"), Some("1"));
        assert_eq!(merged.get("z-index"), Some("2"));
        // The base is untouched
        assert_eq!(base.get("opacity"), Some("0"));
    }

    #[test]
    fn test_message_event_text() {
        let event = MessageEvent::text("https://a", "{}");
        assert_eq!(event.as_text(), Some("{}"));

        let event = MessageEvent {
            origin: "https://a".into(),
            data: serde_json::json!({ "frameId": "a" }),
        };
        assert_eq!(event.as_text(), None);
    }
}
