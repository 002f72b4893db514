//! In-memory presentation surface.
//!
//! [`HeadlessSurface`] keeps a flat node table instead of a DOM. It records
//! every posted message and holds load callbacks, paint callbacks and
//! message listeners until the host (or a test) fires them explicitly.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use frame_bus::{Config, Instance, surface::HeadlessSurface};
//!
//! let surface = Arc::new(HeadlessSurface::new("https://host.example.com"));
//! surface.insert_element("ds-frame", "frame-slot");
//!
//! let frame = Instance::new(surface.clone());
//! let iframe = frame.init_frame(Config::new().with_src("https://app.example.com"));
//! surface.fire_load(iframe.unwrap());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::trace;

use crate::identifiers::{ListenerId, NodeId};

use super::{
    ContainerSpec, IframeSpec, LoadCallback, LoaderTemplate, MessageEvent, MessageListener,
    PaintCallback, Style, Surface,
};

// ============================================================================
// Types
// ============================================================================

/// Kind of a headless node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Host-provided element or destroy placeholder.
    Element,
    /// Embedded application frame.
    Iframe,
    /// Loading indicator.
    Loader,
    /// Wrapper replacing the placeholder.
    Container,
}

/// Snapshot of a headless node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// DOM id.
    pub dom_id: String,
    /// Class attribute.
    pub class_name: String,
    /// Text content (placeholders).
    pub text: String,
    /// Current inline style.
    pub style: Style,
    /// Document URL (iframes).
    pub src: Option<String>,
    /// Inline document (iframes showing an error page).
    pub document: Option<String>,
    /// Child nodes.
    pub children: Vec<NodeId>,
    /// Parent node, if nested.
    pub parent: Option<NodeId>,
    /// Attached to the page.
    pub attached: bool,
}

impl Node {
    /// Creates a detached node.
    fn detached(kind: NodeKind, dom_id: &str) -> Self {
        Self {
            kind,
            dom_id: dom_id.to_string(),
            class_name: String::new(),
            text: String::new(),
            style: Style::new(),
            src: None,
            document: None,
            children: Vec::new(),
            parent: None,
            attached: false,
        }
    }
}

/// A message posted into an iframe.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    /// Target iframe.
    pub target: NodeId,
    /// Wire text.
    pub payload: String,
    /// Target origin.
    pub target_origin: String,
}

impl PostedMessage {
    /// Parses the payload as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.payload).unwrap_or(Value::Null)
    }

    /// Returns the posted method name, if the payload is a method envelope.
    #[must_use]
    pub fn method_name(&self) -> Option<String> {
        self.json()
            .pointer("/data/methodName")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Mutable state behind the surface lock.
#[derive(Default)]
struct HeadlessState {
    /// Last minted raw ID.
    next_id: u64,
    /// All nodes ever created.
    nodes: FxHashMap<NodeId, Node>,
    /// Pending load callbacks per iframe.
    load_callbacks: FxHashMap<NodeId, Vec<LoadCallback>>,
    /// Pending after-paint callbacks.
    paint_queue: VecDeque<PaintCallback>,
    /// Registered message listeners.
    listeners: FxHashMap<ListenerId, MessageListener>,
    /// Posted messages, oldest first.
    posted: Vec<PostedMessage>,
}

impl HeadlessState {
    /// Mints the next raw ID.
    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Stores a node and returns its handle.
    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.mint());
        self.nodes.insert(id, node);
        id
    }

    /// Sets the attached flag on a subtree.
    fn set_attached(&mut self, root: NodeId, attached: bool) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.attached = attached;
                stack.extend(node.children.iter().copied());
            }
        }
    }
}

// ============================================================================
// HeadlessSurface
// ============================================================================

/// In-memory [`Surface`] implementation.
pub struct HeadlessSurface {
    /// Host page origin.
    origin: String,
    /// Node table and queues.
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    /// Creates an empty surface for a host page at `origin`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            state: Mutex::new(HeadlessState::default()),
        }
    }
}

// ============================================================================
// HeadlessSurface - Page Setup
// ============================================================================

impl HeadlessSurface {
    /// Adds an attached host element (a frame placeholder).
    pub fn insert_element(&self, dom_id: &str, class_name: &str) -> NodeId {
        let mut node = Node::detached(NodeKind::Element, dom_id);
        node.class_name = class_name.to_string();
        node.attached = true;
        self.state.lock().insert(node)
    }

    /// Returns a snapshot of a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.state.lock().nodes.get(&id).cloned()
    }

    /// Returns the attached node with DOM id `dom_id`.
    #[must_use]
    pub fn element(&self, dom_id: &str) -> Option<Node> {
        let id = self.find_element(dom_id)?;
        self.node(id)
    }
}

// ============================================================================
// HeadlessSurface - Event Control
// ============================================================================

impl HeadlessSurface {
    /// Fires the load event of an iframe. Returns `false` if nothing listened.
    pub fn fire_load(&self, iframe: NodeId) -> bool {
        let callbacks = self
            .state
            .lock()
            .load_callbacks
            .remove(&iframe)
            .unwrap_or_default();
        let fired = !callbacks.is_empty();
        for callback in callbacks {
            callback();
        }
        trace!(%iframe, fired, "Load fired");
        fired
    }

    /// Runs after-paint callbacks until the queue stays empty.
    ///
    /// Returns the number of callbacks run.
    pub fn flush_paint(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.state.lock().paint_queue.pop_front();
            match next {
                Some(callback) => {
                    callback();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Delivers a message event to every listener.
    pub fn dispatch_message(&self, event: &MessageEvent) {
        let listeners: Vec<MessageListener> =
            self.state.lock().listeners.values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Delivers `payload` as JSON text from the host's own origin.
    pub fn dispatch_json(&self, payload: &Value) {
        let event = MessageEvent::text(self.origin.clone(), payload.to_string());
        self.dispatch_message(&event);
    }

    /// Returns all posted messages.
    #[must_use]
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.state.lock().posted.clone()
    }

    /// Returns and clears the posted messages.
    pub fn take_posted(&self) -> Vec<PostedMessage> {
        std::mem::take(&mut self.state.lock().posted)
    }

    /// Returns the number of registered message listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Returns the number of queued after-paint callbacks.
    #[must_use]
    pub fn pending_paint(&self) -> usize {
        self.state.lock().paint_queue.len()
    }
}

// ============================================================================
// Surface Implementation
// ============================================================================

impl Surface for HeadlessSurface {
    fn host_origin(&self) -> String {
        self.origin.clone()
    }

    fn find_element(&self, id: &str) -> Option<NodeId> {
        self.state
            .lock()
            .nodes
            .iter()
            .filter(|(_, node)| node.attached && node.dom_id == id)
            .map(|(node_id, _)| *node_id)
            .min()
    }

    fn class_name(&self, node: NodeId) -> String {
        self.state
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.class_name.clone())
            .unwrap_or_default()
    }

    fn create_iframe(&self, spec: &IframeSpec) -> NodeId {
        let mut node = Node::detached(NodeKind::Iframe, &spec.id);
        node.style = spec.style.clone();
        node.src = Some(spec.src.clone());
        self.state.lock().insert(node)
    }

    fn create_loader(&self, id: &str, template: &LoaderTemplate) -> NodeId {
        let mut node = Node::detached(NodeKind::Loader, id);
        node.style = template.style.clone();
        self.state.lock().insert(node)
    }

    fn create_container(&self, spec: &ContainerSpec, children: &[NodeId]) -> NodeId {
        let mut state = self.state.lock();
        let mut node = Node::detached(NodeKind::Container, &spec.id);
        node.style = spec.style.clone();
        node.children = children.to_vec();
        let container = state.insert(node);
        for child in children {
            if let Some(node) = state.nodes.get_mut(child) {
                node.parent = Some(container);
            }
        }
        container
    }

    fn create_placeholder(&self, id: &str, class_name: &str, text: &str) -> NodeId {
        let mut node = Node::detached(NodeKind::Element, id);
        node.class_name = class_name.to_string();
        node.text = text.to_string();
        self.state.lock().insert(node)
    }

    fn replace_node(&self, old: NodeId, new: NodeId) {
        let mut state = self.state.lock();
        state.set_attached(old, false);
        state.set_attached(new, true);
    }

    fn remove_node(&self, node: NodeId) {
        let mut state = self.state.lock();
        state.set_attached(node, false);
        let parent = state.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn set_style(&self, node: NodeId, style: &Style) {
        if let Some(node) = self.state.lock().nodes.get_mut(&node) {
            node.style = node.style.merged(style);
        }
    }

    fn show_document(&self, iframe: NodeId, html: &str) {
        if let Some(node) = self.state.lock().nodes.get_mut(&iframe) {
            node.document = Some(html.to_string());
        }
    }

    fn on_load(&self, iframe: NodeId, callback: LoadCallback) {
        self.state
            .lock()
            .load_callbacks
            .entry(iframe)
            .or_default()
            .push(callback);
    }

    fn schedule_after_paint(&self, callback: PaintCallback) {
        self.state.lock().paint_queue.push_back(callback);
    }

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId::new(state.mint());
        state.listeners.insert(id, listener);
        id
    }

    fn remove_message_listener(&self, listener: ListenerId) {
        self.state.lock().listeners.remove(&listener);
    }

    fn post_message(&self, iframe: NodeId, payload: &str, target_origin: &str) {
        self.state.lock().posted.push(PostedMessage {
            target: iframe,
            payload: payload.to_string(),
            target_origin: target_origin.to_string(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
