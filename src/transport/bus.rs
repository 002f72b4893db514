//! Call queue and reply correlation.
//!
//! Replies carry no call identifier, so the bus keeps exactly one call in
//! flight per frame. Further calls wait in a FIFO task queue and are posted
//! one by one as replies arrive:
//!
//! ```text
//! execute(A) ─► post A          callbacks [A]       tasks []
//! execute(B) ─► defer           callbacks [A, B]    tasks [B]
//! execute(C) ─► defer           callbacks [A, B, C] tasks [B, C]
//! reply      ─► resolve A, post B
//! reply      ─► resolve B, post C
//! ```
//!
//! The embedded application must answer calls in the order it receives
//! them; the bus cannot detect a reordering.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::protocol::{Task, encode};
use crate::surface::Surface;

use super::call::{PendingCall, Responder};

// ============================================================================
// Types
// ============================================================================

/// Where outbound messages are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    /// Iframe receiving the messages.
    iframe: NodeId,
    /// Target origin for `postMessage`.
    origin: String,
}

/// Queue state behind the bus lock.
#[derive(Default)]
struct BusState {
    /// Frame ID written into every envelope. Survives [`MessageBus::reset`].
    frame_id: String,
    /// Set between the iframe load event and teardown.
    connected: bool,
    /// Mounted iframe, if any.
    target: Option<Target>,
    /// Calls awaiting a reply; the head is in flight.
    callbacks: VecDeque<PendingCall>,
    /// Deferred calls, not yet posted.
    tasks: VecDeque<Task>,
}

// ============================================================================
// MessageBus
// ============================================================================

/// Point-to-point message channel between the host and one iframe.
pub struct MessageBus {
    /// Surface used to post messages.
    surface: Arc<dyn Surface>,
    /// Queue state.
    state: Mutex<BusState>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MessageBus")
            .field("frame_id", &state.frame_id)
            .field("connected", &state.connected)
            .field("target", &state.target)
            .field("pending", &state.callbacks.len())
            .field("queued", &state.tasks.len())
            .finish()
    }
}

// ============================================================================
// MessageBus - Lifecycle
// ============================================================================

impl MessageBus {
    /// Creates a detached, disconnected bus.
    #[must_use]
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            state: Mutex::new(BusState::default()),
        }
    }

    /// Points the bus at a freshly mounted iframe. Stays disconnected.
    pub fn attach(&self, frame_id: impl Into<String>, iframe: NodeId, origin: impl Into<String>) {
        let frame_id = frame_id.into();
        debug!(%frame_id, %iframe, "Bus attached");
        let mut state = self.state.lock();
        state.frame_id = frame_id;
        state.target = Some(Target {
            iframe,
            origin: origin.into(),
        });
    }

    /// Marks the bus connected. Has no effect without an attached iframe.
    pub fn connect(&self) -> bool {
        let mut state = self.state.lock();
        state.connected = state.target.is_some();
        state.connected
    }

    /// Disconnects, detaches and drops every pending and deferred call.
    /// The frame ID is kept for error reporting.
    ///
    /// Futures waiting on dropped calls resolve to
    /// [`Error::ChannelClosed`].
    pub fn reset(&self) {
        let dropped = {
            let mut state = self.state.lock();
            state.connected = false;
            state.target = None;
            state.tasks.clear();
            std::mem::take(&mut state.callbacks)
        };
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Dropped pending calls");
        }
    }
}

// ============================================================================
// MessageBus - Accessors
// ============================================================================

impl MessageBus {
    /// Returns `true` while the iframe is loaded and not torn down.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Returns the number of calls awaiting a reply (in flight + deferred).
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    /// Returns the number of deferred calls not yet posted.
    #[inline]
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Returns the method names awaiting a reply, oldest first.
    #[must_use]
    pub fn pending_methods(&self) -> Vec<String> {
        self.state
            .lock()
            .callbacks
            .iter()
            .map(|call| call.method_name.clone())
            .collect()
    }
}

// ============================================================================
// MessageBus - Calls
// ============================================================================

impl MessageBus {
    /// Queues a call and posts it if nothing else is in flight.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the bus is disconnected and the task is
    ///   not a configuration update; nothing is queued
    /// - [`Error::FrameNotMounted`] if no iframe is attached
    pub fn execute(&self, task: Task, responder: Responder) -> Result<()> {
        let (target, frame_id) = {
            let mut state = self.state.lock();

            if !state.connected && !task.is_config_update() {
                warn!(frame_id = %state.frame_id, method = %task.method_name, "Call on disconnected bus");
                return Err(Error::not_connected(state.frame_id.clone()));
            }

            let Some(target) = state.target.clone() else {
                return Err(Error::frame_not_mounted(state.frame_id.clone()));
            };

            state.callbacks.push_back(PendingCall::new(task.method_name.clone(), responder));

            if state.callbacks.len() > 1 {
                trace!(
                    method = %task.method_name,
                    pending = state.callbacks.len(),
                    "Call deferred"
                );
                state.tasks.push_back(task);
                return Ok(());
            }

            (target, state.frame_id.clone())
        };

        self.post(&target, &frame_id, &task);
        Ok(())
    }

    /// Handles a method-return message.
    ///
    /// Resolves the oldest pending call (with `{}` when `data` is missing),
    /// then posts the next deferred call, whether or not a pending call
    /// was found.
    pub fn on_method_return(&self, data: Option<Value>) {
        let pending = self.state.lock().callbacks.pop_front();

        match pending {
            Some(call) => {
                trace!(method = %call.method_name, "Reply received");
                call.resolve(data.unwrap_or_else(|| Value::Object(Map::new())));
            }
            None => debug!("Reply with no pending call"),
        }

        let next = {
            let mut state = self.state.lock();
            match state.target.clone() {
                Some(target) => {
                    let frame_id = state.frame_id.clone();
                    state
                        .tasks
                        .pop_front()
                        .map(|task| (target, frame_id, task))
                }
                None => None,
            }
        };

        if let Some((target, frame_id, task)) = next {
            self.post(&target, &frame_id, &task);
        }
    }

    /// Encodes and posts a task.
    fn post(&self, target: &Target, frame_id: &str, task: &Task) {
        let payload = encode(frame_id, task);
        trace!(%frame_id, method = %task.method_name, "Posting call");
        self.surface.post_message(target.iframe, &payload, &target.origin);
    }
}

// ============================================================================
// Tests
// ============================================================================
