//! Outbound envelope encoding.
//!
//! Every call posted into the iframe is wrapped in an [`Envelope`] that
//! names the target frame.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::method::Task;

// ============================================================================
// Envelope
// ============================================================================

/// Outbound message posted into the iframe.
///
/// # Format
///
/// ```json
/// {
///   "frameId": "ds-frame",
///   "type": "",
///   "data": { "type": "method", "methodName": "getFiles", "data": null }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Target frame.
    pub frame_id: String,

    /// Envelope kind; always empty for outbound calls.
    #[serde(rename = "type")]
    pub envelope_type: String,

    /// The call.
    pub data: Task,
}

impl Envelope {
    /// Wraps a task for `frame_id`.
    #[inline]
    #[must_use]
    pub fn new(frame_id: impl Into<String>, task: Task) -> Self {
        Self {
            frame_id: frame_id.into(),
            envelope_type: String::new(),
            data: task,
        }
    }
}

// ============================================================================
// Public Functions
// ============================================================================

/// Serializes a task addressed to `frame_id` into wire text.
///
/// Never fails: a task only carries strings and JSON values.
#[must_use]
pub fn encode(frame_id: &str, task: &Task) -> String {
    let envelope = Envelope::new(frame_id, task.clone());
    serde_json::to_string(&envelope).unwrap_or_else(|e| {
        warn!(frame_id, method = %task.method_name, error = %e, "Failed to encode envelope");
        String::new()
    })
}

// ============================================================================
// Tests
// ============================================================================
