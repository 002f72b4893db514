//! Inbound message decoding.
//!
//! Messages arriving from the embedded application carry a frame ID and a
//! kind discriminator:
//!
//! | Kind | Payload field | Routed to |
//! |------|---------------|-----------|
//! | `onMethodReturn` | `methodReturnData` | call correlator |
//! | `onEventReturn` | `eventReturnData` | host event handler |
//! | `onCallCommand` | `commandName`, `commandData` | command table |
//! | `error` | `error` | `onAppError` |
//!
//! [`decode`] never fails. Input that is not a JSON object of this shape
//! becomes a synthetic error message addressed to frame `"error"`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Frame ID of synthetic messages produced for undecodable input.
pub const PARSE_ERROR_FRAME_ID: &str = "error";

/// Command name carried by synthetic parse-error messages.
pub const PARSE_ERROR_COMMAND: &str = "parseMessageData";

/// Longest excerpt of rejected input copied into a parse-error message.
const MAX_EXCERPT_CHARS: usize = 256;

// ============================================================================
// MessageKind
// ============================================================================

/// Inbound message kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MessageKind {
    /// Reply to the call in flight.
    MethodReturn,
    /// Event notification for a host handler.
    EventReturn,
    /// Command invocation on the instance.
    CallCommand,
    /// Error reported by the embedded application.
    Error,
    /// Unrecognized kind.
    Other(String),
}

impl MessageKind {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MethodReturn => "onMethodReturn",
            Self::EventReturn => "onEventReturn",
            Self::CallCommand => "onCallCommand",
            Self::Error => "error",
            Self::Other(kind) => kind,
        }
    }
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for MessageKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "onMethodReturn" => Self::MethodReturn,
            "onEventReturn" => Self::EventReturn,
            "onCallCommand" => Self::CallCommand,
            "error" => Self::Error,
            _ => Self::Other(kind),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payload Types
// ============================================================================

/// Event notification payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventReturn {
    /// Handler name (`onSelectCallback`, ...).
    pub event: String,
    /// Event data.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BusError {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Optional numeric code.
    #[serde(default)]
    pub code: Option<i64>,
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A message from the embedded application.
///
/// # Format
///
/// ```json
/// {
///   "frameId": "ds-frame",
///   "type": "onEventReturn",
///   "eventReturnData": { "event": "onSelectCallback", "data": { ... } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Source frame; empty when the sender omitted it.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub frame_id: String,

    /// Message kind.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,

    /// Command name (`onCallCommand`, synthetic errors).
    #[serde(default)]
    pub command_name: Option<String>,

    /// Command argument.
    #[serde(default)]
    pub command_data: Option<Value>,

    /// Method return value.
    #[serde(default)]
    pub method_return_data: Option<Value>,

    /// Event notification.
    #[serde(default)]
    pub event_return_data: Option<EventReturn>,

    /// Error details.
    #[serde(default)]
    pub error: Option<BusError>,
}

impl InboundMessage {
    /// Builds the synthetic message for undecodable input.
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self {
            frame_id: PARSE_ERROR_FRAME_ID.to_string(),
            kind: MessageKind::Error,
            command_name: Some(PARSE_ERROR_COMMAND.to_string()),
            command_data: None,
            method_return_data: None,
            event_return_data: None,
            error: Some(BusError {
                message: detail.into(),
                code: None,
            }),
        }
    }

    /// Returns `true` if this is a synthetic parse-error message.
    #[inline]
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        self.frame_id == PARSE_ERROR_FRAME_ID
            && self.command_name.as_deref() == Some(PARSE_ERROR_COMMAND)
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

// ============================================================================
// Public Functions
// ============================================================================

/// Decodes wire text into an [`InboundMessage`]. Never fails.
#[must_use]
pub fn decode(text: &str) -> InboundMessage {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return InboundMessage::parse_error(format!(
                "invalid JSON ({e}): {}",
                excerpt(text)
            ));
        }
    };

    if !value.is_object() {
        return InboundMessage::parse_error(format!(
            "expected an object: {}",
            excerpt(text)
        ));
    }

    serde_json::from_value(value).unwrap_or_else(|e| {
        InboundMessage::parse_error(format!("malformed message ({e}): {}", excerpt(text)))
    })
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Accepts a string or `null` (mapped to an empty string).
fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cuts rejected input to a loggable length.
fn excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

// ============================================================================
// Tests
// ============================================================================
