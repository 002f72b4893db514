//! Error types for the frame bus.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Value-returning frame methods resolve to [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use frame_bus::{Error, Result};
//!
//! async fn example(frame: &Instance) -> Result<()> {
//!     let files = frame.get_files().await?;
//!     println!("{files}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Bus | [`Error::NotConnected`], [`Error::FrameNotMounted`], [`Error::ChannelClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Json`] |
//! | Embedding | [`Error::Csp`] |
//!
//! Errors raised by the embedded application itself are *not* mapped here:
//! they arrive as ordinary reply payloads.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

// ============================================================================
// Constants
// ============================================================================

/// Message reported when a method is called before the frame has loaded.
pub const CONNECT_ERROR_TEXT: &str = "Message bus is not connected with frame";

/// Message reported when the host origin is missing from the CSP allow-list.
pub const CSP_ERROR_TEXT: &str =
    "The current domain is not set in the Content Security Policy (CSP) settings.";

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the SDK or a frame configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument.
    ///
    /// Returned when a registration or call argument is rejected.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Bus Errors
    // ========================================================================
    /// The bus is not connected with the frame.
    ///
    /// Returned when a method is called before the iframe fired its load
    /// event, or after the frame was destroyed.
    #[error("Message bus is not connected with frame: {frame_id}")]
    NotConnected {
        /// Frame the call was addressed to.
        frame_id: String,
    },

    /// No iframe is mounted for this instance.
    #[error("Frame not mounted: {frame_id}")]
    FrameNotMounted {
        /// Frame the call was addressed to.
        frame_id: String,
    },

    /// The pending call was dropped before a response arrived.
    ///
    /// Happens when the frame is destroyed while calls are queued.
    #[error("Call dropped before a response arrived")]
    ChannelClosed(#[from] RecvError),

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Embedding Errors
    // ========================================================================
    /// Host origin rejected by the embedded application's CSP allow-list.
    #[error("CSP validation failed for {origin}: {message}")]
    Csp {
        /// Host origin that was checked.
        origin: String,
        /// Validator message.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not-connected error.
    #[inline]
    pub fn not_connected(frame_id: impl Into<String>) -> Self {
        Self::NotConnected {
            frame_id: frame_id.into(),
        }
    }

    /// Creates a frame-not-mounted error.
    #[inline]
    pub fn frame_not_mounted(frame_id: impl Into<String>) -> Self {
        Self::FrameNotMounted {
            frame_id: frame_id.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a CSP validation error.
    #[inline]
    pub fn csp(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Csp {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the call never reached the frame or was dropped.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. } | Self::FrameNotMounted { .. } | Self::ChannelClosed(_)
        )
    }

    /// Returns the message handed to the host's `onAppError` handler.
    ///
    /// Bus and CSP errors use their bare message so hosts can match on it.
    #[must_use]
    pub fn app_message(&self) -> String {
        match self {
            Self::NotConnected { .. } => CONNECT_ERROR_TEXT.to_string(),
            Self::Csp { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_connected("ds-frame");
        assert_eq!(
            err.to_string(),
            "Message bus is not connected with frame: ds-frame"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("surface is required");
        assert_eq!(err.to_string(), "Configuration error: surface is required");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::not_connected("a").is_connection_error());
        assert!(Error::frame_not_mounted("a").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::csp("https://host", "denied").is_connection_error());
    }

    #[test]
    fn test_app_message() {
        assert_eq!(Error::not_connected("a").app_message(), CONNECT_ERROR_TEXT);
        assert_eq!(Error::csp("https://host", CSP_ERROR_TEXT).app_message(), CSP_ERROR_TEXT);
        assert_eq!(Error::protocol("bad").app_message(), "Protocol error: bad");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_from_recv_error() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        drop(tx);
        let err: Error = rx.await.unwrap_err().into();
        assert!(matches!(err, Error::ChannelClosed(_)));
        assert!(err.is_connection_error());
    }
}
