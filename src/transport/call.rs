//! Pending calls and their completion futures.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{error, trace};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Single-shot callback receiving a method's return value.
pub type ReturnCallback = Box<dyn FnOnce(Value) + Send>;

// ============================================================================
// Responder
// ============================================================================

/// Where a method's return value goes.
pub enum Responder {
    /// Resolve a [`MethodCall`] future.
    Channel(oneshot::Sender<Value>),
    /// Invoke a host callback.
    Callback(ReturnCallback),
    /// Discard the value.
    Ignore,
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(_) => f.write_str("Channel"),
            Self::Callback(_) => f.write_str("Callback"),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}

// ============================================================================
// PendingCall
// ============================================================================

/// A call waiting for its return value.
#[derive(Debug)]
pub struct PendingCall {
    /// Wire method name.
    pub method_name: String,
    /// Destination of the return value.
    pub responder: Responder,
}

impl PendingCall {
    /// Creates a pending call.
    #[inline]
    #[must_use]
    pub fn new(method_name: impl Into<String>, responder: Responder) -> Self {
        Self {
            method_name: method_name.into(),
            responder,
        }
    }

    /// Delivers the return value.
    ///
    /// A panicking host callback is logged and swallowed so the bus keeps
    /// running.
    pub fn resolve(self, value: Value) {
        match self.responder {
            Responder::Channel(tx) => {
                if tx.send(value).is_err() {
                    trace!(method = %self.method_name, "Caller dropped before the reply");
                }
            }
            Responder::Callback(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                    error!(method = %self.method_name, "Method callback panicked");
                }
            }
            Responder::Ignore => {}
        }
    }
}

// ============================================================================
// MethodCall
// ============================================================================

/// Future resolving to a method's return value.
///
/// The call is queued (or rejected) when the `MethodCall` is created, not
/// when it is first polled, so calls keep the order in which they were
/// issued.
///
/// Resolves to:
/// - `Ok(value)` with whatever the embedded application returned,
///   including application-level error shapes
/// - `Err(Error::NotConnected)` if the bus was not connected
/// - `Err(Error::ChannelClosed)` if the frame was destroyed first
#[must_use = "a MethodCall does nothing unless awaited or dropped deliberately"]
pub struct MethodCall {
    state: CallState,
}

/// Internal completion state.
enum CallState {
    /// Waiting for the reply.
    Waiting(oneshot::Receiver<Value>),
    /// Already settled.
    Ready(Option<Result<Value>>),
}

impl MethodCall {
    /// Creates a call waiting on `rx`.
    #[inline]
    pub(crate) fn waiting(rx: oneshot::Receiver<Value>) -> Self {
        Self {
            state: CallState::Waiting(rx),
        }
    }

    /// Creates a call that is already settled.
    #[inline]
    pub fn ready(result: Result<Value>) -> Self {
        Self {
            state: CallState::Ready(Some(result)),
        }
    }

    /// Returns `true` if the call settled without reaching the frame.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.state, CallState::Ready(_))
    }

    /// Waits for the reply and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or [`Error::Json`] if the reply does
    /// not have the shape of `T`.
    pub async fn parse<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Debug for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            CallState::Waiting(_) => "waiting",
            CallState::Ready(Some(Ok(_))) => "ok",
            CallState::Ready(Some(Err(_))) => "err",
            CallState::Ready(None) => "taken",
        };
        f.debug_struct("MethodCall").field("state", &state).finish()
    }
}

impl Future for MethodCall {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            CallState::Waiting(rx) => Pin::new(rx).poll(cx).map(|r| r.map_err(Error::from)),
            CallState::Ready(slot) => Poll::Ready(
                slot.take()
                    .unwrap_or_else(|| Err(Error::protocol("MethodCall polled after completion"))),
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
