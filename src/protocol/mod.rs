//! Bus protocol message types.
//!
//! This module defines the wire format between the host (Rust) and the
//! embedded application, carried as JSON text over `postMessage`.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Envelope`] + [`Task`] | Host → Frame | Method call |
//! | `onMethodReturn` | Frame → Host | Reply to the call in flight |
//! | `onEventReturn` | Frame → Host | Event for a host handler |
//! | `onCallCommand` | Frame → Host | Command on the instance |
//! | `error` | Frame → Host | Error report |
//!
//! Replies carry no call identifier: they are matched to calls strictly in
//! send order.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Outbound envelope and [`encode`] |
//! | `message` | Inbound messages and [`decode`] |
//! | `method` | Method definitions |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound envelope encoding.
pub mod envelope;

/// Inbound message decoding.
pub mod message;

/// Method definitions.
pub mod method;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, encode};
pub use message::{BusError, EventReturn, InboundMessage, MessageKind, decode};
pub use method::{Method, NewRoom, SET_CONFIG, Script, Task};
