//! Message transport layer.
//!
//! This module serializes method calls over the `postMessage` bus and
//! routes replies back to their callers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Instance       │        postMessage           │  Embedded app   │
//! │                 │─────────────────────────────►│  (iframe)       │
//! │  MessageBus     │  one call in flight          │                 │
//! │  → PendingCall  │◄─────────────────────────────│                 │
//! │                 │  onMethodReturn (FIFO)       │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Call queue and reply correlation |
//! | `call` | Pending calls and [`MethodCall`] futures |

// ============================================================================
// Submodules
// ============================================================================

/// Call queue and reply correlation.
pub mod bus;

/// Pending calls and completion futures.
pub mod call;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::MessageBus;
pub use call::{MethodCall, PendingCall, Responder, ReturnCallback};
