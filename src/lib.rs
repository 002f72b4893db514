//! Frame Bus - Embed a web application in an iframe and drive it over
//! `postMessage`.
//!
//! This library mounts an embedded application in place of a host page
//! element and exposes its API as typed, awaitable method calls.
//!
//! # Architecture
//!
//! The host and the embedded application talk over a single channel:
//!
//! - **Host (Rust)**: Posts method calls, receives replies, events and commands
//! - **Embedded app (iframe)**: Executes methods, emits events, issues commands
//!
//! Key design principles:
//!
//! - Each [`Instance`] owns: iframe + loader + message bus + command table
//! - One call in flight per frame; replies are matched in send order
//! - Page capabilities live behind the [`Surface`] trait
//! - Instances are reused per frame ID through the [`Sdk`] registry
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use frame_bus::{Config, HeadlessSurface, Result, Sdk};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let surface = Arc::new(HeadlessSurface::new("https://host.example.com"));
//!     surface.insert_element("ds-frame", "");
//!
//!     let sdk = Sdk::builder().surface(surface.clone()).build()?;
//!     let frame = sdk.init_manager(
//!         Config::new()
//!             .with_src("https://docspace.example.com")
//!             .on("onAppReady", |_| println!("ready")),
//!     );
//!
//!     let user = frame.get_user_info().await?;
//!     println!("Signed in as {user}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Frame configuration, modes and path resolution |
//! | [`csp`] | Host origin allow-list checks |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`frame`] | Frame instances: lifecycle, dispatch, methods |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Bus message types (internal) |
//! | [`sdk`] | SDK factory and registry |
//! | [`surface`] | Host page abstraction |
//! | [`transport`] | Call queue and reply correlation (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Frame configuration.
///
/// Use [`Config::new()`] and its `with_*` methods to build a configuration.
pub mod config;

/// Content Security Policy checks.
pub mod csp;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Embedded frame instances.
///
/// - [`Instance`] - One mounted iframe and its bus
/// - [`Phase`] - Lifecycle phase of an instance
pub mod frame;

/// Type-safe identifiers for page entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Bus protocol message types.
///
/// Internal module defining envelopes, methods and inbound messages.
pub mod protocol;

/// SDK entry point.
///
/// Use [`Sdk::builder()`] to create a configured SDK.
pub mod sdk;

/// Host page abstraction.
pub mod surface;

/// Message transport layer.
///
/// Internal module handling the call queue and reply correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{Config, DeviceClass, Mode};

// CSP types
pub use csp::{AllowList, CspValidator};

// Error types
pub use error::{Error, Result};

// Frame types
pub use frame::{Instance, Phase};

// Identifier types
pub use identifiers::{ListenerId, NodeId};

// Protocol types
pub use protocol::{Method, NewRoom, Script};

// SDK types
pub use sdk::{Sdk, SdkBuilder};

// Surface types
pub use surface::{HeadlessSurface, Surface};

// Transport types
pub use transport::MethodCall;
