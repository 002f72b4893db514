//! Embedded frame instances.
//!
//! Each [`Instance`] owns one iframe: its configuration, DOM nodes, message
//! bus and command table.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Instance struct, phases and accessors |
//! | `lifecycle` | Mounting, loading, teardown, `set_config`, CSP |
//! | `dispatch` | Inbound messages, events and commands |
//! | `methods` | Calls into the embedded application |
//! | `cache` | Shared path and template cache |
//! | `styles` | Inline styles of the frame nodes |
//! | `assets` | Error page shown on CSP failure |
//!
//! # Example
//!
//! ```ignore
//! let frame = Instance::new(surface.clone());
//! let iframe = frame.init_frame(
//!     Config::new()
//!         .with_src("https://docspace.example.com")
//!         .on("onAppReady", |_| println!("ready")),
//! );
//!
//! // Once the iframe has loaded
//! let files = frame.get_files().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod assets;
pub mod cache;
mod core;
pub mod dispatch;
mod lifecycle;
mod methods;
pub mod styles;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::{PathKey, StyleKey, TemplateCache};
pub use self::core::{Instance, Phase};
pub use dispatch::{CommandHandler, CommandTable};

// ============================================================================
// Test Support
// ============================================================================
