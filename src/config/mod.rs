//! Frame configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Config`] | Configuration record of one frame |
//! | [`Mode`] | What the embedded application shows |
//! | [`DeviceClass`] | Desktop or mobile layout |
//! | [`events`] | Names of host event handlers |
//! | [`path`] | Path resolution per mode |

// ============================================================================
// Submodules
// ============================================================================

/// Names of host event handlers.
pub mod events;

/// Frame modes and device classes.
pub mod mode;

/// Configuration record.
pub mod options;

/// Iframe path resolution.
pub mod path;

// ============================================================================
// Re-exports
// ============================================================================

pub use mode::{DeviceClass, Mode};
pub use options::{Config, DEFAULT_FRAME_ID, EventHandler};
