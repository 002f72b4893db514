//! SDK entry point.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Sdk`] | Factory of frames, one per page |
//! | [`SdkBuilder`] | Fluent configuration builder |
//! | [`Registry`] | Live frames keyed by frame ID |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for the SDK.
pub mod builder;

/// Core SDK implementation.
pub mod core;

/// Frame registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Sdk;
pub use builder::SdkBuilder;
pub use registry::Registry;
