//! Type-safe identifiers for surface resources.
//!
//! Newtype wrappers prevent mixing node handles and listener handles at
//! compile time. Both are minted by a [`Surface`](crate::surface::Surface)
//! implementation and are opaque to the rest of the crate.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// NodeId
// ============================================================================

/// Handle to a node (placeholder, iframe, loader, container) on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node ID from a raw surface value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw surface value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle to a message listener registered on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a listener ID from a raw surface value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw surface value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
