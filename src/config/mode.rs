//! Frame modes and device classes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Mode
// ============================================================================

/// What the embedded application shows inside the frame.
///
/// Serialized in kebab-case (`"room-selector"`), matching the `mode` field
/// of the configuration record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Full file manager.
    #[default]
    Manager,
    /// Document editor.
    Editor,
    /// Read-only document viewer.
    Viewer,
    /// Room picker dialog.
    RoomSelector,
    /// File picker dialog.
    FileSelector,
    /// Invisible frame used only for API calls (login, hashing).
    System,
    /// Shared room opened by public link.
    PublicRoom,
}

impl Mode {
    /// Returns the wire name of the mode.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
            Self::RoomSelector => "room-selector",
            Self::FileSelector => "file-selector",
            Self::System => "system",
            Self::PublicRoom => "public-room",
        }
    }

    /// Parses a wire name. Returns `None` for unknown modes.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "manager" => Some(Self::Manager),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            "room-selector" => Some(Self::RoomSelector),
            "file-selector" => Some(Self::FileSelector),
            "system" => Some(Self::System),
            "public-room" => Some(Self::PublicRoom),
            _ => None,
        }
    }

    /// Returns `true` if frames in this mode are shown without a loader.
    #[inline]
    #[must_use]
    pub const fn skips_loader(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DeviceClass
// ============================================================================

/// Layout class passed as the `type` configuration field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Desktop layout.
    #[default]
    Desktop,
    /// Mobile layout.
    Mobile,
}

impl DeviceClass {
    /// Returns the wire name of the device class.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }

    /// Parses a wire name, defaulting to desktop.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("mobile") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
