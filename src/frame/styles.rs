//! Inline styles for the frame nodes.
//!
//! While loading, the iframe sits invisible above the loader inside a
//! relatively positioned container; once loaded it becomes visible and
//! takes its place in the flow.

// ============================================================================
// Imports
// ============================================================================

use crate::config::DeviceClass;
use crate::surface::{LoaderTemplate, Style};

// ============================================================================
// Constants
// ============================================================================

/// Fade duration of the loader.
const LOADER_FADE: &str = "opacity 0.3s ease-out";

// ============================================================================
// Iframe
// ============================================================================

/// Base iframe style for a frame size.
#[must_use]
pub fn iframe(width: &str, height: &str) -> Style {
    Style::new()
        .set("width", width)
        .set("height", height)
        .set("border", "0")
        .set("display", "block")
}

/// Overlay applied to the iframe while a loader is shown.
#[must_use]
pub fn iframe_hidden() -> Style {
    Style::new()
        .set("opacity", "0")
        .set("position", "absolute")
        .set("top", "0")
        .set("left", "0")
        .set("z-index", "2")
}

/// Overlay applied to the iframe once loaded.
#[must_use]
pub fn iframe_visible() -> Style {
    Style::new()
        .set("opacity", "1")
        .set("position", "relative")
        .set("z-index", "auto")
}

// ============================================================================
// Container
// ============================================================================

/// Container style while loading.
#[must_use]
pub fn container(width: &str, height: &str) -> Style {
    Style::new()
        .set("position", "relative")
        .set("width", width)
        .set("height", height)
}

/// Container style once loaded.
#[must_use]
pub fn container_loaded(width: &str, height: &str) -> Style {
    Style::new()
        .set("position", "static")
        .set("width", width)
        .set("height", height)
}

// ============================================================================
// Loader
// ============================================================================

/// Loader look for a frame size and device class.
#[must_use]
pub fn loader(width: &str, height: &str, device: DeviceClass) -> LoaderTemplate {
    let spinner = match device {
        DeviceClass::Desktop => "32px",
        DeviceClass::Mobile => "24px",
    };

    LoaderTemplate {
        style: Style::new()
            .set("width", width)
            .set("height", height)
            .set("display", "flex")
            .set("align-items", "center")
            .set("justify-content", "center")
            .set("position", "absolute")
            .set("top", "0")
            .set("left", "0")
            .set("z-index", "1")
            .set("transition", LOADER_FADE),
        spinner_style: Style::new()
            .set("width", spinner)
            .set("height", spinner),
    }
}

/// Overlay fading the loader out.
#[must_use]
pub fn loader_faded() -> Style {
    Style::new().set("opacity", "0")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_then_visible() {
        let loading = iframe("100%", "720px").merged(&iframe_hidden());
        assert_eq!(loading.get("opacity"), Some("0"));
        assert_eq!(loading.get("height"), Some("720px"));

        let loaded = loading.merged(&iframe_visible());
        assert_eq!(loaded.get("opacity"), Some("1"));
        assert_eq!(loaded.get("position"), Some("relative"));
    }

    #[test]
    fn test_loader_depends_on_device() {
        let desktop = loader("100%", "100%", DeviceClass::Desktop);
        let mobile = loader("100%", "100%", DeviceClass::Mobile);
        assert_ne!(desktop, mobile);
        assert_eq!(mobile.spinner_style.get("width"), Some("24px"));
    }
}
