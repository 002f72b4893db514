//! Builder for [`Sdk`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use frame_bus::{Config, Sdk};
//! use frame_bus::csp::AllowList;
//!
//! let sdk = Sdk::builder()
//!     .surface(surface)
//!     .csp_validator(Arc::new(AllowList::new(["https://*.example.com"])))
//!     .defaults(Config::new().with_src("https://docspace.example.com"))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::csp::CspValidator;
use crate::error::{Error, Result};
use crate::surface::Surface;

use super::core::Sdk;

// ============================================================================
// SdkBuilder
// ============================================================================

/// Builder for configuring an [`Sdk`].
///
/// Use [`Sdk::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct SdkBuilder {
    /// Page capabilities.
    surface: Option<Arc<dyn Surface>>,
    /// CSP allow-list source.
    csp_validator: Option<Arc<dyn CspValidator>>,
    /// Configuration applied under every `init` call.
    defaults: Config,
}

impl fmt::Debug for SdkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkBuilder")
            .field("surface", &self.surface.is_some())
            .field("csp_validator", &self.csp_validator.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

// ============================================================================
// SdkBuilder Implementation
// ============================================================================

impl SdkBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the presentation surface.
    #[inline]
    #[must_use]
    pub fn surface(mut self, surface: Arc<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Enables CSP checks with `validator`.
    #[inline]
    #[must_use]
    pub fn csp_validator(mut self, validator: Arc<dyn CspValidator>) -> Self {
        self.csp_validator = Some(validator);
        self
    }

    /// Sets configuration applied under every `init` call.
    #[inline]
    #[must_use]
    pub fn defaults(mut self, defaults: Config) -> Self {
        self.defaults = defaults;
        self
    }

    /// Builds the SDK.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no surface was set.
    pub fn build(self) -> Result<Sdk> {
        let surface = self.surface.ok_or_else(|| {
            Error::config(
                "A surface is required. Use .surface() to set it.\n\
                 Example: Sdk::builder().surface(Arc::new(HeadlessSurface::new(origin)))",
            )
        })?;

        Ok(Sdk::new(surface, self.csp_validator, self.defaults))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::csp::AllowList;
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = SdkBuilder::new();
        assert!(builder.surface.is_none());
        assert!(builder.csp_validator.is_none());
    }

    #[test]
    fn test_build_fails_without_surface() {
        let err = SdkBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("surface"));
    }

    #[test]
    fn test_build_with_surface() {
        let sdk = SdkBuilder::new()
            .surface(Arc::new(HeadlessSurface::new("https://host")))
            .csp_validator(Arc::new(AllowList::default()))
            .defaults(Config::new().with_theme("Dark"))
            .build()
            .expect("built");
        assert_eq!(sdk.frame_count(), 0);
    }
}
