//! Content Security Policy allow-list check.
//!
//! Before the embedded application can render, it has to allow the host
//! origin in its `frame-ancestors` policy. The allow-list itself lives on
//! the embedded application's side; a [`CspValidator`] fetches it and
//! [`validate`] matches the host origin against it.
//!
//! Entry forms accepted by the matcher:
//!
//! | Entry | Matches |
//! |-------|---------|
//! | `*` | any origin |
//! | `https://host.example.com` | that exact origin |
//! | `host.example.com` | that host, any scheme |
//! | `https://*.example.com` | any single-label subdomain over https |
//! | `*.example.com` | any single-label subdomain, any scheme |
//!
//! # Example
//!
//! ```ignore
//! use frame_bus::csp::{AllowList, validate};
//!
//! let allow = AllowList::new(["https://*.example.com"]);
//! validate(&allow, "https://app.example.org", "https://shop.example.com").await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CSP_ERROR_TEXT, Error, Result};

// ============================================================================
// CspValidator
// ============================================================================

/// Source of the embedded application's allowed host origins.
#[async_trait]
pub trait CspValidator: Send + Sync {
    /// Returns the host origins the application at `src` may be embedded in.
    ///
    /// # Errors
    ///
    /// Returns an error if the allow-list cannot be retrieved.
    async fn allowed_origins(&self, src: &str) -> Result<Vec<String>>;
}

// ============================================================================
// AllowList
// ============================================================================

/// Fixed allow-list, independent of `src`.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    /// Creates an allow-list from entries.
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the entries.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[async_trait]
impl CspValidator for AllowList {
    async fn allowed_origins(&self, _src: &str) -> Result<Vec<String>> {
        Ok(self.entries.clone())
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Checks that `host_origin` may embed the application at `src`.
///
/// A host on the application's own origin always passes without asking the
/// validator.
///
/// # Errors
///
/// Returns [`Error::Csp`] with [`CSP_ERROR_TEXT`] if the origin is not
/// allowed, or the validator's error if the allow-list is unavailable.
pub async fn validate(validator: &dyn CspValidator, src: &str, host_origin: &str) -> Result<()> {
    if same_origin(src, host_origin) {
        debug!(%host_origin, "CSP check skipped for same origin");
        return Ok(());
    }

    let allowed = validator.allowed_origins(src).await?;
    if allowed.iter().any(|entry| origin_matches(entry, host_origin)) {
        debug!(%host_origin, entries = allowed.len(), "CSP check passed");
        return Ok(());
    }

    warn!(%host_origin, %src, "Host origin missing from CSP allow-list");
    Err(Error::csp(host_origin, CSP_ERROR_TEXT))
}

/// Returns `true` if `entry` allows `origin`.
#[must_use]
pub fn origin_matches(entry: &str, origin: &str) -> bool {
    let entry = entry.trim().trim_end_matches('/');
    if entry == "*" {
        return true;
    }

    let Ok(parsed) = Url::parse(origin) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let full = format!("{}://{authority}", parsed.scheme());

    let candidate = if entry.contains("://") { full } else { authority };

    if entry.contains('*') {
        return wildcard_regex(entry).is_some_and(|re| re.is_match(&candidate));
    }

    entry.eq_ignore_ascii_case(&candidate)
}

/// Returns `true` if both URLs share scheme, host and port.
fn same_origin(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

/// Compiles a wildcard entry; `*` stands for one DNS label.
fn wildcard_regex(entry: &str) -> Option<Regex> {
    let pattern = entry
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^./:]+");
    Regex::new(&format!("(?i)^{pattern}$")).ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_origin() {
        assert!(origin_matches("https://shop.example.com", "https://shop.example.com"));
        assert!(origin_matches("https://shop.example.com/", "https://shop.example.com"));
        assert!(!origin_matches("https://shop.example.com", "http://shop.example.com"));
    }

    #[test]
    fn test_host_only_entry() {
        assert!(origin_matches("shop.example.com", "https://shop.example.com"));
        assert!(origin_matches("localhost:3000", "http://localhost:3000"));
        assert!(!origin_matches("localhost", "http://localhost:3000"));
    }

    #[test]
    fn test_wildcards() {
        assert!(origin_matches("*", "https://anything.test"));
        assert!(origin_matches("https://*.example.com", "https://shop.example.com"));
        assert!(!origin_matches("https://*.example.com", "https://a.b.example.com"));
        assert!(!origin_matches("https://*.example.com", "https://example.com"));
        assert!(origin_matches("*.example.com", "http://shop.example.com"));
        // Dots in the entry are literal
        assert!(!origin_matches("*.example.com", "https://shopxexample.com"));
    }

    #[test]
    fn test_garbage_origin() {
        assert!(!origin_matches("https://a.example.com", "not a url"));
    }

    #[tokio::test]
    async fn test_validate_same_origin_skips_validator() {
        let empty = AllowList::default();
        validate(&empty, "https://app.example.com/", "https://app.example.com")
            .await
            .expect("same origin");
    }

    #[tokio::test]
    async fn test_validate_rejects_unlisted_origin() {
        let allow = AllowList::new(["https://partner.example.com"]);
        let err = validate(&allow, "https://app.example.com", "https://shop.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Csp { ref origin, .. } if origin == "https://shop.example.com"));
        assert_eq!(err.app_message(), CSP_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_validate_accepts_listed_origin() {
        let allow = AllowList::new(["https://*.example.com"]);
        validate(&allow, "https://app.example.org", "https://shop.example.com")
            .await
            .expect("allowed");
    }
}
