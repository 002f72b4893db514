//! HTML documents rendered inside the iframe by the host.
//!
//! When the CSP check fails the embedded application refuses to render,
//! which would leave the host with a blank frame. Instead the iframe shows
//! a small page telling the integrator which origin to allow.

// ============================================================================
// Public Functions
// ============================================================================

/// Builds the error page shown when the host origin is not allowed.
///
/// # Arguments
///
/// * `host_origin` - Origin that must be added to the allow-list
/// * `src` - Origin of the embedded application
/// * `message` - Validator message
#[must_use]
pub fn csp_error_document(host_origin: &str, src: &str, message: &str) -> String {
    render(
        CSP_ERROR_TEMPLATE,
        &[
            ("$HOST_ORIGIN", host_origin),
            ("$MESSAGE", message),
            ("$SRC", src),
        ],
    )
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Replaces each placeholder in `template` with its escaped value.
///
/// Substituted text is never scanned again, so values may contain
/// placeholder names.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match values.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(&escape_html(value));
                rest = &rest[name.len()..];
            }
            None => {
                out.push('$');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes text for use in HTML content and attribute values.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ============================================================================
// Constants
// ============================================================================

/// Error page template.
const CSP_ERROR_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Embedding blocked</title>
    <style>
        html, body { height: 100%; margin: 0; }
        body {
            display: flex;
            align-items: center;
            justify-content: center;
            background: #f8f9f9;
            color: #333;
            font-family: "Open Sans", sans-serif, Arial;
            line-height: 1.5;
        }
        .card { max-width: 560px; padding: 32px; text-align: center; }
        h1 { font-size: 18px; margin: 0 0 12px; color: #f2675a; }
        code { background: #eceef1; padding: 2px 6px; border-radius: 3px; }
        a { color: #4781d1; }
    </style>
</head>
<body>
    <div class="card">
        <h1>$MESSAGE</h1>
        <p>Add <code>$HOST_ORIGIN</code> to the allowed domains in the
        Developer Tools settings of <a href="$SRC" target="_blank">$SRC</a>,
        then reload this page.</p>
    </div>
</body>
</html>"##;

// ============================================================================
// Tests
// ============================================================================
