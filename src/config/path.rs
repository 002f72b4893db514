//! Path resolution for the embedded application.
//!
//! Maps a configuration to the path (and query string) loaded in the
//! iframe, relative to the configured `src` origin.
//!
//! | Mode | Path |
//! |------|------|
//! | `manager` | `{rootPath}[{id}/filter]?{filter}` |
//! | `editor` | `/doceditor?fileId={id}&editorType=..&editorGoBack=..` |
//! | `viewer` | editor path + `&action=view` |
//! | `room-selector` | `/sdk/room-selector` |
//! | `file-selector` | `/sdk/file-selector?selectorType=..` |
//! | `system` | `/sdk/system` |
//! | `public-room` | `/rooms/share?key={requestToken}` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use super::mode::Mode;
use super::options::Config;

// ============================================================================
// Public Functions
// ============================================================================

/// Resolves the iframe path for `mode` using fields of `config`.
#[must_use]
pub fn resolve(mode: Mode, config: &Config) -> String {
    match mode {
        Mode::Manager => manager_path(config),
        Mode::Editor => editor_path(config, false),
        Mode::Viewer => editor_path(config, true),
        Mode::RoomSelector => "/sdk/room-selector".to_string(),
        Mode::FileSelector => {
            let selector = config.get_str("selectorType").unwrap_or("exceptPrivacyRoom");
            format!("/sdk/file-selector?selectorType={}", urlencoding::encode(selector))
        }
        Mode::System => "/sdk/system".to_string(),
        Mode::PublicRoom => {
            let key = config.request_token().unwrap_or_default();
            format!("/rooms/share?key={}", urlencoding::encode(key))
        }
    }
}

/// Joins the configured origin and a resolved path into the iframe URL.
#[must_use]
pub fn frame_url(src: &str, path: &str) -> String {
    format!("{}{}", src.trim_end_matches('/'), path)
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Builds the manager path with the filter as query string.
fn manager_path(config: &Config) -> String {
    let root = config.get_str("rootPath").unwrap_or("/rooms/shared/");
    let id = config.id();

    let mut params: Vec<(String, String)> = Vec::new();
    if let Some(token) = config.request_token() {
        params.push(("key".to_string(), token.to_string()));
    }
    if let Some(id) = &id {
        params.push(("folder".to_string(), id.clone()));
    }
    if let Some(filter) = config.filter() {
        for (key, value) in filter {
            if key == "withSubfolders" && !value.as_bool().unwrap_or(false) {
                continue;
            }
            if key == "folder" && id.is_some() {
                continue;
            }
            if let Some(text) = query_value(value) {
                params.push((key.clone(), text));
            }
        }
    }

    let folder = id.map(|id| format!("{id}/filter")).unwrap_or_default();
    format!("{root}{folder}?{}", encode_query(&params))
}

/// Builds the editor/viewer path.
fn editor_path(config: &Config, view: bool) -> String {
    let file_id = config.id().unwrap_or_default();
    let editor_type = config.get_str("editorType").unwrap_or("desktop");
    let go_back = config.get_bool("editorGoBack", true);

    let mut params = vec![
        ("fileId".to_string(), file_id),
        ("editorType".to_string(), editor_type.to_string()),
        ("editorGoBack".to_string(), go_back.to_string()),
    ];
    if view {
        params.push(("action".to_string(), "view".to_string()));
    }
    if let Some(token) = config.request_token() {
        params.push(("share".to_string(), token.to_string()));
    }

    format!("/doceditor?{}", encode_query(&params))
}

/// Formats a filter value for the query string; `null` is dropped.
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Encodes `key=value` pairs joined by `&`.
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

// ============================================================================
// Tests
// ============================================================================
