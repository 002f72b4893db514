//! Remote method definitions.
//!
//! Every value-returning frame method maps to one [`Method`] variant with a
//! fixed wire name and parameter record. [`Method::Custom`] covers names the
//! crate does not know about.
//!
//! | Group | Methods |
//! |-------|---------|
//! | Configuration | `setConfig` |
//! | Browsing | `getFolderInfo`, `getSelection`, `getFiles`, `getFolders`, `getList`, `getRooms` |
//! | Account | `getUserInfo`, `getHashSettings`, `createHash`, `login`, `logout` |
//! | Items | `createFile`, `createFolder`, `createRoom`, `createTag`, `addTagsToRoom`, `removeTagsFromRoom` |
//! | UI | `setListView`, `openModal`, `executeInEditor` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};

// ============================================================================
// Constants
// ============================================================================

/// Wire name of the configuration-update method.
///
/// This is the only method accepted while the bus is disconnected.
pub const SET_CONFIG: &str = "setConfig";

// ============================================================================
// Script
// ============================================================================

/// Source text of a function handed to the embedded application.
///
/// Serializes as its source string; the embedded side evaluates it out of
/// band. It is never executed locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(String);

impl Script {
    /// Wraps function source text.
    #[inline]
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the source text.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.0
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for Script {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

// ============================================================================
// NewRoom
// ============================================================================

/// Parameters of `createRoom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    /// Room title.
    pub title: String,
    /// Room type code (custom, collaboration, public, ...).
    pub room_type: Value,
    /// Storage quota in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<i64>,
    /// Tags attached on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Logo color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Cover image identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Value>,
    /// Enable file indexing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing: Option<bool>,
    /// Forbid downloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_download: Option<bool>,
}

impl NewRoom {
    /// Creates room parameters with a title and a room type.
    #[must_use]
    pub fn new(title: impl Into<String>, room_type: impl Into<Value>) -> Self {
        Self {
            title: title.into(),
            room_type: room_type.into(),
            ..Default::default()
        }
    }

    /// Sets the storage quota.
    #[inline]
    #[must_use]
    pub fn with_quota(mut self, quota: i64) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the logo color.
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the cover.
    #[inline]
    #[must_use]
    pub fn with_cover(mut self, cover: impl Into<Value>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    /// Enables or disables indexing.
    #[inline]
    #[must_use]
    pub fn with_indexing(mut self, indexing: bool) -> Self {
        self.indexing = Some(indexing);
        self
    }

    /// Allows or forbids downloads.
    #[inline]
    #[must_use]
    pub fn with_deny_download(mut self, deny: bool) -> Self {
        self.deny_download = Some(deny);
        self
    }
}

// ============================================================================
// Method
// ============================================================================

/// A method invocation on the embedded application.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Push the full configuration.
    SetConfig(Value),
    /// Info about the current folder.
    GetFolderInfo,
    /// Currently selected items.
    GetSelection,
    /// Files of the current folder.
    GetFiles,
    /// Folders of the current folder.
    GetFolders,
    /// Files and folders of the current folder.
    GetList,
    /// Rooms matching a filter.
    GetRooms {
        /// Filter record.
        filter: Value,
    },
    /// Profile of the signed-in user.
    GetUserInfo,
    /// Password hashing settings.
    GetHashSettings,
    /// Hash a password with the given settings.
    CreateHash {
        /// Plain password.
        password: String,
        /// Settings from `getHashSettings`.
        hash_settings: Value,
    },
    /// Sign in.
    Login {
        /// Account email.
        email: String,
        /// Hash produced by `createHash`.
        password_hash: String,
        /// Plain password, for portals that need it.
        password: Option<String>,
        /// Keep the session.
        session: Option<bool>,
    },
    /// Sign out.
    Logout,
    /// Create a file.
    CreateFile {
        /// Target folder.
        folder_id: Value,
        /// File title.
        title: String,
        /// Template file.
        template_id: Option<Value>,
        /// Form to fill.
        form_id: Option<Value>,
    },
    /// Create a folder.
    CreateFolder {
        /// Parent folder.
        parent_folder_id: Value,
        /// Folder title.
        title: String,
    },
    /// Create a room.
    CreateRoom(NewRoom),
    /// Create a tag.
    CreateTag {
        /// Tag name.
        name: String,
    },
    /// Attach tags to a room.
    AddTagsToRoom {
        /// Target room.
        room_id: Value,
        /// Tag names.
        tags: Vec<String>,
    },
    /// Detach tags from a room.
    RemoveTagsFromRoom {
        /// Target room.
        room_id: Value,
        /// Tag names.
        tags: Vec<String>,
    },
    /// Switch the list view.
    SetListView {
        /// View type (`row`, `table`, `tile`).
        view_type: String,
    },
    /// Open a modal dialog.
    OpenModal {
        /// Modal type.
        modal_type: String,
        /// Modal options.
        options: Value,
    },
    /// Run a function inside the editor.
    ExecuteInEditor {
        /// Function source.
        callback: Script,
        /// Argument for the function.
        data: Option<Value>,
    },
    /// Any other method, by wire name.
    Custom {
        /// Wire method name.
        name: String,
        /// Parameters.
        data: Option<Value>,
    },
}

impl Method {
    /// Returns the wire method name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SetConfig(_) => SET_CONFIG,
            Self::GetFolderInfo => "getFolderInfo",
            Self::GetSelection => "getSelection",
            Self::GetFiles => "getFiles",
            Self::GetFolders => "getFolders",
            Self::GetList => "getList",
            Self::GetRooms { .. } => "getRooms",
            Self::GetUserInfo => "getUserInfo",
            Self::GetHashSettings => "getHashSettings",
            Self::CreateHash { .. } => "createHash",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::CreateFile { .. } => "createFile",
            Self::CreateFolder { .. } => "createFolder",
            Self::CreateRoom(_) => "createRoom",
            Self::CreateTag { .. } => "createTag",
            Self::AddTagsToRoom { .. } => "addTagsToRoom",
            Self::RemoveTagsFromRoom { .. } => "removeTagsFromRoom",
            Self::SetListView { .. } => "setListView",
            Self::OpenModal { .. } => "openModal",
            Self::ExecuteInEditor { .. } => "executeInEditor",
            Self::Custom { name, .. } => name,
        }
    }

    /// Returns the parameter record (`None` serializes as `null`).
    #[must_use]
    pub fn params(&self) -> Option<Value> {
        match self {
            Self::SetConfig(config) => Some(config.clone()),
            Self::GetFolderInfo
            | Self::GetSelection
            | Self::GetFiles
            | Self::GetFolders
            | Self::GetList
            | Self::GetUserInfo
            | Self::GetHashSettings
            | Self::Logout => None,
            Self::GetRooms { filter } => Some(json!({ "filter": filter })),
            Self::CreateHash {
                password,
                hash_settings,
            } => Some(json!({ "password": password, "hashSettings": hash_settings })),
            Self::Login {
                email,
                password_hash,
                password,
                session,
            } => Some(json!({
                "email": email,
                "passwordHash": password_hash,
                "password": password,
                "session": session,
            })),
            Self::CreateFile {
                folder_id,
                title,
                template_id,
                form_id,
            } => Some(json!({
                "folderId": folder_id,
                "title": title,
                "templateId": template_id,
                "formId": form_id,
            })),
            Self::CreateFolder {
                parent_folder_id,
                title,
            } => Some(json!({ "parentFolderId": parent_folder_id, "title": title })),
            Self::CreateRoom(room) => serde_json::to_value(room).ok(),
            Self::CreateTag { name } => Some(json!({ "name": name })),
            Self::AddTagsToRoom { room_id, tags } | Self::RemoveTagsFromRoom { room_id, tags } => {
                Some(json!({ "roomId": room_id, "tags": tags }))
            }
            Self::SetListView { view_type } => Some(json!({ "type": view_type })),
            Self::OpenModal {
                modal_type,
                options,
            } => Some(json!({ "type": modal_type, "options": options })),
            Self::ExecuteInEditor { callback, data } => {
                Some(json!({ "callback": callback, "data": data }))
            }
            Self::Custom { data, .. } => data.clone(),
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// A method call as carried on the wire.
///
/// # Format
///
/// ```json
/// { "type": "method", "methodName": "getFiles", "data": null }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Always `"method"`.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Wire method name.
    pub method_name: String,
    /// Parameters.
    pub data: Option<Value>,
}

impl Task {
    /// Creates a method task.
    #[must_use]
    pub fn method(name: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            task_type: "method".to_string(),
            method_name: name.into(),
            data,
        }
    }

    /// Returns `true` for the configuration-update method.
    #[inline]
    #[must_use]
    pub fn is_config_update(&self) -> bool {
        self.method_name == SET_CONFIG
    }
}

impl From<Method> for Task {
    fn from(method: Method) -> Self {
        let data = method.params();
        Self::method(method.name(), data)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_param_task_has_null_data() {
        let task = Task::from(Method::GetFiles);
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(
            json,
            json!({ "type": "method", "methodName": "getFiles", "data": null })
        );
    }

    #[test]
    fn test_create_file_params() {
        let task = Task::from(Method::CreateFile {
            folder_id: json!(12),
            title: "Report.docx".to_string(),
            template_id: None,
            form_id: Some(json!(7)),
        });
        assert_eq!(task.method_name, "createFile");
        assert_eq!(
            task.data,
            Some(json!({ "folderId": 12, "title": "Report.docx", "templateId": null, "formId": 7 }))
        );
    }

    #[test]
    fn test_create_room_skips_unset_options() {
        let room = NewRoom::new("Team", 2).with_tags(["a", "b"]).with_deny_download(true);
        let task = Task::from(Method::CreateRoom(room));
        assert_eq!(
            task.data,
            Some(json!({ "title": "Team", "roomType": 2, "tags": ["a", "b"], "denyDownload": true }))
        );
    }

    #[test]
    fn test_script_serializes_as_source() {
        let task = Task::from(Method::ExecuteInEditor {
            callback: Script::new("function (editor) { editor.save(); }"),
            data: None,
        });
        assert_eq!(
            task.data,
            Some(json!({ "callback": "function (editor) { editor.save(); }", "data": null }))
        );
    }

    #[test]
    fn test_set_config_is_config_update() {
        let task = Task::from(Method::SetConfig(json!({ "theme": "Dark" })));
        assert!(task.is_config_update());
        assert!(!Task::from(Method::Logout).is_config_update());
    }

    #[test]
    fn test_custom_method() {
        let method = Method::Custom {
            name: "getRoomsByIds".to_string(),
            data: Some(json!({ "ids": [1] })),
        };
        assert_eq!(method.name(), "getRoomsByIds");
        assert_eq!(method.params(), Some(json!({ "ids": [1] })));
    }
}
