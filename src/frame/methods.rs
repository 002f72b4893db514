//! Methods of the embedded application.
//!
//! Every value-returning method queues one call on the bus and returns a
//! [`MethodCall`]. The call resolves with whatever the application replied,
//! including its own error shapes. Calling before the frame has loaded
//! reports the connect error to `onAppError` and resolves to
//! [`Error::NotConnected`](crate::Error::NotConnected) without posting.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::Result;
use crate::protocol::{Method, NewRoom, Script, Task};
use crate::transport::{MethodCall, Responder};

use super::Instance;

// ============================================================================
// Instance - Calls
// ============================================================================

impl Instance {
    /// Queues `method` and returns its completion.
    pub fn call(&self, method: Method) -> MethodCall {
        let (tx, rx) = oneshot::channel();
        match self
            .inner
            .bus
            .execute(Task::from(method), Responder::Channel(tx))
        {
            Ok(()) => MethodCall::waiting(rx),
            Err(e) => {
                self.report_error(&e);
                MethodCall::ready(Err(e))
            }
        }
    }

    /// Queues a call by wire name and hands the reply to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`](crate::Error::NotConnected) or
    /// [`Error::FrameNotMounted`](crate::Error::FrameNotMounted) if the call
    /// was not queued; the error is also reported to `onAppError`.
    pub fn execute_method<F>(&self, name: &str, params: Option<Value>, callback: F) -> Result<()>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        debug!(method = %name, "Executing method");
        self.inner
            .bus
            .execute(
                Task::method(name, params),
                Responder::Callback(Box::new(callback)),
            )
            .inspect_err(|e| self.report_error(e))
    }
}

// ============================================================================
// Instance - Browsing
// ============================================================================

impl Instance {
    /// Returns info about the current folder.
    #[inline]
    pub fn get_folder_info(&self) -> MethodCall {
        self.call(Method::GetFolderInfo)
    }

    /// Returns the selected items.
    #[inline]
    pub fn get_selection(&self) -> MethodCall {
        self.call(Method::GetSelection)
    }

    /// Returns the files of the current folder.
    #[inline]
    pub fn get_files(&self) -> MethodCall {
        self.call(Method::GetFiles)
    }

    /// Returns the folders of the current folder.
    #[inline]
    pub fn get_folders(&self) -> MethodCall {
        self.call(Method::GetFolders)
    }

    /// Returns files and folders of the current folder.
    #[inline]
    pub fn get_list(&self) -> MethodCall {
        self.call(Method::GetList)
    }

    /// Returns rooms matching `filter`.
    #[inline]
    pub fn get_rooms(&self, filter: Value) -> MethodCall {
        self.call(Method::GetRooms { filter })
    }
}

// ============================================================================
// Instance - Account
// ============================================================================

impl Instance {
    /// Returns the signed-in user.
    #[inline]
    pub fn get_user_info(&self) -> MethodCall {
        self.call(Method::GetUserInfo)
    }

    /// Returns the password hashing settings.
    #[inline]
    pub fn get_hash_settings(&self) -> MethodCall {
        self.call(Method::GetHashSettings)
    }

    /// Hashes `password` with settings from
    /// [`get_hash_settings`](Self::get_hash_settings).
    pub fn create_hash(&self, password: impl Into<String>, hash_settings: Value) -> MethodCall {
        self.call(Method::CreateHash {
            password: password.into(),
            hash_settings,
        })
    }

    /// Signs in.
    pub fn login(
        &self,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        password: Option<String>,
        session: Option<bool>,
    ) -> MethodCall {
        self.call(Method::Login {
            email: email.into(),
            password_hash: password_hash.into(),
            password,
            session,
        })
    }

    /// Signs out.
    #[inline]
    pub fn logout(&self) -> MethodCall {
        self.call(Method::Logout)
    }
}

// ============================================================================
// Instance - Items
// ============================================================================

impl Instance {
    /// Creates a file, optionally from a template or form.
    pub fn create_file(
        &self,
        folder_id: impl Into<Value>,
        title: impl Into<String>,
        template_id: Option<Value>,
        form_id: Option<Value>,
    ) -> MethodCall {
        self.call(Method::CreateFile {
            folder_id: folder_id.into(),
            title: title.into(),
            template_id,
            form_id,
        })
    }

    /// Creates a folder.
    pub fn create_folder(
        &self,
        parent_folder_id: impl Into<Value>,
        title: impl Into<String>,
    ) -> MethodCall {
        self.call(Method::CreateFolder {
            parent_folder_id: parent_folder_id.into(),
            title: title.into(),
        })
    }

    /// Creates a room.
    #[inline]
    pub fn create_room(&self, room: NewRoom) -> MethodCall {
        self.call(Method::CreateRoom(room))
    }

    /// Creates a tag.
    pub fn create_tag(&self, name: impl Into<String>) -> MethodCall {
        self.call(Method::CreateTag { name: name.into() })
    }

    /// Attaches tags to a room.
    pub fn add_tags_to_room(&self, room_id: impl Into<Value>, tags: Vec<String>) -> MethodCall {
        self.call(Method::AddTagsToRoom {
            room_id: room_id.into(),
            tags,
        })
    }

    /// Detaches tags from a room.
    pub fn remove_tags_from_room(
        &self,
        room_id: impl Into<Value>,
        tags: Vec<String>,
    ) -> MethodCall {
        self.call(Method::RemoveTagsFromRoom {
            room_id: room_id.into(),
            tags,
        })
    }
}

// ============================================================================
// Instance - Interface
// ============================================================================

impl Instance {
    /// Switches the list view (`row`, `table`, `tile`).
    pub fn set_list_view(&self, view_type: impl Into<String>) -> MethodCall {
        self.call(Method::SetListView {
            view_type: view_type.into(),
        })
    }

    /// Opens a modal dialog.
    pub fn open_modal(&self, modal_type: impl Into<String>, options: Value) -> MethodCall {
        self.call(Method::OpenModal {
            modal_type: modal_type.into(),
            options,
        })
    }

    /// Runs `callback` inside the editor with `data` as argument.
    ///
    /// The function travels as source text and runs on the embedded side.
    pub fn execute_in_editor(&self, callback: impl Into<Script>, data: Option<Value>) -> MethodCall {
        self.call(Method::ExecuteInEditor {
            callback: callback.into(),
            data,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
