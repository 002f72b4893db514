//! Names of host event handlers.
//!
//! The embedded application refers to handlers by these names in
//! `onEventReturn` messages; the frame itself raises `onAppError` and
//! `onContentReady`.

/// The embedded application finished booting.
pub const ON_APP_READY: &str = "onAppReady";

/// An error was reported by the bus, the CSP check or the application.
pub const ON_APP_ERROR: &str = "onAppError";

/// The loader is gone and the frame content is visible.
pub const ON_CONTENT_READY: &str = "onContentReady";

/// The user picked an item in a selector mode.
pub const ON_SELECT_CALLBACK: &str = "onSelectCallback";

/// The user closed a selector.
pub const ON_CLOSE_CALLBACK: &str = "onCloseCallback";

/// The user closed the editor.
pub const ON_EDITOR_CLOSE_CALLBACK: &str = "onEditorCloseCallback";

/// Login inside the frame succeeded.
pub const ON_AUTH_SUCCESS: &str = "onAuthSuccess";

/// The user signed out inside the frame.
pub const ON_SIGN_OUT: &str = "onSignOut";

/// A download was requested.
pub const ON_DOWNLOAD: &str = "onDownload";

/// The user has no access to the requested item.
pub const ON_NO_ACCESS: &str = "onNoAccess";

/// Every event name known to the frame.
pub const ALL: &[&str] = &[
    ON_APP_READY,
    ON_APP_ERROR,
    ON_CONTENT_READY,
    ON_SELECT_CALLBACK,
    ON_CLOSE_CALLBACK,
    ON_EDITOR_CLOSE_CALLBACK,
    ON_AUTH_SUCCESS,
    ON_SIGN_OUT,
    ON_DOWNLOAD,
    ON_NO_ACCESS,
];
