//! Error types for dokku-plugin-hooks

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by plugin triggers and commands
#[derive(Error, Debug)]
pub enum HookError {
    /// A required positional argument was not given
    #[error("{0}")]
    MissingArgument(String),

    /// App name is not a valid dokku app name
    #[error("Invalid app name '{0}'")]
    InvalidAppName(String),

    /// App has no state directory
    #[error("App {0} does not exist")]
    AppNotFound(String),

    /// Local app state could not be removed
    #[error("Unable to remove {path}: {source}")]
    StateRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container runtime command failed
    #[error("Image cleanup for {repository} failed: {detail}")]
    ImageCleanup { repository: String, detail: String },

    /// Resource store could not be read or written
    #[error("Resource store error for {app}: {detail}")]
    ResourceStore { app: String, detail: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hook operations
pub type Result<T> = std::result::Result<T, HookError>;
