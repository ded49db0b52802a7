//! App deletion trigger.
//!
//! Local state removal is mandatory and propagates its error. Image cleanup
//! is best-effort: its result is logged and reported, never returned as an
//! error.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::app::validate_app_name;
use crate::config::HookConfig;
use crate::error::{HookError, Result};
use crate::runtime::ImageRuntime;

/// What happened to the app's local state directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRemoval {
    Directory,
    Symlink,
    File,
    Absent,
}

/// Result of the advisory image cleanup step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageCleanup {
    Removed { count: usize },
    Failed { detail: String },
}

impl ImageCleanup {
    pub fn is_removed(&self) -> bool {
        matches!(self, ImageCleanup::Removed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub app: String,
    pub state_path: PathBuf,
    pub state: StateRemoval,
    pub image_repository: String,
    pub images: ImageCleanup,
}

/// Remove an app's local state, then garbage-collect its images.
#[instrument(skip(config, runtime))]
pub async fn post_delete(
    config: &HookConfig,
    runtime: &dyn ImageRuntime,
    app: &str,
) -> Result<DeleteReport> {
    validate_app_name(app)?;

    let state_path = config.app_dir(app);
    let state = remove_state(&state_path)?;
    info!(path = %state_path.display(), state = ?state, "Removed app state");

    let image_repository = config.image_repository(app);
    let images = match runtime.remove_images(&image_repository).await {
        Ok(count) => {
            info!(repository = %image_repository, count, "Removed app images");
            ImageCleanup::Removed { count }
        }
        Err(e) => {
            warn!(repository = %image_repository, error = %e, "Image cleanup failed, continuing");
            ImageCleanup::Failed {
                detail: e.to_string(),
            }
        }
    };

    Ok(DeleteReport {
        app: app.to_string(),
        state_path,
        state,
        image_repository,
        images,
    })
}

/// Remove `path` without following a symlink at the top level.
fn remove_state(path: &Path) -> Result<StateRemoval> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StateRemoval::Absent),
        Err(source) => {
            return Err(HookError::StateRemoval {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file_type = metadata.file_type();
    let (removed, kind) = if file_type.is_symlink() {
        (std::fs::remove_file(path), StateRemoval::Symlink)
    } else if file_type.is_dir() {
        (std::fs::remove_dir_all(path), StateRemoval::Directory)
    } else {
        (std::fs::remove_file(path), StateRemoval::File)
    };

    match removed {
        Ok(()) => Ok(kind),
        // Raced with another remover.
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StateRemoval::Absent),
        Err(source) => Err(HookError::StateRemoval {
            path: path.to_path_buf(),
            source,
        }),
    }
}
