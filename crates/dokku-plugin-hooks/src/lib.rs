//! Dokku plugin triggers and commands
//!
//! - `post-delete`: remove an app's local state and garbage-collect its images
//! - `resource:limit-clear`: clear per-process resource limits of an app

pub mod app;
pub mod config;
pub mod delete;
pub mod error;
pub mod resource;
pub mod runtime;

pub use app::validate_app_name;
pub use config::HookConfig;
pub use delete::{post_delete, DeleteReport, ImageCleanup, StateRemoval};
pub use error::{HookError, Result};
pub use resource::{clear_limits, limit_clear, AppResources, ProcessResources, ResourceStore};
pub use runtime::{DockerImageRuntime, ImageRuntime, RecordingImageRuntime};

/// Print a fatal, user-visible failure line
pub fn log_fail(message: &str) {
    eprintln!(" !     {}", message);
}
