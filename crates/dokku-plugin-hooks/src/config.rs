//! Hook configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem and image naming layout of a dokku host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookConfig {
    /// Root holding one directory per app
    pub data_root: PathBuf,
    /// Root holding per-plugin configuration
    pub config_root: PathBuf,
    /// Prefix of app image repositories
    pub image_repo_prefix: String,
    /// Container runtime binary
    pub docker: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        HookConfig {
            data_root: std::env::var("DOKKU_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/home/dokku")),
            config_root: std::env::var("PLUGIN_CONFIG_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/dokku/config")),
            image_repo_prefix: "dokku/".to_string(),
            docker: "docker".to_string(),
        }
    }
}

impl HookConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for explicit roots
    pub fn new(data_root: impl Into<PathBuf>, config_root: impl Into<PathBuf>) -> Self {
        HookConfig {
            data_root: data_root.into(),
            config_root: config_root.into(),
            image_repo_prefix: "dokku/".to_string(),
            docker: "docker".to_string(),
        }
    }

    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.data_root.join(app)
    }

    /// Image repository derived from the app name
    pub fn image_repository(&self, app: &str) -> String {
        format!("{}{}", self.image_repo_prefix, app)
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.config_root.join("resource")
    }
}
