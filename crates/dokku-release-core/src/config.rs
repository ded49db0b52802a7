//! Release configuration.
//!
//! Defaults describe the herokuish release; every field can be overridden
//! through environment variables with [`ReleaseConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Publish fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// Maximum number of pushes in flight at once.
    pub max_concurrent: usize,
    /// Per-push timeout in seconds, 0 disables it.
    pub push_timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            push_timeout_secs: 300,
        }
    }
}

/// Channel repositories on the publishing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelConfig {
    pub official_repo: String,
    pub prerelease_repo: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            official_repo: "dokku/dokku".to_string(),
            prerelease_repo: "dokku/dokku-betafish".to_string(),
        }
    }
}

impl ChannelConfig {
    /// Repository for an official or pre-release run.
    pub fn select(&self, is_official_release: bool) -> &str {
        if is_official_release {
            &self.official_repo
        } else {
            &self.prerelease_repo
        }
    }
}

/// Full release configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub project_root: PathBuf,
    /// Metadata file holding the version, relative to `project_root`.
    pub metadata_file: PathBuf,
    pub version_key: String,
    pub package_name: String,
    /// Output directory, relative to `project_root`.
    pub output_dir: PathBuf,
    pub build_image: String,
    pub dockerfile: String,
    pub build_tool: String,
    pub publish_client: String,
    pub channels: ChannelConfig,
    /// Publishing service credential.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Search path for external tools.
    #[serde(skip)]
    pub search_path: Option<OsString>,
    pub build_timeout_secs: u64,
    pub publish: PublishConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            project_root: PathBuf::from("."),
            metadata_file: PathBuf::from("deb.mk"),
            version_key: "HEROKUISH_VERSION".to_string(),
            package_name: "herokuish".to_string(),
            output_dir: PathBuf::from("build"),
            build_image: "herokuish:build".to_string(),
            dockerfile: "Dockerfile.build".to_string(),
            build_tool: "docker".to_string(),
            publish_client: "package_cloud".to_string(),
            channels: ChannelConfig::default(),
            token: None,
            search_path: None,
            build_timeout_secs: 3600,
            publish: PublishConfig::default(),
        }
    }
}

impl ReleaseConfig {
    /// Create a config from defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
            .with_search_path(std::env::var_os("PATH"))
    }

    /// Create a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ReleaseConfig::default();
        if let Some(v) = lookup("DOKKU_RELEASE_ROOT") {
            config.project_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOKKU_RELEASE_METADATA") {
            config.metadata_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOKKU_RELEASE_VERSION_KEY") {
            config.version_key = v;
        }
        if let Some(v) = lookup("DOKKU_RELEASE_PACKAGE") {
            config.package_name = v;
        }
        if let Some(v) = lookup("DOKKU_RELEASE_OUTPUT") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOKKU_RELEASE_IMAGE") {
            config.build_image = v;
        }
        if let Some(v) = lookup("DOKKU_RELEASE_OFFICIAL_REPO") {
            config.channels.official_repo = v;
        }
        if let Some(v) = lookup("DOKKU_RELEASE_BETAFISH_REPO") {
            config.channels.prerelease_repo = v;
        }
        if let Some(n) = lookup("DOKKU_RELEASE_CONCURRENCY").and_then(|v| v.parse().ok()) {
            config.publish.max_concurrent = n;
        }
        if let Some(n) = lookup("DOKKU_RELEASE_PUSH_TIMEOUT").and_then(|v| v.parse().ok()) {
            config.publish.push_timeout_secs = n;
        }
        config.token = lookup("PACKAGECLOUD_TOKEN").filter(|t| !t.trim().is_empty());
        config
    }

    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Absolute or root-relative metadata path.
    pub fn metadata_path(&self) -> PathBuf {
        self.project_root.join(&self.metadata_file)
    }

    /// Absolute or root-relative output directory.
    pub fn output_path(&self) -> PathBuf {
        self.project_root.join(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReleaseConfig::from_lookup(lookup(&[]));
        assert_eq!(config.version_key, "HEROKUISH_VERSION");
        assert_eq!(config.output_path(), PathBuf::from("./build"));
        assert_eq!(config.channels.select(true), "dokku/dokku");
        assert_eq!(config.channels.select(false), "dokku/dokku-betafish");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ReleaseConfig::from_lookup(lookup(&[
            ("DOKKU_RELEASE_ROOT", "/src/herokuish"),
            ("DOKKU_RELEASE_PACKAGE", "appname"),
            ("DOKKU_RELEASE_CONCURRENCY", "8"),
            ("DOKKU_RELEASE_PUSH_TIMEOUT", "not-a-number"),
            ("PACKAGECLOUD_TOKEN", "secret"),
        ]));
        assert_eq!(config.package_name, "appname");
        assert_eq!(config.metadata_path(), PathBuf::from("/src/herokuish/deb.mk"));
        assert_eq!(config.publish.max_concurrent, 8);
        assert_eq!(config.publish.push_timeout_secs, 300);
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = ReleaseConfig::from_lookup(lookup(&[("PACKAGECLOUD_TOKEN", "  ")]));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_token_not_serialized() {
        let config = ReleaseConfig::default().with_token("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
