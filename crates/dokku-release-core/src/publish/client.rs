//! Publishing service client.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::config::ReleaseConfig;
use crate::tool::{ToolInvocation, ToolRunner};

/// A single failed push.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct PublishError {
    pub detail: String,
}

impl PublishError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Pushes one package file to one repository path.
#[async_trait]
pub trait PackagePublisher: Send + Sync {
    /// Push `artifact` to `repository_path` (e.g. `dokku/dokku/ubuntu/xenial`).
    async fn push(
        &self,
        repository_path: &str,
        artifact: &Path,
        timeout_secs: u64,
        trace: bool,
    ) -> Result<(), PublishError>;
}

/// `package_cloud` CLI publisher.
#[derive(Clone)]
pub struct PackageCloudPublisher {
    pub client: String,
    token: String,
}

impl PackageCloudPublisher {
    pub fn new(client: &str, token: &str) -> Self {
        Self {
            client: client.to_string(),
            token: token.to_string(),
        }
    }

    /// Build a publisher from config; `None` when no token is configured.
    pub fn from_config(config: &ReleaseConfig) -> Option<Self> {
        config
            .token
            .as_deref()
            .map(|token| Self::new(&config.publish_client, token))
    }

    fn invocation(
        &self,
        repository_path: &str,
        artifact: &Path,
        timeout_secs: u64,
    ) -> ToolInvocation {
        ToolInvocation::new(
            format!("push {}", repository_path),
            vec![
                self.client.clone(),
                "push".to_string(),
                repository_path.to_string(),
                artifact.to_string_lossy().to_string(),
            ],
            timeout_secs,
        )
        .with_env("PACKAGECLOUD_TOKEN", &self.token)
    }
}

#[async_trait]
impl PackagePublisher for PackageCloudPublisher {
    async fn push(
        &self,
        repository_path: &str,
        artifact: &Path,
        timeout_secs: u64,
        trace: bool,
    ) -> Result<(), PublishError> {
        let output = ToolRunner::execute(&self.invocation(repository_path, artifact, timeout_secs))
            .await
            .map_err(|e| PublishError::new(e.to_string()))?;

        if trace {
            debug!(
                target_repo = %repository_path,
                stdout = %output.stdout_lossy(),
                "package_cloud output"
            );
        }
        if output.success {
            Ok(())
        } else {
            Err(PublishError::new(output.failure_detail()))
        }
    }
}
