//! Container runtime seam for image cleanup

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

use dokku_release_core::{ToolInvocation, ToolRunner};

use crate::error::{HookError, Result};

/// Container runtime operations used by triggers
#[async_trait]
pub trait ImageRuntime: Send + Sync {
    /// Remove every image in `repository`, returning how many were removed
    async fn remove_images(&self, repository: &str) -> Result<usize>;
}

/// Docker CLI runtime
#[derive(Debug, Clone)]
pub struct DockerImageRuntime {
    pub docker: String,
    pub timeout_secs: u64,
}

impl DockerImageRuntime {
    pub fn new(docker: &str) -> Self {
        Self {
            docker: docker.to_string(),
            timeout_secs: 120,
        }
    }

    async fn run(&self, name: &str, args: &[&str], repository: &str) -> Result<String> {
        let mut command = vec![self.docker.clone()];
        command.extend(args.iter().map(|a| a.to_string()));
        let output = ToolRunner::execute(&ToolInvocation::new(name, command, self.timeout_secs))
            .await
            .map_err(|e| HookError::ImageCleanup {
                repository: repository.to_string(),
                detail: e.to_string(),
            })?;
        if !output.success {
            return Err(HookError::ImageCleanup {
                repository: repository.to_string(),
                detail: output.failure_detail(),
            });
        }
        Ok(output.stdout_lossy())
    }
}

#[async_trait]
impl ImageRuntime for DockerImageRuntime {
    async fn remove_images(&self, repository: &str) -> Result<usize> {
        let listed = self
            .run("docker_images", &["images", "-q", repository], repository)
            .await?;

        let mut ids: Vec<&str> = listed
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            debug!(repository = %repository, "No images to remove");
            return Ok(0);
        }

        let mut args = vec!["rmi", "-f"];
        args.extend(ids.iter().copied());
        self.run("docker_rmi", &args, repository).await?;
        Ok(ids.len())
    }
}

/// Runtime that records requested repositories (testing only)
#[derive(Debug, Default)]
pub struct RecordingImageRuntime {
    requests: Mutex<Vec<String>>,
    failure: Option<String>,
    removed: usize,
}

impl RecordingImageRuntime {
    pub fn new(removed: usize) -> Self {
        Self {
            removed,
            ..Self::default()
        }
    }

    /// Make every removal fail with `detail`
    pub fn failing(detail: &str) -> Self {
        Self {
            failure: Some(detail.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageRuntime for RecordingImageRuntime {
    async fn remove_images(&self, repository: &str) -> Result<usize> {
        self.requests.lock().unwrap().push(repository.to_string());
        match &self.failure {
            Some(detail) => Err(HookError::ImageCleanup {
                repository: repository.to_string(),
                detail: detail.clone(),
            }),
            None => Ok(self.removed),
        }
    }
}
