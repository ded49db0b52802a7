//! Build coordination inside an isolated container build.
//!
//! The package toolchain itself lives in the project's build Dockerfile.
//! This module only drives it and reads finished artifacts back out.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result};
use crate::tool::{ToolInvocation, ToolRunner};

/// An isolated, disposable environment that builds packages.
#[async_trait]
pub trait BuildEnvironment: Send + Sync {
    /// Build every package for `version`. Fails with `ReleaseError::Build`.
    async fn build(&self, version: &str, trace: bool) -> Result<()>;

    /// Read an artifact's bytes from inside the environment.
    /// Fails with `ReleaseError::Extraction`.
    async fn read_artifact(&self, source_path: &str) -> Result<Vec<u8>>;
}

/// Docker-backed build environment.
#[derive(Debug, Clone)]
pub struct DockerBuildEnvironment {
    pub docker: String,
    pub image: String,
    pub dockerfile: String,
    pub context_dir: PathBuf,
    pub version_key: String,
    pub timeout_secs: u64,
}

impl DockerBuildEnvironment {
    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self {
            docker: config.build_tool.clone(),
            image: config.build_image.clone(),
            dockerfile: config.dockerfile.clone(),
            context_dir: config.project_root.clone(),
            version_key: config.version_key.clone(),
            timeout_secs: config.build_timeout_secs,
        }
    }

    fn build_invocation(&self, version: &str, trace: bool) -> ToolInvocation {
        let mut command = vec![
            self.docker.clone(),
            "build".to_string(),
            "-f".to_string(),
            self.dockerfile.clone(),
            "--build-arg".to_string(),
            format!("{}={}", self.version_key, version),
            "-t".to_string(),
            self.image.clone(),
        ];
        if trace {
            command.push("--progress=plain".to_string());
        }
        command.push(".".to_string());
        ToolInvocation::new("docker_build", command, self.timeout_secs).in_dir(&self.context_dir)
    }

    fn read_invocation(&self, source_path: &str) -> ToolInvocation {
        ToolInvocation::new(
            "docker_read_artifact",
            vec![
                self.docker.clone(),
                "run".to_string(),
                "--rm".to_string(),
                "--entrypoint".to_string(),
                "cat".to_string(),
                self.image.clone(),
                source_path.to_string(),
            ],
            self.timeout_secs,
        )
    }
}

#[async_trait]
impl BuildEnvironment for DockerBuildEnvironment {
    async fn build(&self, version: &str, trace: bool) -> Result<()> {
        let invocation = self.build_invocation(version, trace);
        let output = ToolRunner::execute(&invocation)
            .await
            .map_err(|e| ReleaseError::Build(e.to_string()))?;

        if trace {
            debug!(stdout = %output.stdout_lossy(), "docker build output");
        }
        if !output.success {
            return Err(ReleaseError::Build(format!(
                "{} {}",
                self.image,
                output.failure_detail()
            )));
        }
        Ok(())
    }

    async fn read_artifact(&self, source_path: &str) -> Result<Vec<u8>> {
        let output = ToolRunner::execute(&self.read_invocation(source_path))
            .await
            .map_err(|e| ReleaseError::Extraction {
                file: source_path.to_string(),
                reason: e.to_string(),
            })?;

        if !output.success {
            return Err(ReleaseError::Extraction {
                file: source_path.to_string(),
                reason: output.failure_detail(),
            });
        }
        Ok(output.stdout)
    }
}

/// Run the build once, blocking until the environment reports an outcome.
///
/// There is no retry: a failed build aborts the release.
pub async fn run_build(env: &dyn BuildEnvironment, version: &str, trace: bool) -> Result<()> {
    let start = Instant::now();
    info!(version = %version, "Building packages");
    env.build(version, trace).await?;
    info!(
        version = %version,
        duration_ms = start.elapsed().as_millis() as u64,
        "Build finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> DockerBuildEnvironment {
        DockerBuildEnvironment::from_config(&ReleaseConfig::default())
    }

    #[test]
    fn test_build_invocation() {
        let inv = env().build_invocation("1.2.3", false);
        assert_eq!(inv.command[0], "docker");
        assert!(inv.command.contains(&"HEROKUISH_VERSION=1.2.3".to_string()));
        assert!(inv.command.contains(&"herokuish:build".to_string()));
        assert!(!inv.command.contains(&"--progress=plain".to_string()));
        assert_eq!(inv.command.last().map(String::as_str), Some("."));
        assert_eq!(inv.cwd, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_build_invocation_trace() {
        let inv = env().build_invocation("1.2.3", true);
        assert!(inv.command.contains(&"--progress=plain".to_string()));
    }

    #[test]
    fn test_read_invocation() {
        let inv = env().read_invocation("/data/herokuish_1.2.3_amd64.deb");
        assert_eq!(
            inv.command[1..],
            [
                "run",
                "--rm",
                "--entrypoint",
                "cat",
                "herokuish:build",
                "/data/herokuish_1.2.3_amd64.deb"
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_build_tool_is_build_error() {
        let mut env = env();
        env.docker = "false".to_string();
        let err = env.build("1.2.3", false).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Build(_)));
    }

    #[tokio::test]
    async fn test_missing_build_tool_is_build_error() {
        let mut env = env();
        env.docker = "/nonexistent/docker".to_string();
        let err = run_build(&env, "1.2.3", false).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Build(_)));
    }
}
