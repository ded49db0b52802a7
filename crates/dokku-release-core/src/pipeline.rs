//! Release pipeline orchestration.
//!
//! classify -> preflight -> resolve version -> build -> extract each format
//! -> (publishing runs only) fan out each format.
//!
//! Every step before publishing aborts the run on error. Publishing attempts
//! every target of every format before reporting failure.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::artifact::expected_artifacts;
use crate::build::{run_build, BuildEnvironment, DockerBuildEnvironment};
use crate::classify::{classify, BumpLevel, ReleaseClassification, ReleaseRequest};
use crate::config::ReleaseConfig;
use crate::error::{FailedTarget, ReleaseError, Result};
use crate::extract::{extract_artifact, ExtractedArtifact};
use crate::obs::{emit_release_finished, emit_release_started, emit_target_failures, run_span};
use crate::preflight::{require_token, require_tool};
use crate::publish::{FanoutEngine, PackageCloudPublisher, PackagePublisher, PublishOutcome};
use crate::version::resolve_version;

/// Environment variable holding the publishing credential.
pub const TOKEN_VARIABLE: &str = "PACKAGECLOUD_TOKEN";

/// Per-run options threaded through every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub trace: bool,
}

/// Extracted artifact as it appears in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub file_name: String,
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl From<&ExtractedArtifact> for ArtifactSummary {
    fn from(extracted: &ExtractedArtifact) -> Self {
        Self {
            file_name: extracted.artifact.file_name.clone(),
            path: extracted.artifact.dest_path.display().to_string(),
            size: extracted.size,
            sha256: extracted.sha256.clone(),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub bump_level: BumpLevel,
    pub version: String,
    pub classification: ReleaseClassification,
    pub artifacts: Vec<ArtifactSummary>,
    /// One outcome per format, empty when nothing was published.
    pub outcomes: Vec<PublishOutcome>,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn push_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.attempted()).sum()
    }

    /// Failed targets across every format.
    pub fn failures(&self) -> Vec<FailedTarget> {
        self.outcomes.iter().flat_map(|o| o.failures()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_success())
    }

    /// Turn a report with failed pushes into `ReleaseError::PublishFailed`.
    pub fn into_result(self) -> Result<Self> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(ReleaseError::PublishFailed { failures })
        }
    }
}

/// The release pipeline, wired to a build environment and a publisher.
pub struct ReleasePipeline {
    config: ReleaseConfig,
    build_env: Arc<dyn BuildEnvironment>,
    publisher: Option<Arc<dyn PackagePublisher>>,
}

impl ReleasePipeline {
    pub fn new(
        config: ReleaseConfig,
        build_env: Arc<dyn BuildEnvironment>,
        publisher: Option<Arc<dyn PackagePublisher>>,
    ) -> Self {
        Self {
            config,
            build_env,
            publisher,
        }
    }

    /// Wire the Docker build environment and `package_cloud` publisher.
    pub fn from_config(config: ReleaseConfig) -> Self {
        let build_env: Arc<dyn BuildEnvironment> =
            Arc::new(DockerBuildEnvironment::from_config(&config));
        let publisher = PackageCloudPublisher::from_config(&config)
            .map(|p| Arc::new(p) as Arc<dyn PackagePublisher>);
        Self::new(config, build_env, publisher)
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Run the pipeline and fail if any push failed.
    pub async fn run(&self, request: &ReleaseRequest) -> Result<PipelineReport> {
        self.execute(request).await?.into_result()
    }

    /// Run the pipeline, reporting push failures inside the report.
    pub async fn execute(&self, request: &ReleaseRequest) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = run_span(&run_id, request.bump_level.as_str());
        self.execute_run(request, run_id).instrument(span).await
    }

    async fn execute_run(
        &self,
        request: &ReleaseRequest,
        run_id: String,
    ) -> Result<PipelineReport> {
        let start = Instant::now();
        let options = RunOptions {
            trace: request.trace,
        };
        let classification = classify(request.bump_level);
        let search_path = self.config.search_path.as_deref();

        require_tool(&self.config.build_tool, search_path)?;
        if classification.should_publish {
            require_token(self.config.token.as_deref(), TOKEN_VARIABLE)?;
        }

        let version = resolve_version(&self.config.metadata_path(), &self.config.version_key)?;
        emit_release_started(
            &version,
            classification.is_official_release,
            classification.should_publish,
        );

        let output_dir = self.config.output_path();
        std::fs::create_dir_all(&output_dir)?;
        let artifacts = expected_artifacts(&self.config.package_name, &version, &output_dir);

        run_build(self.build_env.as_ref(), &version, options.trace).await?;

        let mut extracted = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            extracted.push(extract_artifact(self.build_env.as_ref(), artifact).await?);
        }

        let mut outcomes = Vec::new();
        if classification.should_publish {
            require_tool(&self.config.publish_client, search_path)?;
            let publisher = self.publisher.clone().ok_or_else(|| {
                ReleaseError::Precondition("no publisher configured".to_string())
            })?;
            let engine = FanoutEngine::new(
                publisher,
                self.config.channels.clone(),
                self.config.publish.clone(),
            );
            for artifact in &artifacts {
                outcomes.push(engine.publish(artifact, &classification, options.trace).await?);
            }
        } else {
            info!("Build-only release, skipping publish");
        }

        let report = PipelineReport {
            run_id,
            bump_level: request.bump_level,
            version,
            classification,
            artifacts: extracted.iter().map(ArtifactSummary::from).collect(),
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let failures = report.failures();
        emit_target_failures(&failures);
        emit_release_finished(report.duration_ms, report.push_count(), failures.len());
        Ok(report)
    }
}
