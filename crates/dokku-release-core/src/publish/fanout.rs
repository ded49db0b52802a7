//! Publish fan-out: one artifact pushed to every catalog target.
//!
//! Every target is attempted exactly once. A failed push is recorded and the
//! remaining targets still run; the outcome fails if any single push failed.
//! Pushes run concurrently up to `PublishConfig::max_concurrent`. They start
//! in catalog order and results come back in catalog order.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, Instrument};

use crate::artifact::Artifact;
use crate::catalog::{targets_for, PublishTarget};
use crate::classify::ReleaseClassification;
use crate::config::{ChannelConfig, PublishConfig};
use crate::error::{FailedTarget, ReleaseError, Result};
use crate::publish::client::PackagePublisher;

/// Result of one push attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublishResult {
    pub target: PublishTarget,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate of every push for one artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub file_name: String,
    pub channel_repo: String,
    pub results: Vec<PublishResult>,
}

impl PublishOutcome {
    /// True iff no push failed.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }

    /// Every failed target with its detail, in catalog order.
    pub fn failures(&self) -> Vec<FailedTarget> {
        self.results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| FailedTarget {
                target: r.target.clone(),
                detail: r.error_detail.clone().unwrap_or_default(),
            })
            .collect()
    }

    /// 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Pushes artifacts to the static target catalog.
#[derive(Clone)]
pub struct FanoutEngine {
    publisher: Arc<dyn PackagePublisher>,
    channels: ChannelConfig,
    config: PublishConfig,
}

impl FanoutEngine {
    pub fn new(
        publisher: Arc<dyn PackagePublisher>,
        channels: ChannelConfig,
        config: PublishConfig,
    ) -> Self {
        Self {
            publisher,
            channels,
            config,
        }
    }

    /// Targets `artifact` would be pushed to under `classification`.
    pub fn plan(
        &self,
        artifact: &Artifact,
        classification: &ReleaseClassification,
    ) -> Vec<PublishTarget> {
        let channel_repo = self.channels.select(classification.is_official_release);
        targets_for(artifact.format, channel_repo)
    }

    /// Push `artifact` to every target for its format.
    ///
    /// Errors only on violated preconditions; push failures are reported in
    /// the returned outcome.
    #[instrument(skip_all, fields(artifact = %artifact.file_name))]
    pub async fn publish(
        &self,
        artifact: &Artifact,
        classification: &ReleaseClassification,
        trace: bool,
    ) -> Result<PublishOutcome> {
        if !classification.should_publish {
            return Err(ReleaseError::Precondition(
                "publish invoked for a build-only release".to_string(),
            ));
        }
        if !artifact.dest_path.is_file() {
            return Err(ReleaseError::Precondition(format!(
                "artifact {} missing at {}",
                artifact.file_name,
                artifact.dest_path.display()
            )));
        }

        let channel_repo = self
            .channels
            .select(classification.is_official_release)
            .to_string();
        let targets = self.plan(artifact, classification);
        let total = targets.len();
        let sem = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent.max(1)));

        let mut tasks = Vec::with_capacity(total);
        for (index, target) in targets.iter().cloned().enumerate() {
            let publisher = Arc::clone(&self.publisher);
            let path: PathBuf = artifact.dest_path.clone();
            let timeout_secs = self.config.push_timeout_secs;
            // Permits are taken in catalog order, so pushes start in that order.
            let permit = Arc::clone(&sem).acquire_owned().await.ok();

            let task = tokio::spawn(
                async move {
                    let _permit = permit;
                    let repository_path = target.repository_path();
                    info!(
                        target_repo = %repository_path,
                        position = index + 1,
                        total = total,
                        "Pushing package"
                    );

                    let start = Instant::now();
                    let pushed = publisher
                        .push(&repository_path, &path, timeout_secs, trace)
                        .await;
                    let duration_ms = start.elapsed().as_millis() as u64;

                    match pushed {
                        Ok(()) => PublishResult {
                            target,
                            succeeded: true,
                            error_detail: None,
                            duration_ms,
                        },
                        Err(e) => PublishResult {
                            target,
                            succeeded: false,
                            error_detail: Some(e.detail),
                            duration_ms,
                        },
                    }
                }
                .in_current_span(),
            );
            tasks.push(task);
        }

        let joined = futures::future::join_all(tasks).await;
        let results: Vec<PublishResult> = joined
            .into_iter()
            .zip(targets)
            .map(|(joined, target)| {
                joined.unwrap_or_else(|e| PublishResult {
                    target,
                    succeeded: false,
                    error_detail: Some(format!("push task aborted: {}", e)),
                    duration_ms: 0,
                })
            })
            .collect();

        let outcome = PublishOutcome {
            file_name: artifact.file_name.clone(),
            channel_repo,
            results,
        };
        info!(
            channel = %outcome.channel_repo,
            attempted = outcome.attempted(),
            failed = outcome.failed_count(),
            "Publish finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{expected_artifacts, PackageFormat};
    use crate::classify::{classify, BumpLevel};
    use crate::fakes::RecordingPublisher;

    fn engine(publisher: Arc<RecordingPublisher>, max_concurrent: usize) -> FanoutEngine {
        FanoutEngine::new(
            publisher,
            ChannelConfig::default(),
            PublishConfig {
                max_concurrent,
                push_timeout_secs: 5,
            },
        )
    }

    fn artifact_on_disk(dir: &std::path::Path, format: PackageFormat) -> Artifact {
        let artifact = expected_artifacts("appname", "1.2.3", dir)
            .into_iter()
            .find(|a| a.format == format)
            .unwrap();
        std::fs::write(&artifact.dest_path, b"pkg").unwrap();
        artifact
    }

    #[tokio::test]
    async fn test_build_only_classification_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let artifact = artifact_on_disk(dir.path(), PackageFormat::Deb);

        let err = engine(publisher.clone(), 1)
            .publish(&artifact, &classify(BumpLevel::BuildOnly), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Precondition(_)));
        assert!(publisher.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let artifact = expected_artifacts("appname", "1.2.3", dir.path()).remove(0);

        let err = engine(publisher.clone(), 1)
            .publish(&artifact, &classify(BumpLevel::Patch), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Precondition(_)));
        assert!(publisher.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_push_order_matches_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let artifact = artifact_on_disk(dir.path(), PackageFormat::Deb);

        let outcome = engine(publisher.clone(), 1)
            .publish(&artifact, &classify(BumpLevel::Minor), false)
            .await
            .unwrap();

        let expected: Vec<String> = targets_for(PackageFormat::Deb, "dokku/dokku")
            .iter()
            .map(|t| t.repository_path())
            .collect();
        assert_eq!(publisher.pushed_repositories(), expected);
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let artifact = artifact_on_disk(dir.path(), PackageFormat::Rpm);

        let outcome = engine(publisher.clone(), 0)
            .publish(&artifact, &classify(BumpLevel::Prerelease), false)
            .await
            .unwrap();

        assert_eq!(outcome.attempted(), 1);
        assert_eq!(outcome.channel_repo, "dokku/dokku-betafish");
    }
}
