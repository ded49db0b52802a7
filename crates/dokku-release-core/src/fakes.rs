//! In-memory fakes for the build and publish seams (testing only)
//!
//! Provides `MemoryBuildEnvironment` and `RecordingPublisher` that satisfy the
//! trait contracts without Docker or a publishing service.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::build::BuildEnvironment;
use crate::error::{ReleaseError, Result};
use crate::publish::client::{PackagePublisher, PublishError};

// ---------------------------------------------------------------------------
// MemoryBuildEnvironment
// ---------------------------------------------------------------------------

/// Build environment holding artifact bytes in a `HashMap<source_path, bytes>`.
#[derive(Debug, Default)]
pub struct MemoryBuildEnvironment {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
    build_failure: Option<String>,
    builds: Mutex<Vec<(String, bool)>>,
    reads: AtomicUsize,
}

impl MemoryBuildEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `source_path` readable with the given contents.
    pub fn with_artifact(self, source_path: &str, bytes: Vec<u8>) -> Self {
        self.artifacts
            .lock()
            .unwrap()
            .insert(source_path.to_string(), bytes);
        self
    }

    /// Make every build fail with `detail`.
    pub fn failing_build(mut self, detail: &str) -> Self {
        self.build_failure = Some(detail.to_string());
        self
    }

    /// `(version, trace)` of every build call.
    pub fn builds(&self) -> Vec<(String, bool)> {
        self.builds.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildEnvironment for MemoryBuildEnvironment {
    async fn build(&self, version: &str, trace: bool) -> Result<()> {
        self.builds
            .lock()
            .unwrap()
            .push((version.to_string(), trace));
        match &self.build_failure {
            Some(detail) => Err(ReleaseError::Build(detail.clone())),
            None => Ok(()),
        }
    }

    async fn read_artifact(&self, source_path: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.artifacts
            .lock()
            .unwrap()
            .get(source_path)
            .cloned()
            .ok_or_else(|| ReleaseError::Extraction {
                file: source_path.to_string(),
                reason: "no such file in build environment".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisher
// ---------------------------------------------------------------------------

/// One recorded push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub repository_path: String,
    pub artifact: PathBuf,
}

/// Publisher that records every push and fails the configured ones.
///
/// Failures can be keyed by repository path or by 1-based call position.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pushes: Mutex<Vec<RecordedPush>>,
    failing_paths: HashSet<String>,
    failing_positions: HashSet<usize>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail pushes to `repository_path`.
    pub fn failing_path(mut self, repository_path: &str) -> Self {
        self.failing_paths.insert(repository_path.to_string());
        self
    }

    /// Fail the n-th push (1-based) this publisher receives.
    pub fn failing_position(mut self, position: usize) -> Self {
        self.failing_positions.insert(position);
        self
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn pushed_repositories(&self) -> Vec<String> {
        self.pushes()
            .into_iter()
            .map(|p| p.repository_path)
            .collect()
    }
}

#[async_trait]
impl PackagePublisher for RecordingPublisher {
    async fn push(
        &self,
        repository_path: &str,
        artifact: &Path,
        _timeout_secs: u64,
        _trace: bool,
    ) -> std::result::Result<(), PublishError> {
        let position = {
            let mut pushes = self.pushes.lock().unwrap();
            pushes.push(RecordedPush {
                repository_path: repository_path.to_string(),
                artifact: artifact.to_path_buf(),
            });
            pushes.len()
        };

        if self.failing_paths.contains(repository_path)
            || self.failing_positions.contains(&position)
        {
            return Err(PublishError::new(format!(
                "push to {} rejected",
                repository_path
            )));
        }
        Ok(())
    }
}
