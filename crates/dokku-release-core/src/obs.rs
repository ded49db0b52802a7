//! Structured observability hooks for release runs.
//!
//! - Run-scoped tracing spans via [`run_span`]
//! - Emission functions for release start/finish and per-target failures

use tracing::{error, info};

use crate::error::FailedTarget;

/// Span tagged with the run id and bump level.
///
/// Attach it with `Instrument::instrument` so it follows the run across
/// await points.
pub fn run_span(run_id: &str, bump_level: &str) -> tracing::Span {
    tracing::info_span!("release.run", run_id = %run_id, bump = %bump_level)
}

/// Emit event: release started.
pub fn emit_release_started(version: &str, official: bool, publish: bool) {
    info!(
        event = "release.started",
        version = %version,
        official = official,
        publish = publish,
    );
}

/// Emit event: release finished.
pub fn emit_release_finished(duration_ms: u64, pushes: usize, failed: usize) {
    info!(
        event = "release.finished",
        duration_ms = duration_ms,
        pushes = pushes,
        failed = failed,
    );
}

/// Emit one diagnostic line per failed target.
pub fn emit_target_failures(failures: &[FailedTarget]) {
    for failure in failures {
        error!(
            event = "publish.target_failed",
            target_repo = %failure.target.repository_path(),
            detail = %failure.detail,
        );
    }
}
