//! JSON release report written by `--report`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::PipelineReport;

/// Schema version of the persisted release report.
pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Release report written for CI logs and audit.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReportArtifact<'a> {
    pub schema_version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub success: bool,
    pub push_count: usize,
    pub failed_count: usize,
    #[serde(flatten)]
    pub report: &'a PipelineReport,
}

impl<'a> ReleaseReportArtifact<'a> {
    pub fn new(report: &'a PipelineReport) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            success: report.is_success(),
            push_count: report.push_count(),
            failed_count: report.failures().len(),
            report,
        }
    }
}

/// Write the release report as pretty JSON.
pub fn write_release_report_json(path: &Path, report: &PipelineReport) -> Result<()> {
    let content = serde_json::to_string_pretty(&ReleaseReportArtifact::new(report))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
