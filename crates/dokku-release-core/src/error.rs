//! Error taxonomy for the release pipeline.

use crate::catalog::PublishTarget;

/// A single failed push, kept for the aggregate outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTarget {
    pub target: PublishTarget,
    pub detail: String,
}

impl std::fmt::Display for FailedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.target.repository_path(), self.detail)
    }
}

/// Release pipeline errors.
///
/// Every variant except `PublishFailed` aborts the run at the point it is
/// raised. `PublishFailed` is only produced after every target of every
/// artifact has been attempted.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("{key} not found in {path}")]
    NotFound { key: String, path: String },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("build failed: {0}")]
    Build(String),

    #[error("extraction of {file} failed: {reason}")]
    Extraction { file: String, reason: String },

    #[error("publish failed for {} target(s)", failures.len())]
    PublishFailed { failures: Vec<FailedTarget> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReleaseError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether this error was raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, ReleaseError::InvalidArgument { .. })
    }
}

/// Result type for release operations.
pub type Result<T> = std::result::Result<T, ReleaseError>;
