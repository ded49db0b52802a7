//! dokku-release core library
//!
//! Builds Dokku's herokuish packages in a container, extracts them into the
//! output directory and fans them out to every packagecloud distribution.

pub mod artifact;
pub mod build;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod fakes;
pub mod obs;
pub mod pipeline;
pub mod preflight;
pub mod publish;
pub mod reporting;
pub mod telemetry;
pub mod tool;
pub mod version;

pub use artifact::{expected_artifacts, Artifact, PackageFormat};
pub use build::{run_build, BuildEnvironment, DockerBuildEnvironment};
pub use catalog::{targets_for, OsFamily, PublishTarget, DEBIAN_CODENAMES, UBUNTU_CODENAMES};
pub use classify::{classify, classify_str, BumpLevel, ReleaseClassification, ReleaseRequest};
pub use config::{ChannelConfig, PublishConfig, ReleaseConfig};
pub use error::{FailedTarget, ReleaseError, Result};
pub use extract::{extract_artifact, ExtractedArtifact};
pub use pipeline::{PipelineReport, ReleasePipeline, RunOptions};
pub use preflight::{find_on_path, require_token, require_tool};
pub use publish::{
    FanoutEngine, PackageCloudPublisher, PackagePublisher, PublishError, PublishOutcome,
    PublishResult,
};
pub use reporting::write_release_report_json;
pub use telemetry::{init_tracing, level_for};
pub use tool::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
pub use version::resolve_version;

/// dokku-release version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
