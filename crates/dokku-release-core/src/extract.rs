//! Artifact extraction into the output directory.
//!
//! Bytes land in a temporary file inside the output directory and are renamed
//! into place only once fully written, so a failed extraction never leaves a
//! partial artifact at the destination.

use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::artifact::Artifact;
use crate::build::BuildEnvironment;
use crate::error::{ReleaseError, Result};

/// An artifact materialized on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifact {
    pub artifact: Artifact,
    pub size: u64,
    /// SHA-256 hex digest of the file contents.
    pub sha256: String,
}

/// Copy `artifact` out of the build environment to its destination path.
pub async fn extract_artifact(
    env: &dyn BuildEnvironment,
    artifact: &Artifact,
) -> Result<ExtractedArtifact> {
    if artifact.file_name.trim().is_empty() {
        return Err(ReleaseError::invalid_argument(
            "file_name",
            "artifact name must not be empty",
        ));
    }

    let output_dir = artifact.dest_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(output_dir).map_err(|e| extraction_err(artifact, e))?;

    info!(
        artifact = %artifact.file_name,
        dest = %artifact.dest_path.display(),
        "Extracting artifact"
    );

    let bytes = env.read_artifact(&artifact.source_path).await?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".extract-")
        .tempfile_in(output_dir)
        .map_err(|e| extraction_err(artifact, e))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| extraction_err(artifact, e))?;
    tmp.persist(&artifact.dest_path)
        .map_err(|e| extraction_err(artifact, e.error))?;

    let sha256 = hex::encode(Sha256::digest(&bytes));
    info!(
        artifact = %artifact.file_name,
        size = bytes.len(),
        sha256 = %sha256,
        "Extracted artifact"
    );

    Ok(ExtractedArtifact {
        artifact: artifact.clone(),
        size: bytes.len() as u64,
        sha256,
    })
}

fn extraction_err(artifact: &Artifact, e: std::io::Error) -> ReleaseError {
    ReleaseError::Extraction {
        file: artifact.file_name.clone(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{expected_artifacts, PackageFormat};
    use crate::fakes::MemoryBuildEnvironment;

    #[tokio::test]
    async fn test_extract_writes_file_and_digest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build");
        let artifacts = expected_artifacts("appname", "1.2.3", &out);
        let env = MemoryBuildEnvironment::new()
            .with_artifact(&artifacts[0].source_path, b"deb-bytes".to_vec());

        let extracted = extract_artifact(&env, &artifacts[0]).await.unwrap();

        assert_eq!(std::fs::read(&artifacts[0].dest_path).unwrap(), b"deb-bytes");
        assert_eq!(extracted.size, 9);
        assert_eq!(extracted.sha256.len(), 64);
    }

    #[tokio::test]
    async fn test_empty_name_rejected_without_copy() {
        let dir = tempfile::tempdir().unwrap();
        let env = MemoryBuildEnvironment::new();
        let artifact = Artifact::new(PackageFormat::Deb, String::new(), dir.path());

        let err = extract_artifact(&env, &artifact).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(env.read_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_read_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = expected_artifacts("appname", "1.2.3", dir.path());
        let env = MemoryBuildEnvironment::new();

        let err = extract_artifact(&env, &artifacts[1]).await.unwrap_err();

        assert!(matches!(err, ReleaseError::Extraction { .. }));
        assert!(!artifacts[1].dest_path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_extract_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = expected_artifacts("appname", "1.2.3", dir.path());
        std::fs::write(&artifacts[0].dest_path, b"stale").unwrap();
        let env = MemoryBuildEnvironment::new()
            .with_artifact(&artifacts[0].source_path, b"fresh".to_vec());

        extract_artifact(&env, &artifacts[0]).await.unwrap();

        assert_eq!(std::fs::read(&artifacts[0].dest_path).unwrap(), b"fresh");
    }
}
