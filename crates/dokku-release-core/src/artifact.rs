//! Package artifacts produced by the build.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory inside the build image holding finished packages.
pub const BUILD_ENV_DIR: &str = "/data";

/// Package format produced by the build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PackageFormat {
    Deb,
    Rpm,
}

impl PackageFormat {
    pub const ALL: [PackageFormat; 2] = [PackageFormat::Deb, PackageFormat::Rpm];

    pub fn extension(&self) -> &'static str {
        match self {
            PackageFormat::Deb => "deb",
            PackageFormat::Rpm => "rpm",
        }
    }

    /// Conventional file name for `name` at `version`.
    pub fn file_name(&self, name: &str, version: &str) -> String {
        match self {
            PackageFormat::Deb => format!("{}_{}_amd64.{}", name, version, self.extension()),
            PackageFormat::Rpm => format!("{}-{}-1.x86_64.{}", name, version, self.extension()),
        }
    }
}

impl std::fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A built package, located both in the build environment and on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub format: PackageFormat,
    pub file_name: String,
    /// Path inside the isolated build environment.
    pub source_path: String,
    /// Path in the persistent output directory.
    pub dest_path: PathBuf,
}

impl Artifact {
    pub fn new(format: PackageFormat, file_name: String, output_dir: &Path) -> Self {
        let source_path = format!("{}/{}", BUILD_ENV_DIR, file_name);
        let dest_path = output_dir.join(&file_name);
        Self {
            format,
            file_name,
            source_path,
            dest_path,
        }
    }
}

/// Artifacts expected from a build of `name` at `version`, one per format.
pub fn expected_artifacts(name: &str, version: &str, output_dir: &Path) -> Vec<Artifact> {
    PackageFormat::ALL
        .iter()
        .map(|format| Artifact::new(*format, format.file_name(name, version), output_dir))
        .collect()
}
