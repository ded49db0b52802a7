//! Release request and classification.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// Requested bump level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
    /// Pre-release ("betafish") build.
    #[serde(rename = "betafish", alias = "prerelease")]
    Prerelease,
    /// Build and extract only, nothing is published.
    #[serde(rename = "build", alias = "build_only")]
    BuildOnly,
}

impl BumpLevel {
    pub const ALL: [BumpLevel; 5] = [
        BumpLevel::Major,
        BumpLevel::Minor,
        BumpLevel::Patch,
        BumpLevel::Prerelease,
        BumpLevel::BuildOnly,
    ];

    /// Name accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpLevel::Major => "major",
            BumpLevel::Minor => "minor",
            BumpLevel::Patch => "patch",
            BumpLevel::Prerelease => "betafish",
            BumpLevel::BuildOnly => "build",
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(BumpLevel::Major),
            "minor" => Ok(BumpLevel::Minor),
            "patch" => Ok(BumpLevel::Patch),
            "betafish" | "prerelease" => Ok(BumpLevel::Prerelease),
            "build" | "build-only" => Ok(BumpLevel::BuildOnly),
            other => Err(ReleaseError::invalid_argument(
                "bump_level",
                format!(
                    "'{}' is not one of major, minor, patch, betafish, build",
                    other
                ),
            )),
        }
    }
}

/// Immutable description of one release invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub bump_level: BumpLevel,
    pub trace: bool,
}

impl ReleaseRequest {
    pub fn new(bump_level: BumpLevel, trace: bool) -> Self {
        Self { bump_level, trace }
    }

    /// Parse a request from the raw bump level argument.
    pub fn parse(bump_level: &str, trace: bool) -> Result<Self> {
        Ok(Self::new(bump_level.parse()?, trace))
    }
}

/// Outcome of classifying a bump level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseClassification {
    pub is_official_release: bool,
    pub should_publish: bool,
}

/// Classify a bump level.
///
/// Official iff major/minor/patch; publish unless build-only.
pub fn classify(bump_level: BumpLevel) -> ReleaseClassification {
    ReleaseClassification {
        is_official_release: matches!(
            bump_level,
            BumpLevel::Major | BumpLevel::Minor | BumpLevel::Patch
        ),
        should_publish: bump_level != BumpLevel::BuildOnly,
    }
}

/// Classify a raw bump level string.
pub fn classify_str(bump_level: &str) -> Result<ReleaseClassification> {
    Ok(classify(bump_level.parse()?))
}
