//! Precondition checks run before any build or publish work.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// Locate `name` on the given search path.
pub fn find_on_path(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Fail with a precondition error unless `name` is on the search path.
pub fn require_tool(name: &str, search_path: Option<&OsStr>) -> Result<PathBuf> {
    find_on_path(name, search_path)
        .ok_or_else(|| ReleaseError::Precondition(format!("missing {} binary", name)))
}

/// Fail with a precondition error unless a publishing credential is set.
pub fn require_token(token: Option<&str>, variable: &str) -> Result<()> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(()),
        _ => Err(ReleaseError::Precondition(format!(
            "missing {} environment variable",
            variable
        ))),
    }
}
