//! Version lookup from build metadata.
//!
//! The metadata file is a make-style `KEY = value` file. Assignment operators
//! `=`, `?=`, `:=` and `::=` are all accepted; the first assignment wins.

use std::path::Path;

use crate::error::{ReleaseError, Result};

/// Read the value of `key` from the metadata file at `path`.
pub fn resolve_version(path: &Path, key: &str) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReleaseError::NotFound {
            key: key.to_string(),
            path: path.display().to_string(),
        },
        _ => ReleaseError::Io(e),
    })?;

    parse_version(&content, key).ok_or_else(|| ReleaseError::NotFound {
        key: key.to_string(),
        path: path.display().to_string(),
    })
}

/// Find the first assignment of `key` in `content`.
///
/// Returns `None` when the key is absent or its value is empty.
pub fn parse_version(content: &str, key: &str) -> Option<String> {
    let value = content.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix(key)?.trim_start();
        ["::=", ":=", "?=", "="]
            .iter()
            .find_map(|op| rest.strip_prefix(op))
    })?;
    // A blank first assignment does not fall through to later ones.
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
