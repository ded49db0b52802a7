//! App name validation

use crate::error::{HookError, Result};

/// Check that `app` is a usable dokku app name.
///
/// Lowercase alphanumerics, `-` and `.`; must start with an alphanumeric.
/// This also keeps app names from escaping the data root.
pub fn validate_app_name(app: &str) -> Result<()> {
    let mut chars = app.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .unwrap_or(false);
    let rest_ok =
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if first_ok && rest_ok && !app.contains("..") {
        Ok(())
    } else {
        Err(HookError::InvalidAppName(app.to_string()))
    }
}
