//! Per-app resource limits and reservations.
//!
//! Each app has one JSON document at
//! `{config_root}/resource/{app}/resources.json` mapping a process type to
//! its limits and reservations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::app::validate_app_name;
use crate::config::HookConfig;
use crate::error::{HookError, Result};

const STORE_FILE: &str = "resources.json";

/// Resource settings of one process type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reservations: BTreeMap<String, String>,
}

impl ProcessResources {
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty() && self.reservations.is_empty()
    }
}

/// All resource settings of an app, keyed by process type
pub type AppResources = BTreeMap<String, ProcessResources>;

/// JSON-file store of app resource settings
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    pub fn new(config: &HookConfig) -> Self {
        Self {
            root: config.resource_dir(),
        }
    }

    pub fn path_for(&self, app: &str) -> PathBuf {
        self.root.join(app).join(STORE_FILE)
    }

    /// Load an app's settings; a missing document is empty
    pub fn load(&self, app: &str) -> Result<AppResources> {
        let path = self.path_for(app);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppResources::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| HookError::ResourceStore {
            app: app.to_string(),
            detail: format!("{}: {}", path.display(), e),
        })
    }

    /// Atomically replace an app's settings
    pub fn save(&self, app: &str, resources: &AppResources) -> Result<()> {
        let path = self.path_for(app);
        let dir = self.root.join(app);
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_vec_pretty(resources).map_err(|e| HookError::ResourceStore {
            app: app.to_string(),
            detail: e.to_string(),
        })?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".resources-")
            .tempfile_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| HookError::Io(e.error))?;
        debug!(path = %path.display(), "Saved resource settings");
        Ok(())
    }
}

/// Drop limits for one process type, or for every type when `process_type`
/// is `None`. Entries left with neither limits nor reservations are removed.
/// Returns the process types whose limits were cleared.
pub fn clear_limits(resources: &mut AppResources, process_type: Option<&str>) -> Vec<String> {
    let mut cleared = Vec::new();
    for (name, entry) in resources.iter_mut() {
        if process_type.is_some_and(|p| p != name.as_str()) {
            continue;
        }
        if !entry.limits.is_empty() {
            entry.limits.clear();
            cleared.push(name.clone());
        }
    }
    resources.retain(|_, entry| !entry.is_empty());
    cleared
}

/// `resource:limit-clear [--process-type <type>] <app>`
///
/// An empty `process_type` means every process type.
pub fn limit_clear(
    config: &HookConfig,
    args: &[String],
    process_type: &str,
) -> Result<Vec<String>> {
    let app = args.first().ok_or_else(|| {
        HookError::MissingArgument("Please specify an app to run the command on".to_string())
    })?;
    validate_app_name(app)?;
    if !config.app_dir(app).is_dir() {
        return Err(HookError::AppNotFound(app.clone()));
    }

    let process_type = Some(process_type).filter(|p| !p.is_empty());
    match process_type {
        Some(p) => info!("-----> Clearing resource limits ({p}) for {app}"),
        None => info!("-----> Clearing resource limits for {app}"),
    }

    let store = ResourceStore::new(config);
    let mut resources = store.load(app)?;
    let cleared = clear_limits(&mut resources, process_type);
    store.save(app, &resources)?;
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn entry(limits: &[(&str, &str)], reservations: &[(&str, &str)]) -> ProcessResources {
        ProcessResources {
            limits: map(limits),
            reservations: map(reservations),
        }
    }

    fn sample() -> AppResources {
        let mut resources = AppResources::new();
        resources.insert("web".into(), entry(&[("memory", "512m")], &[("cpu", "1")]));
        resources.insert("worker".into(), entry(&[("cpu", "2")], &[]));
        resources
    }

    #[test]
    fn test_clear_single_process_type() {
        let mut resources = sample();
        let cleared = clear_limits(&mut resources, Some("worker"));
        assert_eq!(cleared, vec!["worker".to_string()]);
        assert!(!resources.contains_key("worker"));
        assert_eq!(resources["web"].limits["memory"], "512m");
    }

    #[test]
    fn test_clear_all_keeps_reservations() {
        let mut resources = sample();
        let cleared = clear_limits(&mut resources, None);
        assert_eq!(cleared, vec!["web".to_string(), "worker".to_string()]);
        assert_eq!(resources.len(), 1);
        assert!(resources["web"].limits.is_empty());
        assert_eq!(resources["web"].reservations["cpu"], "1");
    }

    #[test]
    fn test_clear_unknown_type_is_noop() {
        let mut resources = sample();
        assert!(clear_limits(&mut resources, Some("cron")).is_empty());
        assert_eq!(resources, sample());
    }

    #[test]
    fn test_store_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = HookConfig::new(dir.path().join("data"), dir.path().join("config"));
        let store = ResourceStore::new(&config);

        assert!(store.load("app").unwrap().is_empty());
        store.save("app", &sample()).unwrap();
        assert_eq!(store.load("app").unwrap(), sample());
    }

    #[test]
    fn test_corrupt_store_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = HookConfig::new(dir.path().join("data"), dir.path().join("config"));
        let store = ResourceStore::new(&config);
        std::fs::create_dir_all(store.path_for("app").parent().unwrap()).unwrap();
        std::fs::write(store.path_for("app"), "{not json").unwrap();

        assert!(matches!(store.load("app"), Err(HookError::ResourceStore { .. })));
    }
}
