//! Settings loading.
//!
//! Settings come from two JSON files: the global one under the config
//! directory and `stdtasks.json` in the project directory. The project file
//! is deep-merged over the global one; a missing file contributes nothing.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::cargo::CargoSettings;
use crate::error::{Error, Result};
use crate::helm::HelmSettings;
use crate::paths;
use crate::python::{PythonConfig, PythonSettings};
use crate::utils::io;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cargo: CargoSettings,
    #[serde(default)]
    pub python: PythonConfig,
    #[serde(default)]
    pub helm: HelmSettings,
}

impl Settings {
    /// Load global settings overlaid with the project's.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let global = paths::global_settings().ok();
        Self::load_from(global.as_deref(), &paths::project_settings(project_dir))
    }

    /// Load from explicit files; either may be absent on disk.
    pub fn load_from(global: Option<&Path>, project: &Path) -> Result<Self> {
        let mut merged = Value::Object(serde_json::Map::new());
        let mut sources = Vec::new();

        for path in global.into_iter().chain(std::iter::once(project)) {
            if let Some(layer) = read_layer(path)? {
                deep_merge(&mut merged, layer);
                sources.push(path.to_path_buf());
            }
        }

        if !sources.is_empty() {
            log_status!(
                "config",
                "Loaded settings from {}",
                sources
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        from_value(merged, &sources)
    }

    pub fn python_settings(&self, project_dir: &Path) -> Result<PythonSettings> {
        PythonSettings::from_config(project_dir, &self.python)
    }
}

fn read_layer(path: &Path) -> Result<Option<Value>> {
    let Some(content) = io::read_file_optional(path, "read settings")? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
    if !value.is_object() {
        return Err(Error::config_invalid_value(
            path.display().to_string(),
            None,
            "settings file must contain a JSON object",
        ));
    }
    Ok(Some(value))
}

fn from_value<T: DeserializeOwned>(value: Value, sources: &[PathBuf]) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        let origin = sources
            .last()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| paths::SETTINGS_FILE.to_string());
        Error::config_invalid_json(origin, e)
    })
}

/// Merge `patch` into `base`. Objects merge key by key, `null` deletes a
/// key, arrays and scalars are replaced.
fn deep_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_obj), Value::Object(patch_obj)) => {
            for (key, value) in patch_obj {
                if value.is_null() {
                    base_obj.remove(&key);
                } else {
                    deep_merge(base_obj.entry(key).or_insert(Value::Null), value);
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(
            Some(&dir.path().join("global.json")),
            &dir.path().join("stdtasks.json"),
        )
        .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn project_layer_overrides_global() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.json");
        let project = dir.path().join("stdtasks.json");
        fs::write(
            &global,
            json!({
                "cargo": { "registries": {
                    "corp": { "alias": "corp", "index": "https://old.example.com/index" },
                    "other": { "alias": "other", "index": "https://other.example.com/index" }
                }},
                "helm": { "auth": { "localhost:5000": { "username": "u", "password": "p" } } }
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            &project,
            json!({
                "cargo": { "registries": {
                    "corp": { "index": "https://new.example.com/index" },
                    "other": null
                }}
            })
            .to_string(),
        )
        .unwrap();

        let settings = Settings::load_from(Some(&global), &project).unwrap();
        let corp = settings.cargo.registry("corp").unwrap();
        assert_eq!(corp.alias, "corp");
        assert_eq!(corp.index, "https://new.example.com/index");
        assert!(settings.cargo.registry("other").is_err());
        assert!(settings.helm.auth.contains_key("localhost:5000"));
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("stdtasks.json");
        fs::write(&project, "{ not json").unwrap();

        let err = Settings::load_from(None, &project).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
        assert!(err.details["path"].as_str().unwrap().ends_with("stdtasks.json"));
    }

    #[test]
    fn non_object_settings_rejected() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("stdtasks.json");
        fs::write(&project, "[1, 2]").unwrap();

        let err = Settings::load_from(None, &project).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let mut base = json!({ "a": [1, 2], "b": { "c": 1 } });
        deep_merge(&mut base, json!({ "a": [3], "b": { "d": 2 } }));
        assert_eq!(base, json!({ "a": [3], "b": { "c": 1, "d": 2 } }));
    }
}
