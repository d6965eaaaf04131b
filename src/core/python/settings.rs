//! Project-wide settings for Python tasks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const PYPI_INDEX_URL: &str = "https://pypi.org/simple";
const PYPI_UPLOAD_URL: &str = "https://upload.pypi.org/legacy";
const TESTPYPI_INDEX_URL: &str = "https://test.pypi.org/simple";
const TESTPYPI_UPLOAD_URL: &str = "https://test.pypi.org/legacy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PythonIndex {
    pub alias: String,
    pub index_url: String,
    pub upload_url: String,
    #[serde(skip_serializing)]
    pub credentials: Option<Credentials>,
    pub is_package_source: bool,
    pub default: bool,
    pub publish: bool,
}

/// Index declaration as written in the settings file. URLs may be left
/// out for well-known aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default = "default_true")]
    pub is_package_source: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub publish: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            index_url: None,
            upload_url: None,
            credentials: None,
            is_package_source: true,
            default: false,
            publish: false,
        }
    }
}

/// The `python` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests_directory: Option<PathBuf>,
    /// Indexes in declaration order, keyed by alias.
    #[serde(default)]
    pub package_indexes: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub alias: String,
    #[serde(flatten)]
    pub options: IndexOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct PythonSettings {
    pub project_dir: PathBuf,
    pub source_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_directory: Option<PathBuf>,
    pub package_indexes: Vec<PythonIndex>,
}

impl PythonSettings {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            source_directory: PathBuf::from("src"),
            tests_directory: None,
            package_indexes: Vec::new(),
        }
    }

    /// Build settings from the config section, validating every index.
    pub fn from_config(project_dir: impl Into<PathBuf>, config: &PythonConfig) -> Result<Self> {
        let mut settings = Self::new(project_dir);
        if let Some(source) = &config.source_directory {
            settings.source_directory = source.clone();
        }
        settings.tests_directory = config.tests_directory.clone();
        for entry in &config.package_indexes {
            settings.add_package_index(&entry.alias, entry.options.clone())?;
        }
        Ok(settings)
    }

    pub fn package_index(&self, alias: &str) -> Option<&PythonIndex> {
        self.package_indexes.iter().find(|index| index.alias == alias)
    }

    pub fn default_package_index(&self) -> Option<&PythonIndex> {
        self.package_indexes.iter().find(|index| index.default)
    }

    /// Add or replace an index to consume packages from or publish to.
    ///
    /// `index_url` may be omitted for `pypi` and `testpypi`. `upload_url`
    /// defaults for those two and is otherwise derived by stripping a
    /// trailing `/simple` from the index URL.
    pub fn add_package_index(&mut self, alias: &str, options: IndexOptions) -> Result<&mut Self> {
        if options.default {
            if let Some(existing) = self.default_package_index() {
                if existing.alias != alias {
                    return Err(Error::config_invalid_value(
                        "python.package_indexes",
                        Some(alias.to_string()),
                        format!(
                            "cannot add another default index (got: {:?}, trying to add: {:?})",
                            existing.alias, alias
                        ),
                    ));
                }
            }
        }

        let index_url = match (options.index_url, alias) {
            (Some(url), _) => url,
            (None, "pypi") => PYPI_INDEX_URL.to_string(),
            (None, "testpypi") => TESTPYPI_INDEX_URL.to_string(),
            (None, _) => {
                return Err(Error::config_invalid_value(
                    "python.package_indexes",
                    Some(alias.to_string()),
                    format!("cannot derive index URL for alias {:?}", alias),
                ))
            }
        };

        let upload_url = match (options.upload_url, alias) {
            (Some(url), _) => url,
            (None, "pypi") => PYPI_UPLOAD_URL.to_string(),
            (None, "testpypi") => TESTPYPI_UPLOAD_URL.to_string(),
            (None, _) => match index_url.strip_suffix("/simple") {
                Some(base) => base.to_string(),
                None => {
                    return Err(Error::config_invalid_value(
                        "python.package_indexes",
                        Some(alias.to_string()),
                        format!(
                            "cannot derive upload URL for alias {:?} and index URL {:?}",
                            alias, index_url
                        ),
                    ))
                }
            },
        };

        let index = PythonIndex {
            alias: alias.to_string(),
            index_url,
            upload_url,
            credentials: options.credentials,
            is_package_source: options.is_package_source,
            default: options.default,
            publish: options.publish,
        };

        match self.package_indexes.iter_mut().find(|i| i.alias == alias) {
            Some(slot) => *slot = index,
            None => self.package_indexes.push(index),
        }
        Ok(self)
    }

    /// The configured tests directory, or the first of `test`, `tests`,
    /// `src/test`, `src/tests` that exists under the project directory.
    pub fn tests_directory(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.tests_directory {
            return Some(dir.clone());
        }
        ["test", "tests", "src/test", "src/tests"]
            .iter()
            .map(Path::new)
            .find(|candidate| self.project_dir.join(candidate).is_dir())
            .map(Path::to_path_buf)
    }

    /// The tests directory as a zero- or one-element argument list.
    pub fn tests_directory_as_args(&self) -> Vec<String> {
        self.tests_directory()
            .map(|dir| vec![dir.display().to_string()])
            .unwrap_or_default()
    }
}
