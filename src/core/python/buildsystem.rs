//! Pluggable Python build backends.

use std::path::{Path, PathBuf};

use toml::Table;

use super::settings::PythonSettings;
use super::slap::SlapPythonBuildSystem;
use crate::error::{Error, Result};
use crate::utils::io;

/// A tool that builds and installs a Python project.
pub trait PythonBuildSystem {
    fn name(&self) -> &'static str;

    fn supports_managed_environments(&self) -> bool;

    /// The virtual environment the build system manages for the project.
    fn managed_environment(&self) -> Result<Box<dyn ManagedEnvironment>>;

    fn requires_login(&self) -> bool;

    /// Build distributions into `output_dir`, optionally releasing as
    /// `as_version` first. Returns the produced files.
    fn build(&self, output_dir: &Path, as_version: Option<&str>) -> Result<Vec<PathBuf>>;
}

/// A virtual environment owned by a build system.
pub trait ManagedEnvironment {
    fn exists(&mut self) -> Result<bool> {
        Ok(self.path()?.is_some())
    }

    /// Location of the environment, or `None` if it was not created yet.
    fn path(&mut self) -> Result<Option<PathBuf>>;

    /// Create the environment if needed and install the project into it.
    fn install(&mut self, settings: &PythonSettings) -> Result<()>;
}

/// Read `pyproject.toml` from the project directory, if any.
pub fn read_pyproject(project_dir: &Path) -> Result<Option<Table>> {
    let path = project_dir.join("pyproject.toml");
    let Some(content) = io::read_file_optional(&path, "read pyproject.toml")? else {
        return Ok(None);
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| Error::manifest_invalid_toml(path.display().to_string(), e))
}

/// Pick the build system configured in `pyproject.toml`.
pub fn detect_build_system(project_dir: &Path) -> Result<Option<Box<dyn PythonBuildSystem>>> {
    let Some(pyproject) = read_pyproject(project_dir)? else {
        return Ok(None);
    };

    let tool = pyproject.get("tool").and_then(|t| t.as_table());
    if tool.is_some_and(|t| t.contains_key("slap")) {
        log_status!("python", "Detected Slap build system in {}", project_dir.display());
        return Ok(Some(Box::new(SlapPythonBuildSystem::new(project_dir))));
    }

    Ok(None)
}

/// Like [`detect_build_system`], but a missing build system is an error.
pub fn require_build_system(project_dir: &Path) -> Result<Box<dyn PythonBuildSystem>> {
    detect_build_system(project_dir)?
        .ok_or_else(|| Error::build_system_not_found(project_dir.display().to_string()))
}
