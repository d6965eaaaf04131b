use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// File name of the settings file, both globally and per project.
pub const SETTINGS_FILE: &str = "stdtasks.json";

/// Base config directory (~/.config/stdtasks/ on Unix, %APPDATA%\stdtasks on Windows)
pub fn stdtasks() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("stdtasks"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("stdtasks"))
    }
}

/// Global settings file path
pub fn global_settings() -> Result<PathBuf> {
    Ok(stdtasks()?.join(SETTINGS_FILE))
}

/// Project-level settings file path
pub fn project_settings(project_dir: &Path) -> PathBuf {
    project_dir.join(SETTINGS_FILE)
}
