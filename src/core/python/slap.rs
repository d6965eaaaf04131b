//! Slap as a Python build system.
//!
//! Requires Slap 1.6.25 or newer on `PATH`.

use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::buildsystem::{ManagedEnvironment, PythonBuildSystem};
use super::settings::PythonSettings;
use crate::error::{CommandFailedDetails, Error, Result};
use crate::utils::command;

const MASK: &str = "[MASKED]";

/// Characters left alone when quoting index specs; matches URL path quoting.
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

fn quote(value: &str) -> String {
    utf8_percent_encode(value, QUOTE_SET).to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub struct SlapPythonBuildSystem {
    project_dir: PathBuf,
}

impl SlapPythonBuildSystem {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }
}

impl PythonBuildSystem for SlapPythonBuildSystem {
    fn name(&self) -> &'static str {
        "Slap"
    }

    fn supports_managed_environments(&self) -> bool {
        true
    }

    fn managed_environment(&self) -> Result<Box<dyn ManagedEnvironment>> {
        Ok(Box::new(SlapManagedEnvironment::new(&self.project_dir)))
    }

    fn requires_login(&self) -> bool {
        false
    }

    fn build(&self, output_dir: &Path, as_version: Option<&str>) -> Result<Vec<PathBuf>> {
        // TODO: `slap release` edits the worktree and nothing reverts it yet.
        if let Some(version) = as_version {
            command::run_in(
                &self.project_dir,
                "slap",
                &strings(&["release", version]),
                None,
                None,
            )?;
        }

        let staging = tempfile::tempdir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create build dir".to_string())))?;
        let mut args = strings(&["publish", "--dry", "-b"]);
        args.push(staging.path().display().to_string());
        command::run_in(&self.project_dir, "slap", &args, None, None)?;

        fs::create_dir_all(output_dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some("create output dir".to_string())))?;

        let entries = fs::read_dir(staging.path())
            .map_err(|e| Error::internal_io(e.to_string(), Some("list build dir".to_string())))?;
        let mut produced = Vec::new();
        for entry in entries.flatten() {
            let src = entry.path();
            let dst = output_dir.join(entry.file_name());
            move_file(&src, &dst)?;
            produced.push(dst);
        }
        produced.sort();
        Ok(produced)
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("move {}", src.display()))))?;
    fs::remove_file(src)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("move {}", src.display()))))
}

pub struct SlapManagedEnvironment {
    project_dir: PathBuf,
    /// Cached `slap venv -p` answer; `Some(None)` means "no environment".
    env_path: Option<Option<PathBuf>>,
}

impl SlapManagedEnvironment {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            env_path: None,
        }
    }

    /// Arguments for `slap install`: the real ones and a copy with index
    /// passwords masked for logging.
    pub fn install_args(settings: &PythonSettings) -> (Vec<String>, Vec<String>) {
        let mut args = strings(&["install", "--ignore-active-venv", "--link"]);
        let mut shown = args.clone();

        for index in settings.package_indexes.iter().filter(|i| i.is_package_source) {
            let mut spec = format!("name={},url={}", quote(&index.alias), quote(&index.index_url));
            let mut shown_spec = spec.clone();
            if let Some(credentials) = &index.credentials {
                let username = quote(&credentials.username);
                spec.push_str(&format!(",username={},password={}", username, quote(&credentials.password)));
                shown_spec.push_str(&format!(",username={},password={}", username, MASK));
            }

            let option = if index.default { "--index" } else { "--extra-index" };
            args.push(option.to_string());
            args.push(spec);
            shown.push(option.to_string());
            shown.push(shown_spec);
        }

        (args, shown)
    }
}

impl ManagedEnvironment for SlapManagedEnvironment {
    fn path(&mut self) -> Result<Option<PathBuf>> {
        if let Some(cached) = &self.env_path {
            return Ok(cached.clone());
        }

        let args = strings(&["venv", "-p"]);
        let finished = command::run_status(&self.project_dir, "slap", &args, None)?;
        let path = match finished.exit_code {
            Some(0) => Some(PathBuf::from(finished.output.stdout.trim())),
            Some(1) => None,
            exit_code => {
                return Err(Error::command_failed(CommandFailedDetails {
                    command: command::display_command("slap", &args),
                    exit_code,
                    stdout: finished.output.stdout,
                    stderr: finished.output.stderr,
                    cwd: Some(self.project_dir.display().to_string()),
                }))
            }
        };

        self.env_path = Some(path.clone());
        Ok(path)
    }

    fn install(&mut self, settings: &PythonSettings) -> Result<()> {
        command::run_in(&self.project_dir, "slap", &strings(&["venv", "-ac"]), None, None)?;
        self.env_path = None;

        let (args, shown) = Self::install_args(settings);
        command::run_in(&self.project_dir, "slap", &args, Some(&shown), None)?;
        Ok(())
    }
}
