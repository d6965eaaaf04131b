use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use stdtasks::python::{require_build_system, PythonSettings};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct PythonArgs {
    #[command(subcommand)]
    command: PythonCommand,
}

#[derive(Subcommand)]
enum PythonCommand {
    /// Build distributions with the detected build system
    Build {
        /// Directory to place the distributions in
        #[arg(long, default_value = "dist")]
        output: PathBuf,

        /// Release the project as this version before building
        #[arg(long, value_name = "VERSION")]
        as_version: Option<String>,
    },
    /// Create the managed environment and install the project into it
    Install,
    /// Show the managed environment location
    Venv,
    /// Show the resolved Python settings (credentials omitted)
    Settings,
}

#[derive(Serialize)]
pub struct PythonBuildOutput {
    command: String,
    build_system: String,
    files: Vec<String>,
}

#[derive(Serialize)]
pub struct PythonVenvOutput {
    command: String,
    build_system: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Serialize)]
pub struct PythonSettingsOutput {
    command: String,
    settings: PythonSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    tests_directory: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum PythonOutput {
    Build(PythonBuildOutput),
    Venv(PythonVenvOutput),
    Settings(PythonSettingsOutput),
}

pub fn run(args: PythonArgs, global: &GlobalArgs) -> CmdResult<PythonOutput> {
    match args.command {
        PythonCommand::Build { output, as_version } => {
            let system = require_build_system(&global.project_dir)?;
            let files = system
                .build(&global.resolve(&output), as_version.as_deref())?
                .into_iter()
                .map(|p| p.display().to_string())
                .collect();
            Ok((
                PythonOutput::Build(PythonBuildOutput {
                    command: "python.build".to_string(),
                    build_system: system.name().to_string(),
                    files,
                }),
                0,
            ))
        }
        PythonCommand::Install => {
            let settings = global.settings()?.python_settings(&global.project_dir)?;
            let system = require_build_system(&global.project_dir)?;
            let mut env = system.managed_environment()?;
            env.install(&settings)?;
            let path = env.path()?;
            Ok((
                PythonOutput::Venv(PythonVenvOutput {
                    command: "python.install".to_string(),
                    build_system: system.name().to_string(),
                    exists: path.is_some(),
                    path: path.map(|p| p.display().to_string()),
                }),
                0,
            ))
        }
        PythonCommand::Venv => {
            let system = require_build_system(&global.project_dir)?;
            let path = system.managed_environment()?.path()?;
            Ok((
                PythonOutput::Venv(PythonVenvOutput {
                    command: "python.venv".to_string(),
                    build_system: system.name().to_string(),
                    exists: path.is_some(),
                    path: path.map(|p| p.display().to_string()),
                }),
                0,
            ))
        }
        PythonCommand::Settings => {
            let settings = global.settings()?.python_settings(&global.project_dir)?;
            let tests_directory = settings.tests_directory().map(|p| p.display().to_string());
            Ok((
                PythonOutput::Settings(PythonSettingsOutput {
                    command: "python.settings".to_string(),
                    settings,
                    tests_directory,
                }),
                0,
            ))
        }
    }
}
