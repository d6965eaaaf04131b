use std::path::{Path, PathBuf};

pub type CmdResult<T> = stdtasks::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub project_dir: PathBuf,
}

impl GlobalArgs {
    /// Resolve a path given on the command line against the project directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn settings(&self) -> stdtasks::Result<stdtasks::Settings> {
        stdtasks::Settings::load(&self.project_dir)
    }
}

pub mod bump;
pub mod clippy;
pub mod config;
pub mod helm;
pub mod manifest;
pub mod python;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (stdtasks::Result<serde_json::Value>, i32) {
    crate::tty::status("stdtasks is working...");

    match command {
        crate::Commands::Manifest(args) => dispatch!(args, global, manifest),
        crate::Commands::Bump(args) => dispatch!(args, global, bump),
        crate::Commands::Clippy(args) => dispatch!(args, global, clippy),
        crate::Commands::Python(args) => dispatch!(args, global, python),
        crate::Commands::Helm(args) => dispatch!(args, global, helm),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
