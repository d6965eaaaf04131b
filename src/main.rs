use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{bump, clippy, config, helm, manifest, python};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stdtasks")]
#[command(version = VERSION)]
#[command(about = "Build tasks for Cargo, Slap and Helm projects")]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect Cargo.toml manifests
    Manifest(manifest::ManifestArgs),
    /// Bump the version in Cargo.toml, optionally only while a command runs
    Bump(bump::BumpArgs),
    /// Run cargo clippy
    Clippy(clippy::ClippyArgs),
    /// Python build system tasks
    Python(python::PythonArgs),
    /// Helm chart tasks
    Helm(helm::HelmArgs),
    /// Show effective settings
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        project_dir: cli.project_dir.unwrap_or_else(|| PathBuf::from(".")),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
