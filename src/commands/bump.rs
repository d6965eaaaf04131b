use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use stdtasks::cargo::bump::{run_bump, run_temporary_bump, BumpOptions, BumpOutcome, VersionSpec};
use stdtasks::utils::command::{self, CapturedOutput};
use stdtasks::ErrorCode;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct BumpArgs {
    /// New version (e.g., 1.2.3) or patch, minor, major
    version: String,

    /// Path to Cargo.toml, relative to the project directory
    #[arg(long, default_value = "Cargo.toml")]
    manifest: PathBuf,

    /// Registry (from settings) to pin path dependencies to
    #[arg(long, value_name = "NAME")]
    registry: Option<String>,

    /// Command to run against the bumped manifest; the bump is reverted afterwards.
    /// Example: `stdtasks bump 1.2.3 --registry corp -- cargo publish --registry corp`
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[derive(Serialize)]
pub struct BumpCommandOutput {
    command: String,
    #[serde(flatten)]
    outcome: BumpOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    ran: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<CapturedOutput>,
}

pub fn run(args: BumpArgs, global: &GlobalArgs) -> CmdResult<BumpCommandOutput> {
    let settings = global.settings()?;
    let manifest_path = global.resolve(&args.manifest);
    let version: VersionSpec = args.version.parse()?;

    let options = BumpOptions {
        manifest_path: manifest_path.clone(),
        version,
        registry: args.registry,
    };

    let Some((program, program_args)) = args.command.split_first() else {
        let outcome = run_bump(&options, &settings.cargo)?;
        return Ok((
            BumpCommandOutput {
                command: "bump".to_string(),
                outcome,
                ran: None,
                output: None,
            },
            0,
        ));
    };

    let workdir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let (outcome, output) = run_temporary_bump(&options, &settings.cargo, |_| {
        command::run_in(&workdir, program, program_args, None, None)
    })
    .map_err(|err| {
        if err.code == ErrorCode::CommandFailed {
            err.with_hint(format!(
                "{} was restored to its original content",
                manifest_path.display()
            ))
        } else {
            err
        }
    })?;

    Ok((
        BumpCommandOutput {
            command: "bump".to_string(),
            outcome,
            ran: Some(command::display_command(program, program_args)),
            output: Some(output),
        },
        0,
    ))
}
