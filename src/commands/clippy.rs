use clap::Args;

use stdtasks::cargo::clippy::{run_clippy, AllowMode, ClippyOptions, ClippyOutcome};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ClippyArgs {
    /// Apply clippy suggestions
    #[arg(long)]
    fix: bool,

    /// With --fix: also allow staged (`staged`) or dirty and staged (`dirty`) changes; `none` for neither
    #[arg(long, default_value = "staged", value_name = "MODE")]
    allow: String,
}

pub fn run(args: ClippyArgs, global: &GlobalArgs) -> CmdResult<ClippyOutcome> {
    let allow = match args.allow.as_str() {
        "none" => None,
        other => Some(other.parse::<AllowMode>()?),
    };
    let options = ClippyOptions {
        fix: args.fix,
        allow,
    };

    Ok((run_clippy(&global.project_dir, &options)?, 0))
}
