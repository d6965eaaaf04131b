use clap::{Args, Subcommand};
use serde::Serialize;

use stdtasks::Settings;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the merged global and project settings (secrets omitted)
    Show,
}

#[derive(Serialize)]
pub struct ConfigShowOutput {
    command: String,
    settings: Settings,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigShowOutput> {
    match args.command {
        ConfigCommand::Show => Ok((
            ConfigShowOutput {
                command: "config.show".to_string(),
                settings: global.settings()?,
            },
            0,
        )),
    }
}
