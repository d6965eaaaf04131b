use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use stdtasks::helm::{package_chart, push_chart, PackageOutcome, PushOutcome};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct HelmArgs {
    #[command(subcommand)]
    command: HelmCommand,
}

#[derive(Subcommand)]
enum HelmCommand {
    /// Package a chart directory into a tarball
    Package {
        /// Chart directory containing Chart.yaml
        chart_directory: PathBuf,

        /// Destination directory for the tarball
        #[arg(long, default_value = "build/helm")]
        output: PathBuf,
    },
    /// Push a packaged chart to a registry (e.g. oci://host:5000/charts)
    Push {
        chart_tarball: PathBuf,
        registry: String,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum HelmOutput {
    Package(PackageOutcome),
    Push(PushOutcome),
}

pub fn run(args: HelmArgs, global: &GlobalArgs) -> CmdResult<HelmOutput> {
    match args.command {
        HelmCommand::Package {
            chart_directory,
            output,
        } => {
            let outcome = package_chart(&global.resolve(&chart_directory), &global.resolve(&output))?;
            Ok((HelmOutput::Package(outcome), 0))
        }
        HelmCommand::Push {
            chart_tarball,
            registry,
        } => {
            let settings = global.settings()?;
            let outcome = push_chart(&settings.helm, &global.resolve(&chart_tarball), &registry)?;
            Ok((HelmOutput::Push(outcome), 0))
        }
    }
}
