use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use stdtasks::cargo::CargoManifest;
use stdtasks::Error;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ManifestArgs {
    #[command(subcommand)]
    command: ManifestCommand,
}

#[derive(Subcommand)]
enum ManifestCommand {
    /// Show the recognized sections and the full manifest as JSON
    Show {
        /// Path to Cargo.toml, relative to the project directory
        #[arg(long, default_value = "Cargo.toml")]
        manifest: PathBuf,
    },
    /// Validate that the manifest loads
    Check {
        #[arg(long, default_value = "Cargo.toml")]
        manifest: PathBuf,
    },
    /// List member manifests of a workspace
    Members {
        #[arg(long, default_value = "Cargo.toml")]
        manifest: PathBuf,
    },
}

#[derive(Serialize)]
pub struct PackageSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    edition: Option<String>,
    unhandled_keys: Vec<String>,
}

#[derive(Serialize)]
pub struct ManifestShowOutput {
    command: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<PackageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_members: Option<Vec<String>>,
    bins: Vec<String>,
    dependencies: Vec<String>,
    manifest: serde_json::Value,
}

#[derive(Serialize)]
pub struct ManifestCheckOutput {
    command: String,
    path: String,
    valid: bool,
}

#[derive(Serialize)]
pub struct ManifestMembersOutput {
    command: String,
    path: String,
    members: Vec<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ManifestOutput {
    Show(ManifestShowOutput),
    Check(ManifestCheckOutput),
    Members(ManifestMembersOutput),
}

pub fn run(args: ManifestArgs, global: &GlobalArgs) -> CmdResult<ManifestOutput> {
    match args.command {
        ManifestCommand::Show { manifest } => {
            let path = global.resolve(&manifest);
            let manifest = CargoManifest::read(&path)?;
            let table = serde_json::to_value(manifest.to_table()).map_err(|e| {
                Error::internal_json(e.to_string(), Some("render manifest".to_string()))
            })?;

            let package = manifest.package.as_ref().map(|p| PackageSummary {
                name: p.name.clone(),
                version: p.version.clone(),
                edition: p.edition.clone(),
                unhandled_keys: p.unhandled.keys().cloned().collect(),
            });
            let workspace = manifest.workspace.as_ref();

            Ok((
                ManifestOutput::Show(ManifestShowOutput {
                    command: "manifest.show".to_string(),
                    path: path.display().to_string(),
                    package,
                    workspace_version: workspace
                        .and_then(|w| w.package.as_ref())
                        .map(|p| p.version.clone()),
                    workspace_members: workspace.and_then(|w| w.members.clone()),
                    bins: manifest.bin.iter().map(|b| b.name.clone()).collect(),
                    dependencies: manifest
                        .dependencies
                        .as_ref()
                        .map(|d| d.data.keys().cloned().collect())
                        .unwrap_or_default(),
                    manifest: table,
                }),
                0,
            ))
        }
        ManifestCommand::Check { manifest } => {
            let path = global.resolve(&manifest);
            CargoManifest::read(&path)?;
            Ok((
                ManifestOutput::Check(ManifestCheckOutput {
                    command: "manifest.check".to_string(),
                    path: path.display().to_string(),
                    valid: true,
                }),
                0,
            ))
        }
        ManifestCommand::Members { manifest } => {
            let path = global.resolve(&manifest);
            let members = CargoManifest::read(&path)?
                .member_manifests()?
                .into_iter()
                .map(|p| p.display().to_string())
                .collect();
            Ok((
                ManifestOutput::Members(ManifestMembersOutput {
                    command: "manifest.members".to_string(),
                    path: path.display().to_string(),
                    members,
                }),
                0,
            ))
        }
    }
}
