//! Version bumps for `Cargo.toml`.
//!
//! Sets `package.version` (and `workspace.package.version` when present)
//! and, when publishing to a named registry, pins every `path` dependency
//! to the new version and that registry. Path dependencies cannot be
//! published on their own, so this is what makes a crate publishable.
//!
//! The rewritten manifest is either kept or swapped in only for the
//! duration of a dependent operation (e.g. `cargo publish`).

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use toml::Value;

use super::manifest::{CargoManifest, DependencySpec, Dependencies};
use super::registry::CargoSettings;
use crate::error::{Error, Result};
use crate::file_swap::{self, FileSwap};

/// Apply a version bump to the in-memory manifest.
///
/// Returns the names of dependencies that were pinned. A manifest without a
/// `[package]` section is left untouched.
pub fn bump_manifest(
    manifest: &mut CargoManifest,
    version: &str,
    registry_alias: Option<&str>,
) -> Vec<String> {
    let Some(package) = manifest.package.as_mut() else {
        return Vec::new();
    };
    package.version = Some(version.to_string());

    if let Some(workspace_package) = manifest
        .workspace
        .as_mut()
        .and_then(|workspace| workspace.package.as_mut())
    {
        workspace_package.version = version.to_string();
    }

    match (registry_alias, manifest.dependencies.as_mut()) {
        (Some(alias), Some(dependencies)) => push_version_to_path_deps(dependencies, version, alias),
        _ => Vec::new(),
    }
}

fn push_version_to_path_deps(dependencies: &mut Dependencies, version: &str, alias: &str) -> Vec<String> {
    let mut pinned = Vec::new();
    for (name, spec) in dependencies.specs_mut() {
        let DependencySpec::Detailed(table) = spec else {
            continue;
        };
        if !table.contains_key("path") {
            continue;
        }
        table.insert("version".to_string(), Value::String(version.to_string()));
        table.insert("registry".to_string(), Value::String(alias.to_string()));
        pinned.push(name.to_string());
    }
    pinned
}

/// Target of a bump: an explicit version or a semver increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Exact(String),
    Patch,
    Minor,
    Major,
}

impl FromStr for VersionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "patch" => Ok(VersionSpec::Patch),
            "minor" => Ok(VersionSpec::Minor),
            "major" => Ok(VersionSpec::Major),
            other => {
                let parsed = semver::Version::parse(other).map_err(|e| {
                    Error::validation_invalid_argument(
                        "version",
                        format!("'{}' is not a semantic version: {}", other, e),
                        Some(other.to_string()),
                        Some(vec!["patch".into(), "minor".into(), "major".into()]),
                    )
                })?;
                Ok(VersionSpec::Exact(parsed.to_string()))
            }
        }
    }
}

impl VersionSpec {
    /// Resolve against the manifest's current version.
    pub fn resolve(&self, current: Option<&str>) -> Result<String> {
        if let VersionSpec::Exact(version) = self {
            return Ok(version.clone());
        }

        let current = current.ok_or_else(|| {
            Error::validation_invalid_argument(
                "version",
                "Manifest has no version to increment; pass an explicit version",
                None,
                None,
            )
        })?;
        let mut version = semver::Version::parse(current).map_err(|e| {
            Error::validation_invalid_argument(
                "version",
                format!("Current version '{}' is not a semantic version: {}", current, e),
                Some(current.to_string()),
                None,
            )
        })?;

        match self {
            VersionSpec::Patch => version.patch = increment(version.patch, current)?,
            VersionSpec::Minor => {
                version.minor = increment(version.minor, current)?;
                version.patch = 0;
            }
            VersionSpec::Major => {
                version.major = increment(version.major, current)?;
                version.minor = 0;
                version.patch = 0;
            }
            VersionSpec::Exact(_) => {}
        }
        version.pre = semver::Prerelease::EMPTY;
        version.build = semver::BuildMetadata::EMPTY;

        Ok(version.to_string())
    }
}

fn increment(component: u64, current: &str) -> Result<u64> {
    component.checked_add(1).ok_or_else(|| {
        Error::validation_invalid_argument(
            "version",
            format!("Cannot increment '{}': component out of range", current),
            Some(current.to_string()),
            None,
        )
    })
}

#[derive(Debug, Clone)]
pub struct BumpOptions {
    pub manifest_path: PathBuf,
    pub version: VersionSpec,
    /// Registry name from the `cargo.registries` settings.
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    pub manifest_path: String,
    /// `None` when the manifest has no `[package]` and nothing was bumped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_alias: Option<String>,
    pub pinned_dependencies: Vec<String>,
    pub temporary: bool,
    pub bumped: bool,
    pub status: String,
}

/// Compute the bumped manifest text without touching the file.
///
/// A manifest without `[package]` comes back re-serialized and unbumped;
/// neither the version nor the registry is resolved for it.
pub fn prepare_bump(options: &BumpOptions, cargo: &CargoSettings) -> Result<(String, BumpOutcome)> {
    let mut manifest = CargoManifest::read(&options.manifest_path)?;
    let manifest_path = options.manifest_path.display().to_string();

    let Some(package) = manifest.package.as_ref() else {
        return Ok((
            manifest.to_toml_string()?,
            BumpOutcome {
                manifest_path,
                version: None,
                previous_version: None,
                registry_alias: None,
                pinned_dependencies: Vec::new(),
                temporary: false,
                bumped: false,
                status: "no [package] to bump".to_string(),
            },
        ));
    };

    let previous_version = package.version.clone().or_else(|| {
        manifest
            .workspace
            .as_ref()
            .and_then(|w| w.package.as_ref())
            .map(|p| p.version.clone())
    });
    let version = options.version.resolve(previous_version.as_deref())?;

    let registry_alias = options
        .registry
        .as_deref()
        .map(|name| cargo.registry(name).map(|r| r.alias.clone()))
        .transpose()?;

    let pinned_dependencies = bump_manifest(&mut manifest, &version, registry_alias.as_deref());
    let content = manifest.to_toml_string()?;

    Ok((
        content,
        BumpOutcome {
            manifest_path,
            status: format!("permanent bump to {}", version),
            version: Some(version),
            previous_version,
            registry_alias,
            pinned_dependencies,
            temporary: false,
            bumped: true,
        },
    ))
}

/// Bump and keep the result on disk.
pub fn run_bump(options: &BumpOptions, cargo: &CargoSettings) -> Result<BumpOutcome> {
    let (content, outcome) = prepare_bump(options, cargo)?;
    let mut swap = FileSwap::open(&options.manifest_path, false)?;
    swap.write(&content)?;
    swap.commit()?;
    log_status!("bump", "{} ({})", outcome.status, outcome.manifest_path);
    Ok(outcome)
}

/// Bump, run `operation` against the bumped manifest, then restore the
/// original file whatever the operation's result.
pub fn run_temporary_bump<T>(
    options: &BumpOptions,
    cargo: &CargoSettings,
    operation: impl FnOnce(&BumpOutcome) -> Result<T>,
) -> Result<(BumpOutcome, T)> {
    let (content, mut outcome) = prepare_bump(options, cargo)?;
    outcome.temporary = true;
    if let Some(version) = &outcome.version {
        outcome.status = format!("temporary bump to {}", version);
    }
    log_status!("bump", "{} ({})", outcome.status, outcome.manifest_path);

    let value = file_swap::with_temporary_content(&options.manifest_path, &content, || {
        operation(&outcome)
    })?;
    Ok((outcome, value))
}
