//! Helm chart packaging and publishing through the `helm` CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{command, io};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmAuth {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub insecure: bool,
}

/// The `helm` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmSettings {
    /// Registry credentials keyed by host (`host[:port]`).
    #[serde(default)]
    pub auth: BTreeMap<String, HelmAuth>,
}

impl HelmSettings {
    pub fn add_auth(
        &mut self,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> &mut Self {
        self.auth.insert(
            host.into(),
            HelmAuth {
                username: username.into(),
                password: password.into(),
                insecure,
            },
        );
        self
    }
}

/// The fields of `Chart.yaml` needed to name the package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
}

impl ChartMetadata {
    pub fn read(chart_dir: &Path) -> Result<Self> {
        let path = chart_dir.join("Chart.yaml");
        let content = io::read_file(&path, "read Chart.yaml")?;
        serde_yml::from_str(&content).map_err(|e| {
            Error::config_invalid_value(
                path.display().to_string(),
                None,
                format!("invalid Chart.yaml: {}", e),
            )
        })
    }

    pub fn tarball_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
    pub chart_name: String,
    pub chart_version: String,
    pub chart_tarball: PathBuf,
}

/// Run `helm package` and return where the tarball landed.
pub fn package_chart(chart_dir: &Path, output_dir: &Path) -> Result<PackageOutcome> {
    let chart = ChartMetadata::read(chart_dir)?;
    std::fs::create_dir_all(output_dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("create output dir".to_string())))?;

    let args = vec![
        "package".to_string(),
        chart_dir.display().to_string(),
        "--destination".to_string(),
        output_dir.display().to_string(),
    ];
    let output = command::run_in(Path::new("."), "helm", &args, None, None)?;

    let chart_tarball =
        saved_path(&output.stdout).unwrap_or_else(|| output_dir.join(chart.tarball_name()));

    Ok(PackageOutcome {
        chart_name: chart.name,
        chart_version: chart.version,
        chart_tarball,
    })
}

// helm prints "Successfully packaged chart and saved it to: <path>"
static SAVED_PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)saved it to:\s*(.+?)\s*$").unwrap());

fn saved_path(stdout: &str) -> Option<PathBuf> {
    SAVED_PATH_PATTERN
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| PathBuf::from(m.as_str()))
}

/// Host part of an `oci://host[:port]/path` reference.
pub fn oci_host(registry: &str) -> Option<&str> {
    let rest = registry.strip_prefix("oci://")?;
    let host = rest.split('/').next().unwrap_or(rest);
    (!host.is_empty()).then_some(host)
}

#[derive(Debug, Clone, Serialize)]
pub struct PushOutcome {
    pub chart_tarball: PathBuf,
    pub registry: String,
    pub logged_in: bool,
}

/// Log in to the registry when credentials are configured, then `helm push`.
pub fn push_chart(settings: &HelmSettings, chart_tarball: &Path, registry: &str) -> Result<PushOutcome> {
    if !chart_tarball.is_file() {
        return Err(Error::validation_invalid_argument(
            "chart_tarball",
            format!("Chart tarball not found: {}", chart_tarball.display()),
            Some(chart_tarball.display().to_string()),
            None,
        ));
    }

    let auth = oci_host(registry).and_then(|host| settings.auth.get(host).map(|auth| (host, auth)));

    if let Some((host, auth)) = auth {
        let mut args = vec![
            "registry".to_string(),
            "login".to_string(),
            host.to_string(),
            "--username".to_string(),
            auth.username.clone(),
            "--password-stdin".to_string(),
        ];
        if auth.insecure {
            args.push("--insecure".to_string());
        }
        command::run_in(Path::new("."), "helm", &args, None, Some(&auth.password))?;
    }

    let mut args = vec![
        "push".to_string(),
        chart_tarball.display().to_string(),
        registry.to_string(),
    ];
    if auth.is_some_and(|(_, auth)| auth.insecure) {
        args.push("--plain-http".to_string());
    }
    command::run_in(Path::new("."), "helm", &args, None, None)?;

    Ok(PushOutcome {
        chart_tarball: chart_tarball.to_path_buf(),
        registry: registry.to_string(),
        logged_in: auth.is_some(),
    })
}
