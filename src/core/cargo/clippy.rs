use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::command::{self, CapturedOutput};

/// What `cargo clippy --fix` may touch besides a clean worktree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowMode {
    Staged,
    Dirty,
}

impl FromStr for AllowMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "staged" => Ok(AllowMode::Staged),
            "dirty" => Ok(AllowMode::Dirty),
            other => Err(Error::validation_invalid_argument(
                "allow",
                format!("invalid allow: {:?}", other),
                Some(other.to_string()),
                Some(vec!["staged".to_string(), "dirty".to_string()]),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippyOptions {
    pub fix: bool,
    pub allow: Option<AllowMode>,
}

impl Default for ClippyOptions {
    fn default() -> Self {
        Self {
            fix: false,
            allow: Some(AllowMode::Staged),
        }
    }
}

impl ClippyOptions {
    /// Arguments passed to `cargo`.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["clippy", "--all-features", "--tests"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        if self.fix {
            args.push("--fix".to_string());
            match self.allow {
                Some(AllowMode::Staged) => args.push("--allow-staged".to_string()),
                Some(AllowMode::Dirty) => {
                    args.push("--allow-dirty".to_string());
                    args.push("--allow-staged".to_string());
                }
                None => {}
            }
        }

        args.extend(["--", "-D", "warnings"].iter().map(|s| s.to_string()));
        args
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClippyOutcome {
    pub command: String,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

pub fn run_clippy(project_dir: &Path, options: &ClippyOptions) -> Result<ClippyOutcome> {
    let args = options.args();
    let output = command::run_in(project_dir, "cargo", &args, None, None)?;
    Ok(ClippyOutcome {
        command: command::display_command("cargo", &args),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lint_only_command() {
        let options = ClippyOptions::default();
        assert_eq!(
            options.args(),
            vec!["clippy", "--all-features", "--tests", "--", "-D", "warnings"]
        );
    }

    #[test]
    fn fix_with_staged_allowance() {
        let options = ClippyOptions {
            fix: true,
            allow: Some(AllowMode::Staged),
        };
        assert_eq!(
            options.args(),
            vec!["clippy", "--all-features", "--tests", "--fix", "--allow-staged", "--", "-D", "warnings"]
        );
    }

    #[test]
    fn fix_with_dirty_allows_staged_too() {
        let options = ClippyOptions {
            fix: true,
            allow: Some(AllowMode::Dirty),
        };
        let args = options.args();
        assert!(args.contains(&"--allow-dirty".to_string()));
        assert!(args.contains(&"--allow-staged".to_string()));
    }

    #[test]
    fn fix_without_allowance() {
        let options = ClippyOptions {
            fix: true,
            allow: None,
        };
        assert!(!options.args().iter().any(|a| a.starts_with("--allow")));
    }

    #[test]
    fn unknown_allow_mode_is_rejected() {
        let err = "everything".parse::<AllowMode>().unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert!(err.details["problem"].as_str().unwrap().contains("invalid allow"));
    }
}
