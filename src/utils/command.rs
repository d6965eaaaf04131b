//! Command execution primitives with consistent error handling.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};

/// Captured output from command execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }

    fn from_output(output: &Output) -> Self {
        Self::new(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )
    }
}

/// Exit code plus captured streams of a finished command.
#[derive(Debug, Clone)]
pub struct Finished {
    pub exit_code: Option<i32>,
    pub output: CapturedOutput,
}

impl Finished {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Render a command line for logs and error details.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("{:?}", arg)
            } else {
                arg.clone()
            }
        }))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command in `dir` and report its exit code without judging it.
pub fn run_status(dir: &Path, program: &str, args: &[String], stdin: Option<&str>) -> Result<Finished> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });

    let context = display_command(program, args);
    let mut child = command.spawn().map_err(|e| {
        Error::internal_io(format!("Failed to run {}: {}", program, e), Some(context.clone()))
    })?;

    if let Some(input) = stdin {
        if let Some(mut handle) = child.stdin.take() {
            handle
                .write_all(input.as_bytes())
                .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (stdin)", context))))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| Error::internal_io(e.to_string(), Some(context)))?;

    Ok(Finished {
        exit_code: output.status.code(),
        output: CapturedOutput::from_output(&output),
    })
}

/// Run a command in `dir`; a non-zero exit becomes `command.failed`.
///
/// `shown_args` replaces `args` in logs and error details when the real
/// arguments carry secrets.
pub fn run_in(
    dir: &Path,
    program: &str,
    args: &[String],
    shown_args: Option<&[String]>,
    stdin: Option<&str>,
) -> Result<CapturedOutput> {
    let shown = display_command(program, shown_args.unwrap_or(args));
    log_status!("run", "{}", shown);

    let finished = run_status(dir, program, args, stdin)?;
    if !finished.success() {
        return Err(Error::command_failed(CommandFailedDetails {
            command: shown,
            exit_code: finished.exit_code,
            stdout: finished.output.stdout,
            stderr: finished.output.stderr,
            cwd: Some(dir.display().to_string()),
        }));
    }

    Ok(finished.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn run_in_captures_stdout() {
        let output = run_in(Path::new("."), "echo", &args(&["hello"]), None, None).unwrap();
        assert_eq!(output.stdout, "hello");
    }

    #[test]
    fn run_in_reports_command_failed_with_shown_args() {
        let err = run_in(
            Path::new("."),
            "sh",
            &args(&["-c", "exit 3", "secret"]),
            Some(&args(&["-c", "exit 3", "[MASKED]"])),
            None,
        )
        .unwrap_err();

        assert_eq!(err.code.as_str(), "command.failed");
        assert_eq!(err.details["exitCode"], 3);
        let command = err.details["command"].as_str().unwrap();
        assert!(command.contains("[MASKED]"));
        assert!(!command.contains("secret"));
    }

    #[test]
    fn run_status_feeds_stdin() {
        let finished = run_status(Path::new("."), "cat", &[], Some("piped")).unwrap();
        assert!(finished.success());
        assert_eq!(finished.output.stdout, "piped");
    }

    #[test]
    fn run_status_fails_for_missing_program() {
        let err = run_status(Path::new("."), "nonexistent_command_xyz", &[], None).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn display_command_quotes_whitespace() {
        assert_eq!(
            display_command("helm", &args(&["package", "my chart"])),
            "helm package \"my chart\""
        );
    }
}
