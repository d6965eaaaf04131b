use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    ManifestInvalidToml,
    ManifestMissingField,
    ManifestInvalidShape,
    ManifestInvalid,

    RegistryNotFound,
    BuildSystemNotFound,

    CommandFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ManifestInvalidToml => "manifest.invalid_toml",
            ErrorCode::ManifestMissingField => "manifest.missing_field",
            ErrorCode::ManifestInvalidShape => "manifest.invalid_shape",
            ErrorCode::ManifestInvalid => "manifest.invalid",

            ErrorCode::RegistryNotFound => "registry.not_found",
            ErrorCode::BuildSystemNotFound => "build_system.not_found",

            ErrorCode::CommandFailed => "command.failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFieldDetails {
    /// Dotted key of the offending field, e.g. `workspace.package.version`.
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            details,
        )
    }

    pub fn manifest_invalid_toml(path: impl Into<String>, err: toml::de::Error) -> Self {
        let path = path.into();
        let details = serde_json::json!({
            "path": path,
            "error": err.to_string(),
        });

        Self::new(
            ErrorCode::ManifestInvalidToml,
            format!("Could not decode TOML in {}", path),
            details,
        )
    }

    /// A recognized section lacks a mandatory key.
    pub fn manifest_missing_field(field: impl Into<String>, path: Option<String>) -> Self {
        let field = field.into();
        let details = to_details(ManifestFieldDetails {
            field: field.clone(),
            path,
            problem: None,
        });

        Self::new(
            ErrorCode::ManifestMissingField,
            format!("Manifest is missing required field `{}`", field),
            details,
        )
    }

    /// A recognized key carries a value of the wrong type or layout.
    pub fn manifest_invalid_shape(
        field: impl Into<String>,
        problem: impl Into<String>,
        path: Option<String>,
    ) -> Self {
        let field = field.into();
        let problem = problem.into();
        let details = to_details(ManifestFieldDetails {
            field: field.clone(),
            path,
            problem: Some(problem.clone()),
        });

        Self::new(
            ErrorCode::ManifestInvalidShape,
            format!("Invalid manifest field `{}`: {}", field, problem),
            details,
        )
    }

    pub fn manifest_invalid(path: impl Into<String>, problem: impl Into<String>) -> Self {
        let details = serde_json::json!({
            "path": path.into(),
            "problem": problem.into(),
        });

        Self::new(ErrorCode::ManifestInvalid, "Invalid Cargo manifest", details)
    }

    pub fn registry_not_found(id: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::RegistryNotFound, "Cargo registry not found", id)
            .with_hint("Declare the registry under `cargo.registries` in stdtasks.json")
    }

    pub fn build_system_not_found(project_dir: impl Into<String>) -> Self {
        Self::not_found(
            ErrorCode::BuildSystemNotFound,
            "No supported Python build system detected",
            project_dir,
        )
        .with_hint("Add a [tool.slap] section to pyproject.toml")
    }

    fn not_found(code: ErrorCode, message: &str, id: impl Into<String>) -> Self {
        Self::new(code, message, to_details(NotFoundDetails { id: id.into() }))
    }

    pub fn command_failed(details: CommandFailedDetails) -> Self {
        let message = format!("Command failed: {}", details.command);
        Self::new(ErrorCode::CommandFailed, message, to_details(details))
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
