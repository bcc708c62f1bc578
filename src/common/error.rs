use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::process::CommandExecutorError;

#[derive(Error, Debug)]
pub enum ReposyncError {
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Tool unavailable: {message}")]
    ToolUnavailable { message: String, executable: String },

    #[error("Network operation failed: {message}")]
    NetworkError {
        message: String,
        url: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Reference '{reference}' moved while fetching: {message}")]
    RaceCondition { message: String, reference: String },

    #[error("{message}")]
    AmbiguousReference { message: String, reference: String },

    #[error("Incompatible options: {message}")]
    IncompatibleOptions { message: String },

    #[error("Command execution failed: {command}, exit code: {exit_code}, stderr: {stderr}")]
    CommandError {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ReposyncError {
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn tool_unavailable(message: impl Into<String>, executable: impl Into<String>) -> Self {
        Self::ToolUnavailable {
            message: message.into(),
            executable: executable.into(),
        }
    }

    pub fn network_error(message: impl Into<String>, url: Option<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            url,
            source: None,
        }
    }

    pub fn network_error_with_source(
        message: impl Into<String>,
        url: Option<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::NetworkError {
            message: message.into(),
            url,
            source: Some(source),
        }
    }

    pub fn race_condition(message: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::RaceCondition {
            message: message.into(),
            reference: reference.into(),
        }
    }

    pub fn ambiguous_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self::AmbiguousReference {
            message: format!(
                "A branch or tag with the name '{}' could not be found",
                reference
            ),
            reference,
        }
    }

    pub fn incompatible_options(message: impl Into<String>) -> Self {
        Self::IncompatibleOptions {
            message: message.into(),
        }
    }

    pub fn command_error(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandError {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether a caller may reasonably try the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::CommandError { .. } | Self::RaceCondition { .. }
        )
    }
}

impl From<std::io::Error> for ReposyncError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for ReposyncError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization_error_with_source("YAML serialization failed", error)
    }
}

impl From<serde_json::Error> for ReposyncError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON serialization failed", error)
    }
}

impl From<reqwest::Error> for ReposyncError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string());
        Self::network_error_with_source("Network request failed", url, error)
    }
}

impl From<validator::ValidationErrors> for ReposyncError {
    fn from(error: validator::ValidationErrors) -> Self {
        Self::config_error_with_source("Settings validation failed", error)
    }
}

impl From<CommandExecutorError> for ReposyncError {
    fn from(error: CommandExecutorError) -> Self {
        match error {
            CommandExecutorError::NotFound { program } => Self::tool_unavailable(
                format!("Unable to locate executable file: {}", program),
                program,
            ),
            other => Self::internal_error_with_source("Process execution failed", other),
        }
    }
}
