use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfigError {
    #[error("Invalid key for {container}: {key}")]
    InvalidKey { container: String, key: String },

    #[error("Invalid value for {path}: {value} ({reason})")]
    InvalidValue {
        path: String,
        value: String,
        reason: String,
    },

    #[error("Modifying {path} is not allowed")]
    ImmutableField { path: String },

    #[error("Invalid rule '{key}': {reason}")]
    RuleDefinition { key: String, reason: String },

    #[error("Deleting keys from {container} is not allowed")]
    DeleteNotAllowed { container: String },

    #[error("{path} is not a container")]
    NotAContainer { path: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to access {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No working directory configured and no platform default available")]
    NoWorkdir,

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),
}

impl ConfigError {
    pub(crate) fn invalid_value(
        path: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            path: path.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn rule(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::RuleDefinition {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
