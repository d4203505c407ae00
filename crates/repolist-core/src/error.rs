//! Error types for listing operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while opening, walking, or listing a repository.
#[derive(Debug, Error)]
pub enum ListError {
    /// A requested sub-path resolved to nothing.
    #[error(
        "The path '{path}' does not exist in the target repository '{repo}' {}",
        if *.dvc_only { "as an output" } else { "neither as an output nor as a tracked file" }
    )]
    PathNotFound {
        path: String,
        repo: String,
        dvc_only: bool,
    },

    /// The repository handle could not be opened or resolved.
    #[error("Failed to open repository '{url}': {reason}")]
    RepositoryOpen { url: String, reason: String },

    /// A directory operation was attempted on a file.
    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An output declaration file could not be understood.
    #[error("Invalid output declaration {path}: {reason}")]
    InvalidOutputFile { path: String, reason: String },

    /// Error raised by the git object store.
    #[error("Git error: {message}")]
    Git { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Rendered output could not be serialized.
    #[error("Failed to serialize output: {message}")]
    Serialization { message: String },
}

impl ListError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a repository open failure.
    pub fn open(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::RepositoryOpen {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a serialization failure.
    pub fn serialization(reason: impl ToString) -> Self {
        Self::Serialization {
            message: reason.to_string(),
        }
    }

    /// Check if this error reports a file where a directory was expected.
    pub fn is_not_a_directory(&self) -> bool {
        matches!(self, Self::NotADirectory { .. })
    }
}

/// Kind of walk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// The backend could not determine a size; zero was substituted.
    MissingSize,
}

/// Non-fatal diagnostic recorded during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Repository-relative path where the warning occurred.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a missing size warning.
    pub fn missing_size(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("None size detected in {path}"),
            path,
            kind: WarningKind::MissingSize,
        }
    }
}
