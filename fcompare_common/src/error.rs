use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FcompareError {
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Is a directory: {}", path.display())]
    IsADirectory { path: PathBuf },

    #[error("Not a regular file: {}", path.display())]
    NotARegularFile { path: PathBuf },

    #[error("Permission denied while {operation} {}", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("IO error while {operation} {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, FcompareError>;

/// Flat classification of [`FcompareError`], carried by per-axis failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    IsADirectory,
    NotARegularFile,
    PermissionDenied,
    Io,
    Config,
    Serialization,
}

impl FcompareError {
    /// Classify an `io::Error` raised while performing `operation` on `path`.
    pub fn from_io(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => FcompareError::NotFound { path },
            io::ErrorKind::PermissionDenied => FcompareError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            _ => FcompareError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FcompareError::NotFound { .. } => ErrorKind::NotFound,
            FcompareError::IsADirectory { .. } => ErrorKind::IsADirectory,
            FcompareError::NotARegularFile { .. } => ErrorKind::NotARegularFile,
            FcompareError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            FcompareError::Io { .. } => ErrorKind::Io,
            FcompareError::Config(_) => ErrorKind::Config,
            FcompareError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}
