//! Error types for the merge pipeline.
//!
//! Each stage has its own error enum. [`MergeError`] wraps them and maps every
//! failure onto a stable process exit code so calling automation can branch
//! on the failure kind.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ValidationError;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when a service document cannot be loaded.
pub const EXIT_LOAD_FAILED: i32 = 1;
/// Exit code for unusable configuration.
pub const EXIT_CONFIG_INVALID: i32 = 2;
/// Exit code when the merged document fails validation.
pub const EXIT_VALIDATION_FAILED: i32 = 3;
/// Exit code when the output file's directory does not exist.
pub const EXIT_DESTINATION_MISSING: i32 = 4;
/// Exit code when writing the output file is not permitted.
pub const EXIT_PERMISSION_DENIED: i32 = 5;
/// Exit code for any other failure while writing the output file.
pub const EXIT_WRITE_FAILED: i32 = 6;

/// A service document could not be discovered, read, or parsed.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input directory could not be listed.
    #[error("failed to read input directory '{}': {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A document file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A document is not valid YAML or JSON.
    #[error("failed to parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A document parsed but its top-level sections have the wrong shape.
    #[error("malformed document '{}': {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Two files map to the same service identifier.
    #[error(
        "service '{service}' is defined by both '{}' and '{}'",
        .first.display(),
        .second.display()
    )]
    DuplicateService {
        service: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// The unified document could not be persisted.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("the directory for the output file '{}' does not exist", .path.display())]
    DestinationMissing { path: PathBuf },

    #[error("permission denied when writing to the output file '{}'", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("unexpected error when writing to the output file '{}': {message}", .path.display())]
    Other { path: PathBuf, message: String },
}

impl WriteError {
    /// Classifies an I/O failure on `path` by its kind.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => WriteError::DestinationMissing { path },
            io::ErrorKind::PermissionDenied => WriteError::PermissionDenied { path },
            _ => WriteError::Other {
                path,
                message: err.to_string(),
            },
        }
    }
}

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("an input directory is required (pass --input-directory or set input-directory in the config file)")]
    MissingInputDirectory,
}

/// Any fatal failure of a merge run.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl MergeError {
    /// Returns the stable exit code for this failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            MergeError::Config(_) => EXIT_CONFIG_INVALID,
            MergeError::Load(_) => EXIT_LOAD_FAILED,
            MergeError::Validation(_) => EXIT_VALIDATION_FAILED,
            MergeError::Write(WriteError::DestinationMissing { .. }) => EXIT_DESTINATION_MISSING,
            MergeError::Write(WriteError::PermissionDenied { .. }) => EXIT_PERMISSION_DENIED,
            MergeError::Write(WriteError::Other { .. }) => EXIT_WRITE_FAILED,
        }
    }
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;
