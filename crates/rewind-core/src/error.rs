//! Error types shared by the undo engine and the file operations service.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a file operations service.
///
/// These travel back through a request's completion channel. The undo
/// engine folds them into an [`ApplyOutcome`](crate::ApplyOutcome).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The operation was interrupted by the user.
    #[error("Operation cancelled")]
    Cancelled,

    /// The requested state already holds (e.g. target already mounted).
    #[error("Operation already in progress")]
    AlreadyInProgress,

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Something already exists at the destination.
    #[error("'{path}' already exists")]
    AlreadyExists { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service cannot perform this request on this platform or input.
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// The service dropped the request without answering.
    #[error("File operation service went away before completing")]
    Disconnected,

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ServiceError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a free-form error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Whether this error means the user cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Programmer errors: the caller broke a contract of the undo engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An apply was requested while another one is still in flight.
    #[error("An undo or redo is already in progress")]
    ApplyPending,

    /// There is no operation to undo (or redo).
    #[error("Nothing to {0}")]
    NothingToApply(crate::Direction),

    /// Parallel lists that must stay index-aligned have different lengths.
    #[error("Mismatched {what}: {left} vs {right} entries")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Extract undo was requested before any redo produced outputs.
    #[error("Cannot undo an extraction that produced no files")]
    ExtractNotApplied,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`UndoConfig`](crate::UndoConfig).
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value failed validation.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_io() {
        let err = ServiceError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));

        let err = ServiceError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists"),
        );
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let err = ServiceError::io("/test/path", std::io::Error::other("boom"));
        assert!(matches!(err, ServiceError::Io { .. }));
    }

    #[test]
    fn test_invariant_messages() {
        let err = InvariantViolation::NothingToApply(crate::Direction::Undo);
        assert_eq!(err.to_string(), "Nothing to undo");

        let err = InvariantViolation::LengthMismatch {
            what: "rename lists",
            left: 2,
            right: 3,
        };
        assert!(err.to_string().contains("2 vs 3"));
    }
}
