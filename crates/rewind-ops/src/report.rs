//! Results of multi-item file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An item that failed during a file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// One item of a transfer: where it came from and where it ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPair {
    pub origin: PathBuf,
    pub target: PathBuf,
}

impl TransferPair {
    pub fn new(origin: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
        }
    }
}

/// Outcome of a move, copy, duplicate or link request.
///
/// Items are reported individually so a partially failed or cancelled
/// transfer still tells the caller which items made it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Items transferred, in request order.
    pub completed: Vec<TransferPair>,
    /// Items that failed.
    pub errors: Vec<OperationError>,
    /// The transfer stopped early because it was cancelled.
    #[serde(default)]
    pub cancelled: bool,
}

impl TransferReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, origin: PathBuf, target: PathBuf) {
        self.completed.push(TransferPair { origin, target });
    }

    pub fn fail(&mut self, path: PathBuf, message: impl Into<String>) {
        self.errors.push(OperationError::new(path, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The destination of every completed item.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.completed.iter().map(|p| p.target.clone()).collect()
    }

    /// Every error joined into one message.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
