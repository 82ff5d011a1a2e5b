//! Operation kinds, apply directions and outcomes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The kind of reversible filesystem mutation an operation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum OperationKind {
    Move,
    Copy,
    Duplicate,
    #[strum(to_string = "Create link")]
    CreateLink,
    #[strum(to_string = "Restore from trash")]
    RestoreFromTrash,
    #[strum(to_string = "Move to trash")]
    MoveToTrash,
    Rename,
    #[strum(to_string = "Batch rename")]
    BatchRename,
    #[strum(to_string = "Create empty file")]
    CreateEmptyFile,
    #[strum(to_string = "Create folder")]
    CreateFolder,
    #[strum(to_string = "Create from template")]
    CreateFromTemplate,
    #[strum(to_string = "Set permissions")]
    SetPermissions,
    #[strum(to_string = "Set permissions recursively")]
    RecursiveSetPermissions,
    #[strum(to_string = "Change owner")]
    ChangeOwner,
    #[strum(to_string = "Change group")]
    ChangeGroup,
    Extract,
    Compress,
}

/// Which way an operation is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Direction {
    #[strum(to_string = "undo")]
    Undo,
    #[strum(to_string = "redo")]
    Redo,
}

impl Direction {
    /// The direction that becomes available after a successful apply.
    pub fn opposite(self) -> Self {
        match self {
            Self::Undo => Self::Redo,
            Self::Redo => Self::Undo,
        }
    }
}

/// Terminal result of one undo or redo attempt.
///
/// None of these are retried by the engine; retrying is a new, user
/// initiated apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// The operation was fully applied.
    Success,
    /// The user interrupted the operation.
    UserCancelled,
    /// The service reported a failure.
    Failed(String),
}

impl ApplyOutcome {
    /// Check if the apply succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the failure reason, if any.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Done"),
            Self::UserCancelled => write!(f, "Cancelled"),
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Undo.opposite(), Direction::Redo);
        assert_eq!(Direction::Redo.opposite(), Direction::Undo);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OperationKind::MoveToTrash.to_string(), "Move to trash");
        assert_eq!(OperationKind::Move.to_string(), "Move");
    }
}
