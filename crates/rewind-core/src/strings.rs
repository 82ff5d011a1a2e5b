//! Human-readable labels for undo and redo actions.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Labels and descriptions for both directions of an operation.
///
/// Labels are short (menu items); descriptions are longer (tooltips).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoStrings {
    pub undo_label: String,
    pub undo_description: String,
    pub redo_label: String,
    pub redo_description: String,
}

impl UndoStrings {
    /// Create a new set of strings.
    pub fn new(
        undo_label: impl Into<String>,
        undo_description: impl Into<String>,
        redo_label: impl Into<String>,
        redo_description: impl Into<String>,
    ) -> Self {
        Self {
            undo_label: undo_label.into(),
            undo_description: undo_description.into(),
            redo_label: redo_label.into(),
            redo_description: redo_description.into(),
        }
    }

    /// Generic strings used when no operation is available.
    pub fn generic() -> Self {
        Self::new("Undo", "Undo last action", "Redo", "Redo last undone action")
    }

    /// Consume into the `(label, description)` pair for a direction.
    pub fn into_direction(self, direction: Direction) -> (String, String) {
        match direction {
            Direction::Undo => (self.undo_label, self.undo_description),
            Direction::Redo => (self.redo_label, self.redo_description),
        }
    }
}

impl Default for UndoStrings {
    fn default() -> Self {
        Self::generic()
    }
}

/// Pick singular or plural phrasing for a count.
pub fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}
