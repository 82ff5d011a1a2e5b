//! Single and batch renames.

use std::path::{Path, PathBuf};

use rewind_core::{ApplyOutcome, Direction, InvariantViolation, UndoStrings, plural};
use rewind_rename::sort_for_rename;
use serde::{Deserialize, Serialize};

use super::{ApplyContext, base_name, full_name};
use crate::service::{FileOperationsService, wait};

/// One item renamed within its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOperation {
    old_path: PathBuf,
    new_path: PathBuf,
    old_name: String,
    new_name: String,
}

impl RenameOperation {
    /// Record renaming `old_path` to `new_name` in the same directory.
    pub fn new(old_path: impl Into<PathBuf>, new_name: impl Into<String>) -> Self {
        let old_path = old_path.into();
        let new_name = new_name.into();
        let new_path = old_path.with_file_name(&new_name);

        Self {
            old_name: base_name(&old_path),
            old_path,
            new_path,
            new_name,
        }
    }

    pub fn old_path(&self) -> &Path {
        &self.old_path
    }

    pub fn new_path(&self) -> &Path {
        &self.new_path
    }

    pub fn strings(&self) -> UndoStrings {
        let old = full_name(&self.old_path);
        let new = full_name(&self.new_path);

        UndoStrings::new(
            "Undo Rename",
            format!("Rename “{}” as “{}”", new, old),
            "Redo Rename",
            format!("Rename “{}” as “{}”", old, new),
        )
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let (from, name) = match direction {
            Direction::Redo => (self.old_path.clone(), self.new_name.clone()),
            Direction::Undo => (self.new_path.clone(), self.old_name.clone()),
        };

        match wait(ctx.service.rename(from, name), &ctx.cancel).await {
            Ok(renamed) => {
                match direction {
                    Direction::Redo => self.new_path = renamed,
                    Direction::Undo => self.old_path = renamed,
                }
                ApplyOutcome::Success
            }
            Err(e) => ctx.failure(e),
        }
    }
}

/// One file of a batch rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRenameEntry {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub old_name: String,
    pub new_name: String,
}

impl BatchRenameEntry {
    pub fn new(old_path: impl Into<PathBuf>, new_name: impl Into<String>) -> Self {
        let old_path = old_path.into();
        let new_name = new_name.into();

        Self {
            new_path: old_path.with_file_name(&new_name),
            old_name: base_name(&old_path),
            old_path,
            new_name,
        }
    }
}

/// Many files renamed at once.
///
/// Entries carry both names and both paths of a file together, so
/// reordering the batch before each replay keeps them aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRenameOperation {
    entries: Vec<BatchRenameEntry>,
}

impl BatchRenameOperation {
    pub fn new(entries: Vec<BatchRenameEntry>) -> Self {
        Self { entries }
    }

    /// Record a batch from the parallel lists a batch rename runs on.
    pub fn from_lists(old_paths: Vec<PathBuf>, new_names: Vec<String>) -> Result<Self, InvariantViolation> {
        if old_paths.len() != new_names.len() {
            return Err(InvariantViolation::LengthMismatch {
                what: "batch rename lists",
                left: old_paths.len(),
                right: new_names.len(),
            });
        }

        Ok(Self::new(
            old_paths
                .into_iter()
                .zip(new_names)
                .map(|(path, name)| BatchRenameEntry::new(path, name))
                .collect(),
        ))
    }

    pub fn entries(&self) -> &[BatchRenameEntry] {
        &self.entries
    }

    pub fn strings(&self) -> UndoStrings {
        let count = self.entries.len();
        let description = format!("Batch rename {} {}", count, plural(count, "file", "files"));

        UndoStrings::new("Undo Batch Rename", description.clone(), "Redo Batch Rename", description)
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let ordered = match direction {
            Direction::Redo => sort_for_rename(&mut self.entries, |e| e.old_path.clone(), |e| e.new_path.clone()),
            Direction::Undo => sort_for_rename(&mut self.entries, |e| e.new_path.clone(), |e| e.old_path.clone()),
        };
        if let Err(e) = ordered {
            tracing::warn!(target: "rename", error = %e, "cannot order batch rename");
            return ApplyOutcome::Failed(e.to_string());
        }

        let (paths, names): (Vec<PathBuf>, Vec<String>) = self
            .entries
            .iter()
            .map(|e| match direction {
                Direction::Redo => (e.old_path.clone(), e.new_name.clone()),
                Direction::Undo => (e.new_path.clone(), e.old_name.clone()),
            })
            .unzip();

        let request = ctx.service.batch_rename(paths, names, ctx.cancel.clone());
        match wait(request, &ctx.cancel).await {
            Ok(renamed) => {
                for (entry, path) in self.entries.iter_mut().zip(renamed) {
                    match direction {
                        Direction::Redo => entry.new_path = path,
                        Direction::Undo => entry.old_path = path,
                    }
                }
                ApplyOutcome::Success
            }
            Err(e) => ctx.failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_paths() {
        let op = RenameOperation::new("/d/a.txt", "b.txt");
        assert_eq!(op.new_path(), Path::new("/d/b.txt"));

        let strings = op.strings();
        assert_eq!(strings.undo_description, "Rename “/d/b.txt” as “/d/a.txt”");
        assert_eq!(strings.redo_description, "Rename “/d/a.txt” as “/d/b.txt”");
    }

    #[test]
    fn test_batch_strings() {
        let one = BatchRenameOperation::from_lists(vec!["/d/a".into()], vec!["b".into()]).unwrap();
        assert_eq!(one.strings().undo_description, "Batch rename 1 file");

        let two = BatchRenameOperation::from_lists(vec!["/d/a".into(), "/d/b".into()], vec!["b".into(), "c".into()])
            .unwrap();
        assert_eq!(two.strings().redo_description, "Batch rename 2 files");
        assert_eq!(two.strings().redo_label, "Redo Batch Rename");
    }

    #[test]
    fn test_batch_lists_must_align() {
        let result = BatchRenameOperation::from_lists(vec!["/d/a".into()], vec![]);
        assert!(matches!(result, Err(InvariantViolation::LengthMismatch { left: 1, right: 0, .. })));
    }
}
