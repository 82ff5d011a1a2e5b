//! Items moved to the trash.

use std::path::PathBuf;

use indexmap::IndexMap;
use rewind_core::{ApplyOutcome, Direction, UndoStrings};
use serde::{Deserialize, Serialize};

use super::{ApplyContext, base_name, full_name};
use crate::service::{FileOperationsService, wait};

/// Items trashed together, with the time each was trashed.
///
/// The trash itself is not recorded: undo scans it again every time and
/// matches items by original path and deletion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashOperation {
    trashed: IndexMap<PathBuf, i64>,
}

impl TrashOperation {
    pub fn new(trashed: impl IntoIterator<Item = (PathBuf, i64)>) -> Self {
        Self {
            trashed: trashed.into_iter().collect(),
        }
    }

    /// Record paths that were trashed just now.
    pub fn now(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self::new(paths.into_iter().map(|p| (p, now)))
    }

    /// Add one trashed path.
    pub fn insert(&mut self, path: PathBuf, deleted_at: i64) {
        self.trashed.insert(path, deleted_at);
    }

    pub fn trashed(&self) -> &IndexMap<PathBuf, i64> {
        &self.trashed
    }

    pub fn strings(&self) -> UndoStrings {
        let count = self.trashed.len();

        let (undo_description, redo_description) = match self.trashed.first() {
            Some((path, _)) if count == 1 => (
                format!("Restore “{}” to “{}”", base_name(path), full_name(path)),
                format!("Move “{}” to trash", full_name(path)),
            ),
            _ => (
                format!("Restore {} items from trash", count),
                format!("Move {} items to trash", count),
            ),
        };

        UndoStrings::new("Undo Trash", undo_description, "Redo Trash", redo_description)
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        match direction {
            Direction::Redo => self.redo(ctx).await,
            Direction::Undo => self.undo(ctx).await,
        }
    }

    async fn redo<S>(&mut self, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let paths: Vec<PathBuf> = self.trashed.keys().cloned().collect();
        let request = ctx.service.trash_or_delete(paths, ctx.cancel.clone());

        match wait(request, &ctx.cancel).await {
            Ok(()) => {
                let now = chrono::Utc::now().timestamp();
                for deleted_at in self.trashed.values_mut() {
                    *deleted_at = now;
                }
                ApplyOutcome::Success
            }
            Err(e) => ctx.failure(e),
        }
    }

    async fn undo<S>(&mut self, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let matched = match ctx.trash_resolver.resolve(ctx.service, &self.trashed, &ctx.cancel).await {
            Ok(matched) => matched,
            Err(e) => return ctx.failure(e),
        };

        if matched.is_empty() {
            tracing::warn!(
                target: "trash",
                wanted = self.trashed.len(),
                epsilon = ctx.trash_resolver.epsilon(),
                "no trashed items found to restore"
            );
            return ApplyOutcome::Failed("Could not find the trashed items to restore".into());
        }

        for (item, original) in matched {
            let request = ctx.service.move_raw(item, original.clone());
            if let Err(e) = wait(request, &ctx.cancel).await {
                tracing::warn!(target: "trash", path = %original.display(), "restore stopped");
                return ctx.failure(e);
            }
            tracing::debug!(target: "trash", path = %original.display(), "restored");
        }

        ApplyOutcome::Success
    }
}
