//! Moves, copies, duplicates, links and restores from the trash.

use std::path::PathBuf;

use rewind_core::{ApplyOutcome, Direction, OperationKind, ServiceError, UndoStrings};
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;

use super::{ApplyContext, base_name, full_name};
use crate::report::{TransferPair, TransferReport};
use crate::service::{Completion, FileOperationsService, settle, wait};

/// Which transfer an operation recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum TransferKind {
    Move,
    Copy,
    Duplicate,
    Link,
    #[strum(to_string = "Restore from trash")]
    RestoreFromTrash,
}

impl From<TransferKind> for OperationKind {
    fn from(kind: TransferKind) -> Self {
        match kind {
            TransferKind::Move => Self::Move,
            TransferKind::Copy => Self::Copy,
            TransferKind::Duplicate => Self::Duplicate,
            TransferKind::Link => Self::CreateLink,
            TransferKind::RestoreFromTrash => Self::RestoreFromTrash,
        }
    }
}

/// Items taken from one directory into another.
///
/// Each [`TransferPair`] ties an item's origin to where it landed, so undo
/// handles every item by its own target without reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    kind: TransferKind,
    item_count: usize,
    source_dir: PathBuf,
    destination_dir: PathBuf,
    pairs: Vec<TransferPair>,
}

impl TransferOperation {
    pub fn new(
        kind: TransferKind,
        source_dir: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        pairs: Vec<TransferPair>,
    ) -> Self {
        Self {
            kind,
            item_count: pairs.len(),
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            pairs,
        }
    }

    /// Record a finished transfer from its report.
    pub fn from_report(
        kind: TransferKind,
        source_dir: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        report: &TransferReport,
    ) -> Self {
        Self::new(kind, source_dir, destination_dir, report.completed.clone())
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn source_dir(&self) -> &PathBuf {
        &self.source_dir
    }

    pub fn destination_dir(&self) -> &PathBuf {
        &self.destination_dir
    }

    pub fn pairs(&self) -> &[TransferPair] {
        &self.pairs
    }

    fn origins(&self) -> Vec<PathBuf> {
        self.pairs.iter().map(|p| p.origin.clone()).collect()
    }

    fn targets(&self) -> Vec<PathBuf> {
        self.pairs.iter().map(|p| p.target.clone()).collect()
    }

    /// Point every pair the report mentions at its new target.
    fn refresh_targets(&mut self, report: &TransferReport) {
        for done in &report.completed {
            if let Some(pair) = self.pairs.iter_mut().find(|p| p.origin == done.origin) {
                pair.target = done.target.clone();
            }
        }
    }

    fn first_name(&self) -> String {
        self.pairs
            .first()
            .map(|p| base_name(&p.target))
            .unwrap_or_default()
    }

    pub fn strings(&self) -> UndoStrings {
        let count = self.item_count;
        let source = full_name(&self.source_dir);
        let destination = full_name(&self.destination_dir);
        let name = self.first_name();
        let many = count > 1;

        match self.kind {
            TransferKind::Move if many => UndoStrings::new(
                format!("Undo Move {} items", count),
                format!("Move {} items back to “{}”", count, source),
                format!("Redo Move {} items", count),
                format!("Move {} items to “{}”", count, destination),
            ),
            TransferKind::Move => UndoStrings::new(
                "Undo Move",
                format!("Move “{}” back to “{}”", name, source),
                "Redo Move",
                format!("Move “{}” to “{}”", name, destination),
            ),
            TransferKind::RestoreFromTrash if many => UndoStrings::new(
                "Undo Restore from Trash",
                format!("Move {} items back to trash", count),
                "Redo Restore from Trash",
                format!("Restore {} items from trash", count),
            ),
            TransferKind::RestoreFromTrash => UndoStrings::new(
                "Undo Restore from Trash",
                format!("Move “{}” back to trash", name),
                "Redo Restore from Trash",
                format!("Restore “{}” from trash", name),
            ),
            TransferKind::Copy if many => UndoStrings::new(
                format!("Undo Copy {} items", count),
                format!("Delete {} copied items", count),
                format!("Redo Copy {} items", count),
                format!("Copy {} items to “{}”", count, destination),
            ),
            TransferKind::Copy => UndoStrings::new(
                "Undo Copy",
                format!("Delete “{}”", name),
                "Redo Copy",
                format!("Copy “{}” to “{}”", name, destination),
            ),
            TransferKind::Duplicate if many => UndoStrings::new(
                format!("Undo Duplicate {} items", count),
                format!("Delete {} duplicated items", count),
                format!("Redo Duplicate {} items", count),
                format!("Duplicate {} items in “{}”", count, destination),
            ),
            TransferKind::Duplicate => UndoStrings::new(
                "Undo Duplicate",
                format!("Delete “{}”", name),
                "Redo Duplicate",
                format!("Duplicate “{}” in “{}”", name, destination),
            ),
            TransferKind::Link if many => UndoStrings::new(
                "Undo Create Links",
                format!("Delete links to {} items", count),
                "Redo Create Links",
                format!("Create links to {} items", count),
            ),
            TransferKind::Link => UndoStrings::new(
                "Undo Create Link",
                format!("Delete link to “{}”", name),
                "Redo Create Link",
                format!("Create link to “{}”", name),
            ),
        }
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
        let service = ctx.service;
        let cancel = ctx.cancel.clone();
        let origins = self.origins();
        let destination = self.destination_dir.clone();

        let request = match self.kind {
            TransferKind::Move | TransferKind::RestoreFromTrash => service.move_items(origins, destination, cancel),
            TransferKind::Copy => service.copy_items(origins, destination, cancel),
            TransferKind::Duplicate => service.duplicate(origins, cancel),
            TransferKind::Link => service.link(origins, destination, cancel),
        };

        match settle(request).await {
            Ok(report) => {
                self.refresh_targets(&report);
                if report.cancelled {
                    return self.revert(Direction::Redo, &report.completed, ctx).await;
                }
                report_outcome(&report)
            }
            Err(e) => ctx.failure(e),
        }
    }

    async fn undo<S>(&mut self, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let service = ctx.service;
        let cancel = ctx.cancel.clone();

        match self.kind {
            TransferKind::Move => {
                let request = service.move_items(self.targets(), self.source_dir.clone(), cancel);
                match settle(request).await {
                    Ok(report) if report.cancelled => self.revert(Direction::Undo, &report.completed, ctx).await,
                    Ok(report) => report_outcome(&report),
                    Err(e) => ctx.failure(e),
                }
            }
            TransferKind::RestoreFromTrash => {
                let result = wait(service.trash_or_delete(self.targets(), cancel), &ctx.cancel).await;
                ctx.outcome(result)
            }
            TransferKind::Copy | TransferKind::Duplicate | TransferKind::Link => {
                // Newest first, so nested copies go before their parents
                let mut targets = self.targets();
                targets.reverse();
                let result = wait(service.delete(targets, cancel), &ctx.cancel).await;
                ctx.outcome(result)
            }
        }
    }

    /// Take back the items a cancelled apply already transferred, so the
    /// record still describes what is on disk.
    async fn revert<S>(
        &self,
        direction: Direction,
        completed: &[TransferPair],
        ctx: &ApplyContext<'_, S>,
    ) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        if completed.is_empty() {
            return ApplyOutcome::UserCancelled;
        }

        let service = ctx.service;
        // The apply's own token is already cancelled
        let cancel = CancellationToken::new();
        let mut targets: Vec<PathBuf> = completed.iter().map(|p| p.target.clone()).collect();

        let result = match (direction, self.kind) {
            (Direction::Undo, _) => {
                moved_back(service.move_items(targets, self.destination_dir.clone(), cancel)).await
            }
            (Direction::Redo, TransferKind::Move) => {
                moved_back(service.move_items(targets, self.source_dir.clone(), cancel)).await
            }
            (Direction::Redo, TransferKind::RestoreFromTrash) => settle(service.trash_or_delete(targets, cancel)).await,
            (Direction::Redo, TransferKind::Copy | TransferKind::Duplicate | TransferKind::Link) => {
                targets.reverse();
                settle(service.delete(targets, cancel)).await
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(target: "undo", %direction, reverted = completed.len(), "cancelled transfer reverted");
                ApplyOutcome::UserCancelled
            }
            Err(e) => {
                tracing::warn!(target: "undo", %direction, error = %e, "could not revert cancelled transfer");
                ApplyOutcome::Failed(format!("Cancelled, but could not revert the transferred items: {}", e))
            }
        }
    }
}

async fn moved_back(request: Completion<TransferReport>) -> Result<(), ServiceError> {
    let report = settle(request).await?;
    if report.has_errors() {
        Err(ServiceError::other(report.error_summary()))
    } else {
        Ok(())
    }
}

fn report_outcome(report: &TransferReport) -> ApplyOutcome {
    if report.has_errors() {
        tracing::warn!(
            target: "undo",
            completed = report.completed.len(),
            failed = report.errors.len(),
            "transfer partially failed"
        );
        ApplyOutcome::Failed(report.error_summary())
    } else {
        ApplyOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(count: usize) -> TransferOperation {
        let pairs = (0..count)
            .map(|i| TransferPair::new(format!("/src/f{}", i), format!("/dst/f{}", i)))
            .collect();
        TransferOperation::new(TransferKind::Move, "/src", "/dst", pairs)
    }

    #[test]
    fn test_move_strings_singular() {
        let strings = moved(1).strings();
        assert_eq!(strings.undo_label, "Undo Move");
        assert_eq!(strings.undo_description, "Move “f0” back to “/src”");
        assert_eq!(strings.redo_description, "Move “f0” to “/dst”");
    }

    #[test]
    fn test_move_strings_plural() {
        let strings = moved(5).strings();
        assert_eq!(strings.undo_label, "Undo Move 5 items");
        assert_eq!(strings.redo_label, "Redo Move 5 items");
        assert_eq!(strings.undo_description, "Move 5 items back to “/src”");
        assert_eq!(strings.redo_description, "Move 5 items to “/dst”");
    }

    #[test]
    fn test_copy_and_link_strings() {
        let pairs = vec![TransferPair::new("/src/a.txt", "/dst/a.txt")];
        let copy = TransferOperation::new(TransferKind::Copy, "/src", "/dst", pairs.clone());
        assert_eq!(copy.strings().undo_description, "Delete “a.txt”");
        assert_eq!(copy.strings().redo_description, "Copy “a.txt” to “/dst”");

        let link = TransferOperation::new(TransferKind::Link, "/src", "/dst", pairs);
        assert_eq!(link.strings().redo_label, "Redo Create Link");
        assert_eq!(link.strings().undo_description, "Delete link to “a.txt”");
    }

    #[test]
    fn test_refresh_targets_by_origin() {
        let mut op = TransferOperation::new(
            TransferKind::Duplicate,
            "/d",
            "/d",
            vec![TransferPair::new("/d/a", "/d/a (1)"), TransferPair::new("/d/b", "/d/b (1)")],
        );

        let mut report = TransferReport::new();
        report.push("/d/b".into(), "/d/b (2)".into());
        op.refresh_targets(&report);

        assert_eq!(op.pairs()[0].target, PathBuf::from("/d/a (1)"));
        assert_eq!(op.pairs()[1].target, PathBuf::from("/d/b (2)"));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(OperationKind::from(TransferKind::Link), OperationKind::CreateLink);
        assert_eq!(
            OperationKind::from(TransferKind::RestoreFromTrash),
            OperationKind::RestoreFromTrash
        );
    }
}
