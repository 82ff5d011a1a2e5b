//! Undoable records of filesystem mutations.
//!
//! Every mutation the file manager performs is recorded as an
//! [`UndoableOperation`]. The record knows how to describe itself and how to
//! replay itself in either direction through a [`FileOperationsService`].
//! Replaying keeps the record current: a redo that produces new paths (a
//! copy landing under an auto-renamed name, say) updates the record so the
//! following undo removes the right items.

mod archive;
mod create;
mod ownership;
mod permissions;
mod rename;
mod transfer;
mod trash;

use std::path::Path;

use rewind_core::{ApplyOutcome, Direction, InvariantViolation, OperationKind, ServiceError, UndoStrings};
use tokio_util::sync::CancellationToken;

use crate::service::FileOperationsService;
use crate::trash_restore::TrashRestoreResolver;

pub use archive::{CompressOperation, ExtractOperation};
pub use create::{CreateKind, CreateOperation};
pub use ownership::{OwnershipKind, OwnershipOperation};
pub use permissions::{PermissionsOperation, RecursivePermissionsOperation};
pub use rename::{BatchRenameEntry, BatchRenameOperation, RenameOperation};
pub use transfer::{TransferKind, TransferOperation};
pub use trash::TrashOperation;

/// What an apply needs from its surroundings.
pub struct ApplyContext<'a, S: FileOperationsService + ?Sized> {
    /// Service that performs the filesystem work.
    pub service: &'a S,
    /// Cancelled when the user aborts the apply.
    pub cancel: CancellationToken,
    /// Finds trashed items again for trash undo.
    pub trash_resolver: TrashRestoreResolver,
}

impl<'a, S: FileOperationsService + ?Sized> ApplyContext<'a, S> {
    pub fn new(service: &'a S, cancel: CancellationToken) -> Self {
        Self {
            service,
            cancel,
            trash_resolver: TrashRestoreResolver::default(),
        }
    }

    pub fn with_trash_resolver(mut self, resolver: TrashRestoreResolver) -> Self {
        self.trash_resolver = resolver;
        self
    }

    /// Fold a finished request into an outcome.
    pub(crate) fn outcome(&self, result: Result<(), ServiceError>) -> ApplyOutcome {
        match result {
            Ok(()) => ApplyOutcome::Success,
            Err(e) => self.failure(e),
        }
    }

    /// Map a service error onto an outcome.
    ///
    /// Cancellation wins over whatever error the interrupted request
    /// reported. A request that finds its work already underway counts as
    /// done.
    pub(crate) fn failure(&self, error: ServiceError) -> ApplyOutcome {
        if error.is_cancelled() || self.cancel.is_cancelled() {
            tracing::info!(target: "undo", "apply cancelled");
            return ApplyOutcome::UserCancelled;
        }

        match error {
            ServiceError::AlreadyInProgress => ApplyOutcome::Success,
            e => {
                tracing::warn!(target: "undo", error = %e, "file operation failed");
                ApplyOutcome::Failed(e.to_string())
            }
        }
    }
}

/// A reversible filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoableOperation {
    Transfer(TransferOperation),
    Create(CreateOperation),
    Rename(RenameOperation),
    BatchRename(BatchRenameOperation),
    Trash(TrashOperation),
    RecursivePermissions(RecursivePermissionsOperation),
    Permissions(PermissionsOperation),
    Ownership(OwnershipOperation),
    Extract(ExtractOperation),
    Compress(CompressOperation),
}

impl UndoableOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Transfer(op) => op.kind().into(),
            Self::Create(op) => op.kind().into(),
            Self::Rename(_) => OperationKind::Rename,
            Self::BatchRename(_) => OperationKind::BatchRename,
            Self::Trash(_) => OperationKind::MoveToTrash,
            Self::RecursivePermissions(_) => OperationKind::RecursiveSetPermissions,
            Self::Permissions(_) => OperationKind::SetPermissions,
            Self::Ownership(op) => op.kind().into(),
            Self::Extract(_) => OperationKind::Extract,
            Self::Compress(_) => OperationKind::Compress,
        }
    }

    /// Number of items the operation affects.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Transfer(op) => op.item_count(),
            Self::BatchRename(op) => op.entries().len(),
            Self::Trash(op) => op.trashed().len(),
            Self::Extract(op) => op.sources().len(),
            Self::Compress(op) => op.sources().len(),
            Self::Create(_)
            | Self::Rename(_)
            | Self::RecursivePermissions(_)
            | Self::Permissions(_)
            | Self::Ownership(_) => 1,
        }
    }

    /// Labels and descriptions for both directions.
    pub fn strings(&self) -> UndoStrings {
        match self {
            Self::Transfer(op) => op.strings(),
            Self::Create(op) => op.strings(),
            Self::Rename(op) => op.strings(),
            Self::BatchRename(op) => op.strings(),
            Self::Trash(op) => op.strings(),
            Self::RecursivePermissions(op) => op.strings(),
            Self::Permissions(op) => op.strings(),
            Self::Ownership(op) => op.strings(),
            Self::Extract(op) => op.strings(),
            Self::Compress(op) => op.strings(),
        }
    }

    /// `(label, description)` of the action that applies `direction`.
    pub fn label_and_description(&self, direction: Direction) -> (String, String) {
        self.strings().into_direction(direction)
    }

    /// Replay the operation.
    ///
    /// Service failures and cancellation come back as an [`ApplyOutcome`];
    /// only a broken caller contract is an error.
    pub async fn apply<S>(
        &mut self,
        direction: Direction,
        ctx: &ApplyContext<'_, S>,
    ) -> Result<ApplyOutcome, InvariantViolation>
    where
        S: FileOperationsService + ?Sized,
    {
        tracing::debug!(target: "undo", kind = %self.kind(), %direction, "applying operation");

        let outcome = match self {
            Self::Transfer(op) => op.apply(direction, ctx).await,
            Self::Create(op) => op.apply(direction, ctx).await,
            Self::Rename(op) => op.apply(direction, ctx).await,
            Self::BatchRename(op) => op.apply(direction, ctx).await,
            Self::Trash(op) => op.apply(direction, ctx).await,
            Self::RecursivePermissions(op) => op.apply(direction, ctx).await,
            Self::Permissions(op) => op.apply(direction, ctx).await,
            Self::Ownership(op) => op.apply(direction, ctx).await,
            Self::Extract(op) => return op.apply(direction, ctx).await,
            Self::Compress(op) => op.apply(direction, ctx).await,
        };
        Ok(outcome)
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for UndoableOperation {
                fn from(op: $ty) -> Self {
                    Self::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation!(
    Transfer(TransferOperation),
    Create(CreateOperation),
    Rename(RenameOperation),
    BatchRename(BatchRenameOperation),
    Trash(TrashOperation),
    RecursivePermissions(RecursivePermissionsOperation),
    Permissions(PermissionsOperation),
    Ownership(OwnershipOperation),
    Extract(ExtractOperation),
    Compress(CompressOperation),
);

/// Last component of a path, for short descriptions.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Full path, for descriptions that name a location.
pub(crate) fn full_name(path: &Path) -> String {
    path.display().to_string()
}
