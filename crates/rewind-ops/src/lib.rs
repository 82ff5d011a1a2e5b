//! Undoable file operations for rewind.
//!
//! This crate provides:
//! - The [`FileOperationsService`] trait the undo engine replays through,
//!   and [`LocalFileOperations`], its local filesystem implementation
//! - [`UndoableOperation`], a record of one performed mutation that can
//!   describe and replay itself
//! - [`TrashRestoreResolver`] for finding trashed items again
//! - [`UndoManager`], the history with its one-at-a-time apply gate

mod conflict;
mod local;
mod manager;
mod operation;
mod report;
mod service;
mod trash_restore;

pub use conflict::{auto_rename_path, is_self_nested, unique_destination};
pub use local::{LocalFileOperations, validate_filename};
#[cfg(unix)]
pub use local::{group_of, mode_of, owner_of};
pub use manager::{UndoEvent, UndoManager, UndoState};
pub use operation::{
    ApplyContext, BatchRenameEntry, BatchRenameOperation, CompressOperation, CreateKind, CreateOperation,
    ExtractOperation, OwnershipKind, OwnershipOperation, PermissionsOperation, RecursivePermissionsOperation,
    RenameOperation, TransferKind, TransferOperation, TrashOperation, UndoableOperation,
};
pub use report::{OperationError, TransferPair, TransferReport};
pub use service::{
    ArchiveFilter, ArchiveFormat, Completion, FileOperationsService, RecursivePermissionChange, Responder,
    TrashEntry, completion, ready, settle, wait,
};
pub use trash_restore::{DEFAULT_TIME_EPSILON, TrashRestoreResolver, match_trash_entries};
