//! The file operations service the undo engine drives.
//!
//! Every request returns a [`Completion`]: a one-shot channel the service
//! answers exactly once. Work happens wherever the service likes (the local
//! implementation uses tokio tasks); the caller only awaits the answer.

use std::path::{Path, PathBuf};

use rewind_core::ServiceError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::report::TransferReport;

/// Answer to one service request.
pub type Completion<T> = oneshot::Receiver<Result<T, ServiceError>>;

/// Sending half of a [`Completion`].
pub type Responder<T> = oneshot::Sender<Result<T, ServiceError>>;

/// Create a responder/completion pair.
pub fn completion<T>() -> (Responder<T>, Completion<T>) {
    oneshot::channel()
}

/// A completion that is already answered.
pub fn ready<T>(result: Result<T, ServiceError>) -> Completion<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    rx
}

/// Await a completion.
///
/// A service that drops its responder yields [`ServiceError::Disconnected`];
/// cancelling `cancel` stops waiting with [`ServiceError::Cancelled`].
pub async fn wait<T>(completion: Completion<T>, cancel: &CancellationToken) -> Result<T, ServiceError> {
    tokio::select! {
        biased;
        result = completion => result.unwrap_or(Err(ServiceError::Disconnected)),
        _ = cancel.cancelled() => Err(ServiceError::Cancelled),
    }
}

/// Await a completion whose service honours cancellation itself.
///
/// Transfers stop between items when cancelled and still answer with what
/// they did, so the answer is awaited even after the token fires.
pub async fn settle<T>(completion: Completion<T>) -> Result<T, ServiceError> {
    completion.await.unwrap_or(Err(ServiceError::Disconnected))
}

/// An item found in the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    /// Where the item currently lives inside the trash.
    pub trash_path: PathBuf,
    /// Where it was trashed from.
    pub original_path: PathBuf,
    /// Deletion time in unix seconds.
    pub deleted_at: i64,
}

/// Archive container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ArchiveFormat {
    #[strum(to_string = "zip")]
    Zip,
    #[strum(to_string = "tar")]
    Tar,
}

/// Compression applied on top of a tar container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ArchiveFilter {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "gzip")]
    Gzip,
    #[strum(to_string = "xz")]
    Xz,
    #[strum(to_string = "bzip2")]
    Bzip2,
}

impl ArchiveFormat {
    /// File extension for a format/filter combination.
    pub fn extension(self, filter: ArchiveFilter) -> &'static str {
        match (self, filter) {
            (Self::Zip, _) => ".zip",
            (Self::Tar, ArchiveFilter::None) => ".tar",
            (Self::Tar, ArchiveFilter::Gzip) => ".tar.gz",
            (Self::Tar, ArchiveFilter::Xz) => ".tar.xz",
            (Self::Tar, ArchiveFilter::Bzip2) => ".tar.bz2",
        }
    }

    /// Detect the format of an archive from its file name.
    pub fn detect(path: &Path) -> Option<(Self, ArchiveFilter)> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        let detected = if name.ends_with(".zip") {
            (Self::Zip, ArchiveFilter::None)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            (Self::Tar, ArchiveFilter::Gzip)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            (Self::Tar, ArchiveFilter::Xz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            (Self::Tar, ArchiveFilter::Bzip2)
        } else if name.ends_with(".tar") {
            (Self::Tar, ArchiveFilter::None)
        } else {
            return None;
        };
        Some(detected)
    }
}

/// Mode bits to apply to every entry under a directory.
///
/// Only the bits set in a mask change; files and directories have their own
/// bits and masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursivePermissionChange {
    pub file_permissions: u32,
    pub file_mask: u32,
    pub dir_permissions: u32,
    pub dir_mask: u32,
}

impl RecursivePermissionChange {
    /// The new mode of an entry currently at `mode`.
    pub fn apply(&self, mode: u32, is_dir: bool) -> u32 {
        let (bits, mask) = if is_dir {
            (self.dir_permissions, self.dir_mask)
        } else {
            (self.file_permissions, self.file_mask)
        };
        (mode & !mask) | (bits & mask)
    }
}

/// Filesystem operations the undo engine replays.
///
/// Implementations must answer every completion exactly once. Cancellation
/// is cooperative: a cancelled `cancel` token should make the service stop
/// between items and answer [`ServiceError::Cancelled`].
pub trait FileOperationsService: Send + Sync {
    /// Move items into `destination`.
    fn move_items(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport>;

    /// Copy items into `destination`.
    fn copy_items(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport>;

    /// Copy items next to themselves under a free name.
    fn duplicate(&self, sources: Vec<PathBuf>, cancel: CancellationToken) -> Completion<TransferReport>;

    /// Create symbolic links to items inside `destination`.
    fn link(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport>;

    /// Permanently delete items.
    fn delete(&self, targets: Vec<PathBuf>, cancel: CancellationToken) -> Completion<()>;

    /// Move items to the trash, deleting them when no trash is available.
    fn trash_or_delete(&self, targets: Vec<PathBuf>, cancel: CancellationToken) -> Completion<()>;

    /// Rename one item within its directory. Answers with the new path.
    fn rename(&self, path: PathBuf, new_name: String) -> Completion<PathBuf>;

    /// Rename many items, in the given order. Answers with the new paths.
    fn batch_rename(
        &self,
        paths: Vec<PathBuf>,
        new_names: Vec<String>,
        cancel: CancellationToken,
    ) -> Completion<Vec<PathBuf>>;

    /// Create a file in `parent`. Answers with the created path.
    fn new_file(&self, parent: PathBuf, name: String, contents: Option<Vec<u8>>) -> Completion<PathBuf>;

    /// Create a directory in `parent`. Answers with the created path.
    fn new_folder(&self, parent: PathBuf, name: String) -> Completion<PathBuf>;

    /// Create a file in `parent` as a copy of `template`.
    fn new_file_from_template(&self, parent: PathBuf, name: String, template: PathBuf) -> Completion<PathBuf>;

    /// Set the mode bits of one item.
    fn set_permissions(&self, path: PathBuf, mode: u32) -> Completion<()>;

    /// Apply a permission change to `root` and everything below it.
    /// Answers with the mode every touched entry had before.
    fn set_permissions_recursive(
        &self,
        root: PathBuf,
        change: RecursivePermissionChange,
        cancel: CancellationToken,
    ) -> Completion<Vec<(PathBuf, u32)>>;

    /// Change the owning user (name or numeric id).
    fn set_owner(&self, path: PathBuf, owner: String) -> Completion<()>;

    /// Change the owning group (name or numeric id).
    fn set_group(&self, path: PathBuf, group: String) -> Completion<()>;

    /// Extract archives into `destination`. Answers with the top-level
    /// outputs that were created.
    fn extract(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<Vec<PathBuf>>;

    /// Compress items into one archive. Answers with the archive path,
    /// which may differ from `output` when that name is taken.
    fn compress(
        &self,
        sources: Vec<PathBuf>,
        output: PathBuf,
        format: ArchiveFormat,
        filter: ArchiveFilter,
        cancel: CancellationToken,
    ) -> Completion<PathBuf>;

    /// List what is currently in the trash.
    fn enumerate_trash(&self) -> Completion<Vec<TrashEntry>>;

    /// Move one item without any trash handling or renaming.
    fn move_raw(&self, source: PathBuf, destination: PathBuf) -> Completion<()>;
}
