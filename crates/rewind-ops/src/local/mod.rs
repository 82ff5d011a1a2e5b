//! [`FileOperationsService`] for the local filesystem.
//!
//! Each request runs on a spawned task that hands the filesystem work to
//! tokio's blocking pool, then answers its completion.

mod archive;
mod create;
#[cfg(unix)]
mod permissions;
mod rename;
mod transfer;
mod trashcan;

use std::path::PathBuf;

use rewind_core::{ServiceError, UndoConfig};
use tokio_util::sync::CancellationToken;

use crate::report::TransferReport;
use crate::service::{
    ArchiveFilter, ArchiveFormat, Completion, FileOperationsService, RecursivePermissionChange,
    TrashEntry, completion,
};

#[cfg(unix)]
pub use permissions::{group_of, mode_of, owner_of};
pub use rename::validate_filename;

/// Local filesystem implementation of [`FileOperationsService`].
#[derive(Debug, Clone)]
pub struct LocalFileOperations {
    use_trash: bool,
}

impl Default for LocalFileOperations {
    fn default() -> Self {
        Self { use_trash: true }
    }
}

impl LocalFileOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &UndoConfig) -> Self {
        Self {
            use_trash: config.use_trash,
        }
    }

    /// Delete instead of trashing when `use_trash` is off.
    pub fn with_trash(mut self, use_trash: bool) -> Self {
        self.use_trash = use_trash;
        self
    }

    fn run<T, F>(&self, request: &'static str, work: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    {
        let (tx, rx) = completion();

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(work)
                .await
                .unwrap_or_else(|e| Err(ServiceError::other(format!("Task failed: {}", e))));

            match &result {
                Ok(_) => tracing::debug!(target: "local_ops", request, "request done"),
                Err(e) if e.is_cancelled() => tracing::info!(target: "local_ops", request, "request cancelled"),
                Err(e) => tracing::warn!(target: "local_ops", request, error = %e, "request failed"),
            }
            let _ = tx.send(result);
        });

        rx
    }
}

#[cfg(not(unix))]
fn unsupported<T>(what: &str) -> Result<T, ServiceError> {
    Err(ServiceError::unsupported(format!("{} is only supported on unix", what)))
}

impl FileOperationsService for LocalFileOperations {
    fn move_items(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport> {
        self.run("move", move || transfer::move_items(&sources, &destination, &cancel))
    }

    fn copy_items(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport> {
        self.run("copy", move || transfer::copy_items(&sources, &destination, &cancel))
    }

    fn duplicate(&self, sources: Vec<PathBuf>, cancel: CancellationToken) -> Completion<TransferReport> {
        self.run("duplicate", move || transfer::duplicate(&sources, &cancel))
    }

    fn link(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<TransferReport> {
        self.run("link", move || transfer::link(&sources, &destination, &cancel))
    }

    fn delete(&self, targets: Vec<PathBuf>, cancel: CancellationToken) -> Completion<()> {
        self.run("delete", move || trashcan::delete(&targets, &cancel))
    }

    fn trash_or_delete(&self, targets: Vec<PathBuf>, cancel: CancellationToken) -> Completion<()> {
        let use_trash = self.use_trash;
        self.run("trash", move || trashcan::trash_or_delete(&targets, use_trash, &cancel))
    }

    fn rename(&self, path: PathBuf, new_name: String) -> Completion<PathBuf> {
        self.run("rename", move || rename::rename(&path, &new_name))
    }

    fn batch_rename(
        &self,
        paths: Vec<PathBuf>,
        new_names: Vec<String>,
        cancel: CancellationToken,
    ) -> Completion<Vec<PathBuf>> {
        self.run("batch_rename", move || rename::batch_rename(&paths, &new_names, &cancel))
    }

    fn new_file(&self, parent: PathBuf, name: String, contents: Option<Vec<u8>>) -> Completion<PathBuf> {
        self.run("new_file", move || create::new_file(&parent, &name, contents.as_deref()))
    }

    fn new_folder(&self, parent: PathBuf, name: String) -> Completion<PathBuf> {
        self.run("new_folder", move || create::new_folder(&parent, &name))
    }

    fn new_file_from_template(&self, parent: PathBuf, name: String, template: PathBuf) -> Completion<PathBuf> {
        self.run("new_file_from_template", move || {
            create::new_file_from_template(&parent, &name, &template)
        })
    }

    #[cfg(unix)]
    fn set_permissions(&self, path: PathBuf, mode: u32) -> Completion<()> {
        self.run("set_permissions", move || permissions::set_permissions(&path, mode))
    }

    #[cfg(not(unix))]
    fn set_permissions(&self, _path: PathBuf, _mode: u32) -> Completion<()> {
        crate::service::ready(unsupported("Setting permissions"))
    }

    #[cfg(unix)]
    fn set_permissions_recursive(
        &self,
        root: PathBuf,
        change: RecursivePermissionChange,
        cancel: CancellationToken,
    ) -> Completion<Vec<(PathBuf, u32)>> {
        self.run("set_permissions_recursive", move || {
            permissions::set_permissions_recursive(&root, &change, &cancel)
        })
    }

    #[cfg(not(unix))]
    fn set_permissions_recursive(
        &self,
        _root: PathBuf,
        _change: RecursivePermissionChange,
        _cancel: CancellationToken,
    ) -> Completion<Vec<(PathBuf, u32)>> {
        crate::service::ready(unsupported("Setting permissions"))
    }

    #[cfg(unix)]
    fn set_owner(&self, path: PathBuf, owner: String) -> Completion<()> {
        self.run("set_owner", move || permissions::set_owner(&path, &owner))
    }

    #[cfg(not(unix))]
    fn set_owner(&self, _path: PathBuf, _owner: String) -> Completion<()> {
        crate::service::ready(unsupported("Changing the owner"))
    }

    #[cfg(unix)]
    fn set_group(&self, path: PathBuf, group: String) -> Completion<()> {
        self.run("set_group", move || permissions::set_group(&path, &group))
    }

    #[cfg(not(unix))]
    fn set_group(&self, _path: PathBuf, _group: String) -> Completion<()> {
        crate::service::ready(unsupported("Changing the group"))
    }

    fn extract(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        cancel: CancellationToken,
    ) -> Completion<Vec<PathBuf>> {
        self.run("extract", move || archive::extract(&sources, &destination, &cancel))
    }

    fn compress(
        &self,
        sources: Vec<PathBuf>,
        output: PathBuf,
        format: ArchiveFormat,
        filter: ArchiveFilter,
        cancel: CancellationToken,
    ) -> Completion<PathBuf> {
        self.run("compress", move || {
            archive::compress(&sources, &output, format, filter, &cancel)
        })
    }

    fn enumerate_trash(&self) -> Completion<Vec<TrashEntry>> {
        self.run("enumerate_trash", trashcan::enumerate)
    }

    fn move_raw(&self, source: PathBuf, destination: PathBuf) -> Completion<()> {
        self.run("move_raw", move || trashcan::move_raw(&source, &destination))
    }
}
