//! Moving, copying, duplicating and linking on the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rewind_core::ServiceError;
use tokio_util::sync::CancellationToken;

use crate::conflict::{auto_rename_path, is_self_nested, unique_destination};
use crate::report::TransferReport;

fn item_name(path: &Path) -> Result<&std::ffi::OsStr, String> {
    path.file_name()
        .ok_or_else(|| "Path has no file name".to_string())
}

fn ensure_directory(destination: &Path) -> Result<(), ServiceError> {
    if !destination.exists() {
        fs::create_dir_all(destination).map_err(|e| ServiceError::io(destination, e))?;
    }
    Ok(())
}

/// Move every source into `destination`.
///
/// Existing entries at the destination are never overwritten; such items
/// are reported as failed. Cancellation stops before the next item and
/// returns the report so far, marked cancelled.
pub fn move_items(
    sources: &[PathBuf],
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<TransferReport, ServiceError> {
    ensure_directory(destination)?;
    let mut report = TransferReport::new();

    for source in sources {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let dest = match item_name(source) {
            Ok(name) => destination.join(name),
            Err(e) => {
                report.fail(source.clone(), e);
                continue;
            }
        };

        if is_self_nested(source, &dest) && source != &dest {
            report.fail(source.clone(), "Cannot move a directory into itself");
            continue;
        }
        if dest.symlink_metadata().is_ok() {
            report.fail(source.clone(), format!("'{}' already exists", dest.display()));
            continue;
        }

        match move_item(source, &dest) {
            Ok(()) => report.push(source.clone(), dest),
            Err(e) => report.fail(source.clone(), e.to_string()),
        }
    }

    tracing::debug!(
        target: "local_ops",
        moved = report.completed.len(),
        failed = report.errors.len(),
        cancelled = report.cancelled,
        destination = %destination.display(),
        "move finished"
    );
    Ok(report)
}

/// Copy every source into `destination`.
///
/// Copying into the directory an item already lives in creates a
/// "name (N)" copy; any other clash fails that item.
pub fn copy_items(
    sources: &[PathBuf],
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<TransferReport, ServiceError> {
    ensure_directory(destination)?;
    let mut report = TransferReport::new();

    for source in sources {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let name = match item_name(source) {
            Ok(name) => name,
            Err(e) => {
                report.fail(source.clone(), e);
                continue;
            }
        };

        let dest = if source.parent() == Some(destination) {
            auto_rename_path(&destination.join(name))
        } else {
            destination.join(name)
        };

        if is_self_nested(source, &dest) {
            report.fail(source.clone(), "Cannot copy a directory into itself");
            continue;
        }
        if dest.symlink_metadata().is_ok() {
            report.fail(source.clone(), format!("'{}' already exists", dest.display()));
            continue;
        }

        match copy_item(source, &dest) {
            Ok(_) => report.push(source.clone(), dest),
            Err(e) => report.fail(source.clone(), e.to_string()),
        }
    }

    Ok(report)
}

/// Copy every source next to itself under a free "name (N)" name.
pub fn duplicate(sources: &[PathBuf], cancel: &CancellationToken) -> Result<TransferReport, ServiceError> {
    let mut report = TransferReport::new();

    for source in sources {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let dest = auto_rename_path(source);
        match copy_item(source, &dest) {
            Ok(_) => report.push(source.clone(), dest),
            Err(e) => report.fail(source.clone(), e.to_string()),
        }
    }

    Ok(report)
}

/// Create a symbolic link to every source inside `destination`.
pub fn link(
    sources: &[PathBuf],
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<TransferReport, ServiceError> {
    ensure_directory(destination)?;
    let mut report = TransferReport::new();

    for source in sources {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let name = match item_name(source) {
            Ok(name) => name.to_string_lossy().to_string(),
            Err(e) => {
                report.fail(source.clone(), e);
                continue;
            }
        };

        let dest = unique_destination(destination, &name);
        match symlink(source, &dest) {
            Ok(()) => report.push(source.clone(), dest),
            Err(e) => report.fail(source.clone(), e.to_string()),
        }
    }

    Ok(report)
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    if original.is_dir() {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}

/// Move a single item, falling back to copy and delete across filesystems.
pub fn move_item(source: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    copy_item(source, dest)?;
    remove_item(source)
}

/// Copy a file, symlink or directory tree. Returns the bytes copied.
pub fn copy_item(source: &Path, dest: &Path) -> io::Result<u64> {
    let metadata = fs::symlink_metadata(source)?;

    if metadata.file_type().is_symlink() {
        let target = fs::read_link(source)?;
        symlink(&target, dest)?;
        Ok(0)
    } else if metadata.is_dir() {
        copy_dir_recursive(source, dest)
    } else {
        fs::copy(source, dest)
    }
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<u64> {
    fs::create_dir_all(dest)?;
    let mut total_bytes = 0u64;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        total_bytes += copy_item(&entry.path(), &dest.join(entry.file_name()))?;
    }

    Ok(total_bytes)
}

/// Remove a file, symlink or directory tree.
pub fn remove_item(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
