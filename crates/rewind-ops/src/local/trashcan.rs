//! Deleting, trashing and reading the trash on the local filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use rewind_core::ServiceError;
use tokio_util::sync::CancellationToken;

use super::transfer::{move_item, remove_item};
use crate::report::OperationError;
use crate::service::TrashEntry;

fn join_errors(errors: &[OperationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Permanently delete every target.
///
/// Keeps going after a failure and reports all failures together.
pub fn delete(targets: &[PathBuf], cancel: &CancellationToken) -> Result<(), ServiceError> {
    let mut errors = Vec::new();

    for target in targets {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        if let Err(e) = remove_item(target) {
            if targets.len() == 1 {
                return Err(ServiceError::io(target, e));
            }
            errors.push(OperationError::new(target.clone(), e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::other(join_errors(&errors)))
    }
}

/// Move targets to the trash, or delete them when `use_trash` is off.
pub fn trash_or_delete(
    targets: &[PathBuf],
    use_trash: bool,
    cancel: &CancellationToken,
) -> Result<(), ServiceError> {
    if !use_trash {
        return delete(targets, cancel);
    }
    if cancel.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }

    trash::delete_all(targets).map_err(|e| ServiceError::other(format!("Failed to move to trash: {}", e)))?;
    tracing::info!(target: "trash", count = targets.len(), "moved items to trash");
    Ok(())
}

/// List the items currently in the trash.
#[cfg(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
))]
pub fn enumerate() -> Result<Vec<TrashEntry>, ServiceError> {
    let items = trash::os_limited::list()
        .map_err(|e| ServiceError::other(format!("Failed to read trash: {}", e)))?;

    Ok(items
        .into_iter()
        .map(|item| TrashEntry {
            trash_path: trashed_file_path(&item),
            original_path: item.original_path(),
            deleted_at: item.time_deleted,
        })
        .collect())
}

#[cfg(not(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
)))]
pub fn enumerate() -> Result<Vec<TrashEntry>, ServiceError> {
    Err(ServiceError::unsupported("Listing the trash is not supported on this platform"))
}

#[cfg(target_os = "windows")]
fn trashed_file_path(item: &trash::TrashItem) -> PathBuf {
    PathBuf::from(&item.id)
}

/// The item's data lives in `<trash>/files/<name>`; its id is the
/// `<trash>/info/<name>.trashinfo` file.
#[cfg(all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android")))]
fn trashed_file_path(item: &trash::TrashItem) -> PathBuf {
    let info_file = Path::new(&item.id);
    let trash_dir = info_file.parent().and_then(Path::parent);
    match (trash_dir, info_file.file_stem()) {
        (Some(dir), Some(name)) => dir.join("files").join(name),
        _ => info_file.to_path_buf(),
    }
}

/// Move `source` to `destination` without trash handling.
///
/// When `source` lives in a freedesktop trash, its `.trashinfo` record is
/// removed as well so the item does not linger in trash listings.
pub fn move_raw(source: &Path, destination: &Path) -> Result<(), ServiceError> {
    if destination.symlink_metadata().is_ok() {
        return Err(ServiceError::AlreadyExists {
            path: destination.to_path_buf(),
        });
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ServiceError::io(parent, e))?;
    }

    move_item(source, destination).map_err(|e| ServiceError::io(source, e))?;
    forget_trash_info(source);
    Ok(())
}

fn forget_trash_info(source: &Path) {
    let Some(files_dir) = source.parent() else {
        return;
    };
    if files_dir.file_name().is_none_or(|n| n != "files") {
        return;
    }
    let (Some(trash_dir), Some(name)) = (files_dir.parent(), source.file_name()) else {
        return;
    };

    let mut info_name = name.to_os_string();
    info_name.push(".trashinfo");
    let info_file = trash_dir.join("info").join(info_name);

    if info_file.exists() {
        if let Err(e) = fs::remove_file(&info_file) {
            tracing::warn!(target: "trash", path = %info_file.display(), error = %e, "failed to remove trash info");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_raw_drops_trash_info() {
        let temp = TempDir::new().unwrap();
        let trash_dir = temp.path().join("Trash");
        fs::create_dir_all(trash_dir.join("files")).unwrap();
        fs::create_dir_all(trash_dir.join("info")).unwrap();
        fs::write(trash_dir.join("files/a.txt"), "data").unwrap();
        fs::write(trash_dir.join("info/a.txt.trashinfo"), "[Trash Info]").unwrap();

        let restored = temp.path().join("home/a.txt");
        move_raw(&trash_dir.join("files/a.txt"), &restored).unwrap();

        assert_eq!(fs::read_to_string(&restored).unwrap(), "data");
        assert!(!trash_dir.join("info/a.txt.trashinfo").exists());
    }

    #[test]
    fn test_move_raw_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "").unwrap();
        fs::write(temp.path().join("b"), "").unwrap();

        let result = move_raw(&temp.path().join("a"), &temp.path().join("b"));
        assert!(matches!(result, Err(ServiceError::AlreadyExists { .. })));
    }

    #[test]
    fn test_delete_reports_every_failure() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real"), "").unwrap();
        let targets = vec![
            temp.path().join("real"),
            temp.path().join("ghost1"),
            temp.path().join("ghost2"),
        ];

        let err = delete(&targets, &CancellationToken::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ghost1"));
        assert!(message.contains("ghost2"));
        assert!(!temp.path().join("real").exists());
    }
}
