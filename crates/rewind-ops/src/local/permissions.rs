//! Mode bits and ownership on unix filesystems.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rewind_core::ServiceError;
use tokio_util::sync::CancellationToken;

use crate::service::RecursivePermissionChange;

/// Permission bits of a mode, without the file type.
const MODE_BITS: u32 = 0o7777;

/// Current permission bits of a path.
pub fn mode_of(path: &Path) -> Result<u32, ServiceError> {
    let metadata = fs::metadata(path).map_err(|e| ServiceError::io(path, e))?;
    Ok(metadata.permissions().mode() & MODE_BITS)
}

pub fn set_permissions(path: &Path, mode: u32) -> Result<(), ServiceError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & MODE_BITS))
        .map_err(|e| ServiceError::io(path, e))
}

/// Apply `change` to `root` and everything below it.
///
/// Symlinks are skipped. Children are changed before their directories so
/// removing read or execute bits never hides entries still to be changed.
/// Returns every touched path with the mode it had before.
pub fn set_permissions_recursive(
    root: &Path,
    change: &RecursivePermissionChange,
    cancel: &CancellationToken,
) -> Result<Vec<(PathBuf, u32)>, ServiceError> {
    let mut planned = Vec::new();

    for entry in WalkDir::new(root).skip_hidden(false).follow_links(false).sort(true) {
        let entry = entry.map_err(|e| ServiceError::other(format!("Failed to walk {}: {}", root.display(), e)))?;
        if entry.file_type().is_symlink() {
            continue;
        }

        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).map_err(|e| ServiceError::io(&path, e))?;
        let old_mode = metadata.permissions().mode() & MODE_BITS;
        let new_mode = change.apply(old_mode, metadata.is_dir());
        planned.push((path, old_mode, new_mode));
    }

    for (path, old_mode, new_mode) in planned.iter().rev() {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        if old_mode != new_mode {
            set_permissions(path, *new_mode)?;
        }
    }

    tracing::debug!(target: "local_ops", root = %root.display(), entries = planned.len(), "changed permissions recursively");
    Ok(planned
        .into_iter()
        .map(|(path, old_mode, _)| (path, old_mode))
        .collect())
}

/// Name of the user owning a path, or its numeric id when unknown.
pub fn owner_of(path: &Path) -> Result<String, ServiceError> {
    let uid = fs::metadata(path).map_err(|e| ServiceError::io(path, e))?.uid();
    Ok(uzers::get_user_by_uid(uid)
        .map(|u| u.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| uid.to_string()))
}

/// Name of the group owning a path, or its numeric id when unknown.
pub fn group_of(path: &Path) -> Result<String, ServiceError> {
    let gid = fs::metadata(path).map_err(|e| ServiceError::io(path, e))?.gid();
    Ok(uzers::get_group_by_gid(gid)
        .map(|g| g.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| gid.to_string()))
}

fn resolve_uid(owner: &str) -> Result<u32, ServiceError> {
    owner
        .parse()
        .ok()
        .or_else(|| uzers::get_user_by_name(owner).map(|u| u.uid()))
        .ok_or_else(|| ServiceError::other(format!("Unknown user '{}'", owner)))
}

fn resolve_gid(group: &str) -> Result<u32, ServiceError> {
    group
        .parse()
        .ok()
        .or_else(|| uzers::get_group_by_name(group).map(|g| g.gid()))
        .ok_or_else(|| ServiceError::other(format!("Unknown group '{}'", group)))
}

pub fn set_owner(path: &Path, owner: &str) -> Result<(), ServiceError> {
    let uid = resolve_uid(owner)?;
    std::os::unix::fs::chown(path, Some(uid), None).map_err(|e| ServiceError::io(path, e))
}

pub fn set_group(path: &Path, group: &str) -> Result<(), ServiceError> {
    let gid = resolve_gid(group)?;
    std::os::unix::fs::chown(path, None, Some(gid)).map_err(|e| ServiceError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_read_mode() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "").unwrap();

        set_permissions(&file, 0o640).unwrap();
        assert_eq!(mode_of(&file).unwrap(), 0o640);
    }

    #[test]
    fn test_recursive_change_returns_old_modes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/file"), "").unwrap();
        set_permissions(&root.join("sub/file"), 0o644).unwrap();

        let change = RecursivePermissionChange {
            file_permissions: 0o600,
            file_mask: 0o777,
            dir_permissions: 0o700,
            dir_mask: 0o777,
        };
        let old = set_permissions_recursive(&root, &change, &CancellationToken::new()).unwrap();

        assert_eq!(old.len(), 3);
        assert!(old.contains(&(root.join("sub/file"), 0o644)));
        assert_eq!(mode_of(&root.join("sub/file")).unwrap(), 0o600);
        assert_eq!(mode_of(&root.join("sub")).unwrap(), 0o700);
    }

    #[test]
    fn test_owner_round_trip_to_self() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "").unwrap();

        // Chown to the current owner is always permitted
        let owner = owner_of(&file).unwrap();
        set_owner(&file, &owner).unwrap();
        assert_eq!(owner_of(&file).unwrap(), owner);
    }

    #[test]
    fn test_unknown_user() {
        assert!(resolve_uid("no-such-user-for-rewind-tests").is_err());
        assert_eq!(resolve_uid("1234").unwrap(), 1234);
    }
}
