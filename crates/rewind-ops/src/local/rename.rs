//! Single and batch renames.

use std::fs;
use std::path::{Path, PathBuf};

use rewind_core::ServiceError;
use tokio_util::sync::CancellationToken;

/// Rename an item within its directory.
pub fn rename(path: &Path, new_name: &str) -> Result<PathBuf, ServiceError> {
    validate_filename(new_name).map_err(|message| ServiceError::Other { message })?;

    let parent = path.parent().unwrap_or(Path::new(""));
    let new_path = parent.join(new_name);

    if new_path == path {
        return Ok(new_path);
    }
    if new_path.symlink_metadata().is_ok() {
        return Err(ServiceError::AlreadyExists { path: new_path });
    }

    fs::rename(path, &new_path).map_err(|e| ServiceError::io(path, e))?;
    tracing::debug!(target: "local_ops", from = %path.display(), to = %new_path.display(), "renamed");
    Ok(new_path)
}

/// Rename many items in order, stopping at the first failure.
pub fn batch_rename(
    paths: &[PathBuf],
    new_names: &[String],
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, ServiceError> {
    if paths.len() != new_names.len() {
        return Err(ServiceError::other(format!(
            "Mismatched rename lists: {} files, {} names",
            paths.len(),
            new_names.len()
        )));
    }

    let mut renamed = Vec::with_capacity(paths.len());
    for (path, name) in paths.iter().zip(new_names) {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        match rename(path, name) {
            Ok(new_path) => renamed.push(new_path),
            Err(e) => {
                tracing::warn!(
                    target: "local_ops",
                    done = renamed.len(),
                    total = paths.len(),
                    error = %e,
                    "batch rename stopped"
                );
                return Err(e);
            }
        }
    }

    Ok(renamed)
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        for c in ['\\', ':', '*', '?', '"', '<', '>', '|'] {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
