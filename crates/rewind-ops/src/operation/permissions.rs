//! Mode bit changes, on one item or a whole tree.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rewind_core::{ApplyOutcome, Direction, UndoStrings};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ApplyContext, full_name};
use crate::service::{FileOperationsService, RecursivePermissionChange, wait};

/// Mode bits changed on one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsOperation {
    target: PathBuf,
    previous_mode: u32,
    new_mode: u32,
}

impl PermissionsOperation {
    pub fn new(target: impl Into<PathBuf>, previous_mode: u32, new_mode: u32) -> Self {
        Self {
            target: target.into(),
            previous_mode,
            new_mode,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn strings(&self) -> UndoStrings {
        let name = full_name(&self.target);
        UndoStrings::new(
            "Undo Change Permissions",
            format!("Restore original permissions of “{}”", name),
            "Redo Change Permissions",
            format!("Set permissions of “{}”", name),
        )
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let mode = match direction {
            Direction::Redo => self.new_mode,
            Direction::Undo => self.previous_mode,
        };
        let request = ctx.service.set_permissions(self.target.clone(), mode);
        ctx.outcome(wait(request, &ctx.cancel).await)
    }
}

/// Key of an entry in the original-mode map.
///
/// Paths are stored as `file://` URIs; relative paths, which cannot form
/// one, fall back to their plain display form.
pub fn entry_key(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| path.display().to_string())
}

fn entry_path(key: &str) -> PathBuf {
    Url::parse(key)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(key))
}

/// Mode bits changed on everything under a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursivePermissionsOperation {
    root: PathBuf,
    change: RecursivePermissionChange,
    original_modes: IndexMap<String, u32>,
}

impl RecursivePermissionsOperation {
    pub fn new(root: impl Into<PathBuf>, change: RecursivePermissionChange) -> Self {
        Self {
            root: root.into(),
            change,
            original_modes: IndexMap::new(),
        }
    }

    /// Record the mode a path had before the change.
    pub fn record_original(&mut self, path: &Path, mode: u32) {
        self.original_modes.insert(entry_key(path), mode);
    }

    /// Record every `(path, mode)` pair a recursive change reported.
    pub fn with_originals(mut self, originals: impl IntoIterator<Item = (PathBuf, u32)>) -> Self {
        for (path, mode) in originals {
            self.record_original(&path, mode);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original_modes(&self) -> &IndexMap<String, u32> {
        &self.original_modes
    }

    pub fn strings(&self) -> UndoStrings {
        let name = full_name(&self.root);
        UndoStrings::new(
            "Undo Change Permissions",
            format!("Restore original permissions of items enclosed in “{}”", name),
            "Redo Change Permissions",
            format!("Set permissions of items enclosed in “{}”", name),
        )
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        match direction {
            Direction::Redo => {
                let request = ctx
                    .service
                    .set_permissions_recursive(self.root.clone(), self.change, ctx.cancel.clone());

                match wait(request, &ctx.cancel).await {
                    Ok(originals) => {
                        self.original_modes.clear();
                        for (path, mode) in originals {
                            self.record_original(&path, mode);
                        }
                        ApplyOutcome::Success
                    }
                    Err(e) => ctx.failure(e),
                }
            }
            Direction::Undo => {
                // Nothing was recorded, so there is nothing to restore
                if self.original_modes.is_empty() {
                    tracing::debug!(target: "undo", root = %self.root.display(), "no original modes recorded");
                    return ApplyOutcome::Success;
                }

                for (key, mode) in &self.original_modes {
                    let request = ctx.service.set_permissions(entry_path(key), *mode);
                    if let Err(e) = wait(request, &ctx.cancel).await {
                        return ctx.failure(e);
                    }
                }
                ApplyOutcome::Success
            }
        }
    }
}
