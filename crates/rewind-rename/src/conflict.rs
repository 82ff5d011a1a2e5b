//! Detecting name clashes before a batch rename runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::resolver::file_name;

/// Why a new name cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two files of the selection would get the same name in one directory.
    Duplicate,
    /// A file that stays in place already has this name.
    Existing,
}

/// A selection entry whose new name clashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConflict {
    pub index: usize,
    pub new_name: String,
    pub kind: ConflictKind,
}

/// Whether a selected entry called `existing_name` is renamed to
/// something else, freeing that name.
///
/// A new name that matches an existing one is not a conflict when the
/// existing file is itself being renamed away. `parent` limits the check to
/// one directory; `None` matches any directory.
pub fn name_is_vacated_by_selection<S: AsRef<str>>(
    selection: &[PathBuf],
    new_names: &[S],
    existing_name: &str,
    parent: Option<&Path>,
) -> bool {
    selection.iter().zip(new_names).any(|(path, new_name)| {
        file_name(path) == existing_name
            && parent.is_none_or(|p| path.parent() == Some(p))
            && new_name.as_ref() != existing_name
    })
}

/// Find every entry whose new name cannot be used.
///
/// `exists` reports whether a directory already holds an entry with the
/// given name. Entries keeping their current name are never conflicts.
pub fn find_conflicts<S, F>(selection: &[PathBuf], new_names: &[S], exists: F) -> Vec<RenameConflict>
where
    S: AsRef<str>,
    F: Fn(&Path, &str) -> bool,
{
    let targets: HashMap<(Option<&Path>, &str), usize> = selection
        .iter()
        .zip(new_names)
        .map(|(path, name)| (path.parent(), name.as_ref()))
        .counts();

    let mut conflicts = Vec::new();

    for (index, (path, new_name)) in selection.iter().zip(new_names).enumerate() {
        let new_name = new_name.as_ref();
        if file_name(path) == new_name {
            continue;
        }

        let parent = path.parent();
        let kind = if targets.get(&(parent, new_name)).copied().unwrap_or(0) > 1 {
            Some(ConflictKind::Duplicate)
        } else if parent.is_some_and(|dir| exists(dir, new_name))
            && !name_is_vacated_by_selection(selection, new_names, new_name, parent)
        {
            Some(ConflictKind::Existing)
        } else {
            None
        };

        if let Some(kind) = kind {
            conflicts.push(RenameConflict {
                index,
                new_name: new_name.to_string(),
                kind,
            });
        }
    }

    if !conflicts.is_empty() {
        tracing::debug!(target: "rename", count = conflicts.len(), "batch rename has conflicts");
    }
    conflicts
}

/// The directories a selection lives in, in order of first appearance.
pub fn distinct_parents(selection: &[PathBuf]) -> Vec<PathBuf> {
    selection
        .iter()
        .filter_map(|p| p.parent())
        .unique()
        .map(Path::to_path_buf)
        .collect()
}
