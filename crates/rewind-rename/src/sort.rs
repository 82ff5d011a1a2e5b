//! Selection ordering before numbering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::resolver::file_name;

/// Order in which a selection is numbered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SortMode {
    #[default]
    OriginalAscending,
    OriginalDescending,
    FirstModified,
    LastModified,
    FirstCreated,
    LastCreated,
}

/// A selected file with what sorting needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, modified: Option<SystemTime>) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    /// Read the modification time from disk.
    pub fn from_disk(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self { path, modified }
    }

    pub fn name(&self) -> String {
        file_name(&self.path)
    }
}

fn compare_names(a: &SelectedFile, b: &SelectedFile) -> Ordering {
    let (a, b) = (a.name(), b.name());
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(&b))
}

/// Sort a selection in place.
///
/// `creation_order` maps file names to their creation rank (lower is
/// older); files missing from it rank as 0.
pub fn sort_selection(
    files: &mut [SelectedFile],
    mode: SortMode,
    creation_order: &HashMap<String, usize>,
) {
    let created = |f: &SelectedFile| creation_order.get(&f.name()).copied().unwrap_or(0);

    match mode {
        SortMode::OriginalAscending => files.sort_by(compare_names),
        SortMode::OriginalDescending => files.sort_by(|a, b| compare_names(b, a)),
        SortMode::FirstModified => files.sort_by(|a, b| a.modified.cmp(&b.modified)),
        SortMode::LastModified => files.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortMode::FirstCreated => files.sort_by_key(|f| created(f)),
        SortMode::LastCreated => files.sort_by_key(|f| std::cmp::Reverse(created(f))),
    }
}
