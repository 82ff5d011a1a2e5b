//! Finding trashed items again so they can be restored.
//!
//! A trash operation only remembers which paths it trashed and when. To
//! undo it, the trash is scanned and each item is matched back to a
//! remembered path by its original location and deletion time.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use rewind_core::ServiceError;
use tokio_util::sync::CancellationToken;

use crate::service::{FileOperationsService, TrashEntry, wait};

/// Default tolerance in seconds between the recorded and reported
/// deletion times.
pub const DEFAULT_TIME_EPSILON: i64 = 2;

/// Match trash entries to trashed paths.
///
/// An entry matches when its original path was trashed and its deletion
/// time is within `epsilon` seconds of the recorded one. Each original path
/// restores at most one entry: the closest in time, the first listed on a
/// tie. Returns `trash path -> original path` in the order of `trashed`.
pub fn match_trash_entries(
    entries: &[TrashEntry],
    trashed: &IndexMap<PathBuf, i64>,
    epsilon: i64,
) -> IndexMap<PathBuf, PathBuf> {
    let mut best: HashMap<&PathBuf, (usize, i64)> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(recorded) = trashed.get(&entry.original_path) else {
            continue;
        };

        let distance = (entry.deleted_at - recorded).abs();
        if distance > epsilon {
            continue;
        }

        match best.get(&entry.original_path) {
            Some((_, current)) if *current <= distance => {}
            _ => {
                best.insert(&entry.original_path, (index, distance));
            }
        }
    }

    trashed
        .keys()
        .filter_map(|original| best.get(original))
        .map(|(index, _)| {
            let entry = &entries[*index];
            (entry.trash_path.clone(), entry.original_path.clone())
        })
        .collect()
}

/// Resolves which trash items a trash operation put there.
#[derive(Debug, Clone, Copy)]
pub struct TrashRestoreResolver {
    epsilon: i64,
}

impl Default for TrashRestoreResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_EPSILON)
    }
}

impl TrashRestoreResolver {
    pub fn new(epsilon: i64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> i64 {
        self.epsilon
    }

    /// Scan the trash through `service` and match it against `trashed`.
    pub async fn resolve<S>(
        &self,
        service: &S,
        trashed: &IndexMap<PathBuf, i64>,
        cancel: &CancellationToken,
    ) -> Result<IndexMap<PathBuf, PathBuf>, ServiceError>
    where
        S: FileOperationsService + ?Sized,
    {
        let entries = wait(service.enumerate_trash(), cancel).await?;
        let matched = match_trash_entries(&entries, trashed, self.epsilon);

        tracing::debug!(
            target: "trash",
            scanned = entries.len(),
            wanted = trashed.len(),
            matched = matched.len(),
            "resolved trash items"
        );
        Ok(matched)
    }
}
