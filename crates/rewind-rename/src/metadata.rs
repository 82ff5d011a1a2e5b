//! Per-file metadata used by rename templates.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::MetadataKind;

/// Metadata values known for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    values: HashMap<MetadataKind, String>,
}

impl FileMetadata {
    /// Metadata for a file, seeded with its original name.
    pub fn new(file_name: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(MetadataKind::OriginalFileName, file_name.into());
        Self { values }
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, kind: MetadataKind, value: impl Into<String>) {
        self.values.insert(kind, value.into());
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, kind: MetadataKind, value: impl Into<String>) -> Self {
        self.set(kind, value);
        self
    }

    /// Get a value. Empty values count as missing.
    pub fn get(&self, kind: MetadataKind) -> Option<&str> {
        self.values
            .get(&kind)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn remove(&mut self, kind: MetadataKind) {
        self.values.remove(&kind);
    }
}

/// Metadata for a whole selection, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    files: IndexMap<String, FileMetadata>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only the original names of `file_names`.
    pub fn for_names<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for name in file_names {
            let name = name.into();
            table.files.insert(name.clone(), FileMetadata::new(name));
        }
        table
    }

    pub fn insert(&mut self, file_name: impl Into<String>, metadata: FileMetadata) {
        self.files.insert(file_name.into(), metadata);
    }

    pub fn get(&self, file_name: &str) -> Option<&FileMetadata> {
        self.files.get(file_name)
    }

    pub fn get_mut(&mut self, file_name: &str) -> Option<&mut FileMetadata> {
        self.files.get_mut(file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Drop every metadata kind that is not usable for the whole selection.
    ///
    /// A kind is unusable when any file lacks it or when a value contains
    /// `/`, which cannot appear in a file name. Returns the kinds that
    /// remain, in declaration order.
    pub fn retain_available(&mut self) -> Vec<MetadataKind> {
        let mut available = Vec::new();

        for kind in MetadataKind::iter() {
            let usable = !self.files.is_empty()
                && self
                    .files
                    .values()
                    .all(|file| file.get(kind).is_some_and(|v| !v.contains('/')));

            if usable {
                available.push(kind);
            } else {
                for file in self.files.values_mut() {
                    file.remove(kind);
                }
            }
        }

        tracing::debug!(target: "rename", ?available, files = self.files.len(), "pruned metadata");
        available
    }
}

/// Format a creation date for use inside a file name.
///
/// Uses the locale style date representation with `/` replaced by `-`.
pub fn format_creation_date(date: NaiveDateTime) -> String {
    date.format("%x").to_string().replace('/', "-")
}
