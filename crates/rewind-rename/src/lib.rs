//! Batch rename utilities for rewind.
//!
//! This crate provides:
//! - Template parsing and rendering of new names
//! - Metadata tables with selection-wide pruning
//! - Selection sorting before numbering
//! - Conflict detection against the selection and the directory
//! - Execution ordering so renames never clobber each other

mod conflict;
mod format;
mod metadata;
mod resolver;
mod sort;
mod template;

pub use conflict::{
    ConflictKind, RenameConflict, distinct_parents, find_conflicts, name_is_vacated_by_selection,
};
pub use format::{RenameMode, new_names, render, replace, split_extension};
pub use metadata::{FileMetadata, MetadataTable, format_creation_date};
pub use resolver::{ResolveError, file_name, reorder, sort_for_rename};
pub use sort::{SelectedFile, SortMode, sort_selection};
pub use template::{MetadataKind, NumberingStyle, TemplateToken, has_numbering, parse_template};
