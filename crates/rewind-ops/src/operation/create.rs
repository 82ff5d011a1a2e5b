//! Newly created files and folders.

use std::path::{Path, PathBuf};

use rewind_core::{ApplyOutcome, Direction, OperationKind, UndoStrings};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ApplyContext, base_name, full_name};
use crate::service::{FileOperationsService, wait};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum CreateKind {
    #[strum(to_string = "empty file")]
    EmptyFile,
    #[strum(to_string = "folder")]
    Folder,
    #[strum(to_string = "from template")]
    FromTemplate,
}

impl From<CreateKind> for OperationKind {
    fn from(kind: CreateKind) -> Self {
        match kind {
            CreateKind::EmptyFile => Self::CreateEmptyFile,
            CreateKind::Folder => Self::CreateFolder,
            CreateKind::FromTemplate => Self::CreateFromTemplate,
        }
    }
}

/// A file or folder that did not exist before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOperation {
    kind: CreateKind,
    target: PathBuf,
    template: Option<PathBuf>,
    contents: Option<Vec<u8>>,
}

impl CreateOperation {
    /// A file, optionally with initial contents.
    pub fn empty_file(target: impl Into<PathBuf>, contents: Option<Vec<u8>>) -> Self {
        Self {
            kind: CreateKind::EmptyFile,
            target: target.into(),
            template: None,
            contents,
        }
    }

    pub fn folder(target: impl Into<PathBuf>) -> Self {
        Self {
            kind: CreateKind::Folder,
            target: target.into(),
            template: None,
            contents: None,
        }
    }

    pub fn from_template(target: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            kind: CreateKind::FromTemplate,
            target: target.into(),
            template: Some(template.into()),
            contents: None,
        }
    }

    pub fn kind(&self) -> CreateKind {
        self.kind
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    pub fn strings(&self) -> UndoStrings {
        let name = full_name(&self.target);
        let undo_description = format!("Delete “{}”", name);

        match self.kind {
            CreateKind::EmptyFile => UndoStrings::new(
                "Undo Create Empty File",
                undo_description,
                "Redo Create Empty File",
                format!("Create an empty file “{}”", name),
            ),
            CreateKind::Folder => UndoStrings::new(
                "Undo Create Folder",
                undo_description,
                "Redo Create Folder",
                format!("Create a new folder “{}”", name),
            ),
            CreateKind::FromTemplate => UndoStrings::new(
                "Undo Create from Template",
                undo_description,
                "Redo Create from Template",
                format!("Create new file “{}” from template", name),
            ),
        }
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        match direction {
            Direction::Undo => {
                let request = ctx.service.delete(vec![self.target.clone()], ctx.cancel.clone());
                ctx.outcome(wait(request, &ctx.cancel).await)
            }
            Direction::Redo => {
                let parent = self.target.parent().map(Path::to_path_buf).unwrap_or_default();
                let name = base_name(&self.target);

                let request = match (self.kind, &self.template) {
                    (CreateKind::Folder, _) => ctx.service.new_folder(parent, name),
                    (CreateKind::FromTemplate, Some(template)) => {
                        ctx.service.new_file_from_template(parent, name, template.clone())
                    }
                    _ => ctx.service.new_file(parent, name, self.contents.clone()),
                };

                match wait(request, &ctx.cancel).await {
                    Ok(created) => {
                        self.target = created;
                        ApplyOutcome::Success
                    }
                    Err(e) => ctx.failure(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_strings() {
        let folder = CreateOperation::folder("/home/me/New Folder");
        let strings = folder.strings();
        assert_eq!(strings.undo_label, "Undo Create Folder");
        assert_eq!(strings.undo_description, "Delete “/home/me/New Folder”");
        assert_eq!(strings.redo_description, "Create a new folder “/home/me/New Folder”");

        let file = CreateOperation::from_template("/t/report.odt", "/templates/report.odt");
        assert_eq!(file.strings().redo_description, "Create new file “/t/report.odt” from template");
        assert_eq!(file.template(), Some(Path::new("/templates/report.odt")));
    }

    #[test]
    fn test_create_kind() {
        let op = CreateOperation::empty_file("/a", Some(b"hi".to_vec()));
        assert_eq!(OperationKind::from(op.kind()), OperationKind::CreateEmptyFile);
    }
}
