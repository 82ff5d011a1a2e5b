//! Owner and group changes.

use std::path::{Path, PathBuf};

use rewind_core::{ApplyOutcome, Direction, OperationKind, UndoStrings};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ApplyContext, full_name};
use crate::service::{FileOperationsService, wait};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OwnershipKind {
    #[strum(to_string = "owner")]
    Owner,
    #[strum(to_string = "group")]
    Group,
}

impl From<OwnershipKind> for OperationKind {
    fn from(kind: OwnershipKind) -> Self {
        match kind {
            OwnershipKind::Owner => Self::ChangeOwner,
            OwnershipKind::Group => Self::ChangeGroup,
        }
    }
}

/// The owning user or group of one item changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipOperation {
    kind: OwnershipKind,
    target: PathBuf,
    original: String,
    new: String,
}

impl OwnershipOperation {
    pub fn new(
        kind: OwnershipKind,
        target: impl Into<PathBuf>,
        original: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            original: original.into(),
            new: new.into(),
        }
    }

    pub fn kind(&self) -> OwnershipKind {
        self.kind
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn strings(&self) -> UndoStrings {
        let name = full_name(&self.target);
        let (what, title) = match self.kind {
            OwnershipKind::Owner => ("owner", "Owner"),
            OwnershipKind::Group => ("group", "Group"),
        };

        UndoStrings::new(
            format!("Undo Change {}", title),
            format!("Restore {} of “{}” to “{}”", what, name, self.original),
            format!("Redo Change {}", title),
            format!("Set {} of “{}” to “{}”", what, name, self.new),
        )
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        let value = match direction {
            Direction::Redo => self.new.clone(),
            Direction::Undo => self.original.clone(),
        };
        let target = self.target.clone();

        let request = match self.kind {
            OwnershipKind::Owner => ctx.service.set_owner(target, value),
            OwnershipKind::Group => ctx.service.set_group(target, value),
        };
        ctx.outcome(wait(request, &ctx.cancel).await)
    }
}
