//! Archive extraction and compression.

use std::path::{Path, PathBuf};

use rewind_core::{ApplyOutcome, Direction, InvariantViolation, UndoStrings, plural};
use serde::{Deserialize, Serialize};

use super::{ApplyContext, full_name};
use crate::service::{ArchiveFilter, ArchiveFormat, FileOperationsService, wait};

/// Archives extracted into a directory.
///
/// `outputs` stays empty until a redo reports what it created; only then
/// can the extraction be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOperation {
    sources: Vec<PathBuf>,
    destination: PathBuf,
    outputs: Vec<PathBuf>,
}

impl ExtractOperation {
    pub fn new(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            sources,
            destination: destination.into(),
            outputs: Vec::new(),
        }
    }

    /// Record the outputs of an extraction that already ran.
    pub fn with_outputs(mut self, outputs: Vec<PathBuf>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    pub fn strings(&self) -> UndoStrings {
        let undo_description = match self.outputs.as_slice() {
            [output] => format!("Delete “{}”", full_name(output)),
            outputs => format!(
                "Delete {} extracted {}",
                outputs.len(),
                plural(outputs.len(), "file", "files")
            ),
        };
        let redo_description = match self.sources.as_slice() {
            [source] => format!("Extract “{}”", full_name(source)),
            sources => format!("Extract {} {}", sources.len(), plural(sources.len(), "file", "files")),
        };

        UndoStrings::new("Undo Extract", undo_description, "Redo Extract", redo_description)
    }

    pub(crate) async fn apply<S>(
        &mut self,
        direction: Direction,
        ctx: &ApplyContext<'_, S>,
    ) -> Result<ApplyOutcome, InvariantViolation>
    where
        S: FileOperationsService + ?Sized,
    {
        match direction {
            Direction::Undo => {
                if self.outputs.is_empty() {
                    return Err(InvariantViolation::ExtractNotApplied);
                }
                let request = ctx.service.delete(self.outputs.clone(), ctx.cancel.clone());
                Ok(ctx.outcome(wait(request, &ctx.cancel).await))
            }
            Direction::Redo => {
                let request = ctx
                    .service
                    .extract(self.sources.clone(), self.destination.clone(), ctx.cancel.clone());

                let outcome = match wait(request, &ctx.cancel).await {
                    Ok(outputs) if outputs.is_empty() => {
                        tracing::warn!(target: "undo", "extraction produced no files");
                        ApplyOutcome::Failed("Extraction produced no files".into())
                    }
                    Ok(outputs) => {
                        self.outputs = outputs;
                        ApplyOutcome::Success
                    }
                    Err(e) => ctx.failure(e),
                };
                Ok(outcome)
            }
        }
    }
}

/// Items packed into one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressOperation {
    sources: Vec<PathBuf>,
    output: PathBuf,
    format: ArchiveFormat,
    filter: ArchiveFilter,
}

impl CompressOperation {
    pub fn new(sources: Vec<PathBuf>, output: impl Into<PathBuf>, format: ArchiveFormat, filter: ArchiveFilter) -> Self {
        Self {
            sources,
            output: output.into(),
            format,
            filter,
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn strings(&self) -> UndoStrings {
        let redo_description = match self.sources.as_slice() {
            [source] => format!("Compress “{}”", full_name(source)),
            sources => format!("Compress {} {}", sources.len(), plural(sources.len(), "file", "files")),
        };

        UndoStrings::new(
            "Undo Compress",
            format!("Delete “{}”", full_name(&self.output)),
            "Redo Compress",
            redo_description,
        )
    }

    pub(crate) async fn apply<S>(&mut self, direction: Direction, ctx: &ApplyContext<'_, S>) -> ApplyOutcome
    where
        S: FileOperationsService + ?Sized,
    {
        match direction {
            Direction::Undo => {
                let request = ctx.service.delete(vec![self.output.clone()], ctx.cancel.clone());
                ctx.outcome(wait(request, &ctx.cancel).await)
            }
            Direction::Redo => {
                let request = ctx.service.compress(
                    self.sources.clone(),
                    self.output.clone(),
                    self.format,
                    self.filter,
                    ctx.cancel.clone(),
                );

                match wait(request, &ctx.cancel).await {
                    Ok(output) => {
                        self.output = output;
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
    fn test_extract_strings() {
        let op = ExtractOperation::new(vec!["/d/a.zip".into()], "/d");
        let strings = op.strings();
        assert_eq!(strings.redo_description, "Extract “/d/a.zip”");
        assert_eq!(strings.undo_description, "Delete 0 extracted files");

        let op = op.with_outputs(vec!["/d/a".into()]);
        assert_eq!(op.strings().undo_description, "Delete “/d/a”");

        let op = ExtractOperation::new(vec!["/d/a.zip".into(), "/d/b.tar".into()], "/d");
        assert_eq!(op.strings().redo_description, "Extract 2 files");
    }

    #[test]
    fn test_compress_strings() {
        let op = CompressOperation::new(
            vec!["/d/a".into(), "/d/b".into()],
            "/d/bundle.zip",
            ArchiveFormat::Zip,
            ArchiveFilter::None,
        );
        let strings = op.strings();
        assert_eq!(strings.undo_description, "Delete “/d/bundle.zip”");
        assert_eq!(strings.redo_description, "Compress 2 files");
        assert_eq!(strings.undo_label, "Undo Compress");
    }
}
