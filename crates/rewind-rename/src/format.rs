//! Rendering new names for a batch rename.

use crate::metadata::MetadataTable;
use crate::template::{MetadataKind, TemplateToken};

/// Double extensions kept together when splitting a name.
const COMPOUND_EXTENSIONS: &[&str] = &[".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst", ".tar.lz"];

/// How new names are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameMode {
    /// Render each file through a parsed template.
    Format(Vec<TemplateToken>),
    /// Replace every occurrence of `find` with `replacement`.
    Replace { find: String, replacement: String },
}

/// Split a file name into stem and extension (with its leading dot).
///
/// Hidden files without a further dot have no extension.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    let lower = file_name.to_ascii_lowercase();
    for compound in COMPOUND_EXTENSIONS {
        if lower.len() > compound.len() && lower.ends_with(compound) {
            let at = file_name.len() - compound.len();
            return (&file_name[..at], Some(&file_name[at..]));
        }
    }

    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(at) if at + 1 == file_name.len() => (file_name, None),
        Some(at) => (&file_name[..at], Some(&file_name[at..])),
    }
}

/// Render the new name of one file.
///
/// `sequence` is the 1-based position of the file in the selection.
/// Metadata tokens the table cannot resolve are skipped, except the
/// original file name which is always known.
pub fn render(
    file_name: &str,
    tokens: &[TemplateToken],
    metadata: &MetadataTable,
    sequence: usize,
) -> String {
    let (stem, extension) = split_extension(file_name);
    let file_meta = metadata.get(file_name);
    let mut new_name = String::new();

    for token in tokens {
        match token {
            TemplateToken::Text(text) => new_name.push_str(text),
            TemplateToken::Numbering(style) => new_name.push_str(&style.format(sequence)),
            TemplateToken::Metadata(MetadataKind::OriginalFileName) => new_name.push_str(stem),
            TemplateToken::Metadata(kind) => {
                let Some(value) = file_meta.and_then(|m| m.get(*kind)) else {
                    tracing::warn!(
                        target: "rename",
                        file = file_name,
                        tag = kind.label(),
                        "metadata missing for file, skipping tag"
                    );
                    continue;
                };

                if *kind == MetadataKind::TrackNumber {
                    new_name.push_str(&format!("{:02}", leading_number(value)));
                } else {
                    new_name.push_str(value);
                }
            }
        }
    }

    if new_name.is_empty() {
        return file_name.to_string();
    }

    if let Some(extension) = extension {
        new_name.push_str(extension);
    }
    new_name
}

/// Replace every occurrence of `find` in `file_name`.
///
/// An empty `find` leaves the name unchanged.
pub fn replace(file_name: &str, find: &str, replacement: &str) -> String {
    if find.is_empty() {
        return file_name.to_string();
    }
    file_name.split(find).collect::<Vec<_>>().join(replacement)
}

/// New names for every file of a selection, in selection order.
///
/// Sequence numbers start at 1.
pub fn new_names<S: AsRef<str>>(
    mode: &RenameMode,
    file_names: &[S],
    metadata: &MetadataTable,
) -> Vec<String> {
    file_names
        .iter()
        .enumerate()
        .map(|(index, name)| match mode {
            RenameMode::Format(tokens) => render(name.as_ref(), tokens, metadata, index + 1),
            RenameMode::Replace { find, replacement } => replace(name.as_ref(), find, replacement),
        })
        .collect()
}

/// Parse the leading integer of a string, `0` if there is none.
fn leading_number(value: &str) -> u64 {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
