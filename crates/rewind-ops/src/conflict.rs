//! Destination clash handling for the local file service.

use std::path::{Path, PathBuf};

use rewind_rename::split_extension;

/// Generate a free path next to `path`.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc. Compound
/// extensions such as ".tar.gz" stay together.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (stem, extension) = split_extension(&name);
    let extension = extension.unwrap_or("");

    for i in 1..1000 {
        let candidate = parent.join(format!("{} ({}){}", stem, i, extension));
        if !candidate.exists() {
            return candidate;
        }
    }

    // Fallback: use timestamp
    let timestamp = chrono::Utc::now().timestamp();
    parent.join(format!("{}_{}{}", stem, timestamp, extension))
}

/// `dir/name`, or a free variant of it when that path is taken.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if candidate.symlink_metadata().is_ok() {
        auto_rename_path(&candidate)
    } else {
        candidate
    }
}

/// Whether moving or copying `source` to `dest` would put a directory
/// inside itself.
pub fn is_self_nested(source: &Path, dest: &Path) -> bool {
    source.is_dir() && dest.starts_with(source)
}
