//! File and directory creation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rewind_core::ServiceError;

use super::rename::validate_filename;
use crate::conflict::unique_destination;

fn checked_destination(parent: &Path, name: &str) -> Result<PathBuf, ServiceError> {
    validate_filename(name).map_err(|message| ServiceError::Other { message })?;
    if !parent.is_dir() {
        return Err(ServiceError::NotFound {
            path: parent.to_path_buf(),
        });
    }
    Ok(unique_destination(parent, name))
}

/// Create a file, optionally with initial contents.
///
/// A taken name gets a "name (N)" variant; the created path is returned.
pub fn new_file(parent: &Path, name: &str, contents: Option<&[u8]>) -> Result<PathBuf, ServiceError> {
    let path = checked_destination(parent, name)?;

    let mut file = fs::File::create_new(&path).map_err(|e| ServiceError::io(&path, e))?;
    if let Some(contents) = contents {
        file.write_all(contents).map_err(|e| ServiceError::io(&path, e))?;
    }

    tracing::debug!(target: "local_ops", path = %path.display(), "created file");
    Ok(path)
}

/// Create a directory.
pub fn new_folder(parent: &Path, name: &str) -> Result<PathBuf, ServiceError> {
    let path = checked_destination(parent, name)?;
    fs::create_dir(&path).map_err(|e| ServiceError::io(&path, e))?;

    tracing::debug!(target: "local_ops", path = %path.display(), "created folder");
    Ok(path)
}

/// Create a file holding a copy of `template`.
pub fn new_file_from_template(parent: &Path, name: &str, template: &Path) -> Result<PathBuf, ServiceError> {
    if !template.is_file() {
        return Err(ServiceError::NotFound {
            path: template.to_path_buf(),
        });
    }
    let path = checked_destination(parent, name)?;
    fs::copy(template, &path).map_err(|e| ServiceError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_file_with_contents() {
        let temp = TempDir::new().unwrap();
        let path = new_file(temp.path(), "hello.txt", Some(b"hi")).unwrap();

        assert_eq!(path, temp.path().join("hello.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hi");
    }

    #[test]
    fn test_new_file_taken_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();

        let path = new_file(temp.path(), "a.txt", None).unwrap();
        assert_eq!(path, temp.path().join("a (1).txt"));
    }

    #[test]
    fn test_new_folder_rejects_bad_name() {
        let temp = TempDir::new().unwrap();
        assert!(new_folder(temp.path(), "a/b").is_err());
        assert!(new_folder(&temp.path().join("missing"), "x").is_err());
    }

    #[test]
    fn test_from_template() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("template.md");
        fs::write(&template, "# Title").unwrap();

        let path = new_file_from_template(temp.path(), "note.md", &template).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# Title");
    }
}
