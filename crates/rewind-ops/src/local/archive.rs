//! Zip and tar archives.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use jwalk::WalkDir;
use rewind_core::ServiceError;
use rewind_rename::split_extension;
use tokio_util::sync::CancellationToken;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::conflict::{auto_rename_path, unique_destination};
use crate::service::{ArchiveFilter, ArchiveFormat};

fn archive_error(path: &Path, error: impl std::fmt::Display) -> ServiceError {
    ServiceError::other(format!("{}: {}", path.display(), error))
}

/// Extract every archive into its own directory under `destination`.
///
/// Each archive gets a directory named after it without the extension,
/// renamed to "name (N)" when taken. Returns the created directories.
pub fn extract(
    sources: &[PathBuf],
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, ServiceError> {
    let mut outputs = Vec::new();

    for source in sources {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }

        let (format, filter) = ArchiveFormat::detect(source)
            .ok_or_else(|| ServiceError::unsupported(format!("Not an archive: {}", source.display())))?;

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (stem, _) = split_extension(&name);
        let output = unique_destination(destination, stem);
        fs::create_dir_all(&output).map_err(|e| ServiceError::io(&output, e))?;

        let result = match format {
            ArchiveFormat::Zip => extract_zip(source, &output),
            ArchiveFormat::Tar => extract_tar(source, &output, filter),
        };

        if let Err(e) = result {
            let _ = fs::remove_dir_all(&output);
            return Err(e);
        }

        tracing::info!(target: "local_ops", archive = %source.display(), output = %output.display(), "extracted");
        outputs.push(output);
    }

    Ok(outputs)
}

fn extract_zip(source: &Path, output: &Path) -> Result<(), ServiceError> {
    let file = File::open(source).map_err(|e| ServiceError::io(source, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| archive_error(source, e))?;
    archive.extract(output).map_err(|e| archive_error(source, e))
}

fn extract_tar(source: &Path, output: &Path, filter: ArchiveFilter) -> Result<(), ServiceError> {
    let file = File::open(source).map_err(|e| ServiceError::io(source, e))?;
    let reader: Box<dyn Read> = match filter {
        ArchiveFilter::None => Box::new(file),
        ArchiveFilter::Gzip => Box::new(GzDecoder::new(file)),
        ArchiveFilter::Xz => Box::new(XzDecoder::new(file)),
        ArchiveFilter::Bzip2 => Box::new(BzDecoder::new(file)),
    };

    tar::Archive::new(reader)
        .unpack(output)
        .map_err(|e| archive_error(source, e))
}

/// Pack `sources` into one archive at `output`.
///
/// A taken `output` gets a "name (N)" variant; the written path is
/// returned. A partial archive is removed on failure.
pub fn compress(
    sources: &[PathBuf],
    output: &Path,
    format: ArchiveFormat,
    filter: ArchiveFilter,
    cancel: &CancellationToken,
) -> Result<PathBuf, ServiceError> {
    let output = if output.symlink_metadata().is_ok() {
        auto_rename_path(output)
    } else {
        output.to_path_buf()
    };

    let file = File::create_new(&output).map_err(|e| ServiceError::io(&output, e))?;
    let result = match format {
        ArchiveFormat::Zip => write_zip(file, sources, cancel),
        ArchiveFormat::Tar => match filter {
            ArchiveFilter::None => write_tar(file, sources, cancel).map(drop),
            ArchiveFilter::Gzip => write_tar(GzEncoder::new(file, flate2::Compression::default()), sources, cancel)
                .and_then(|w| w.finish())
                .map(drop),
            ArchiveFilter::Xz => write_tar(XzEncoder::new(file, 6), sources, cancel)
                .and_then(|w| w.finish())
                .map(drop),
            ArchiveFilter::Bzip2 => write_tar(BzEncoder::new(file, bzip2::Compression::default()), sources, cancel)
                .and_then(|w| w.finish())
                .map(drop),
        },
    };

    match result {
        Ok(()) => {
            tracing::info!(target: "local_ops", output = %output.display(), %format, %filter, "compressed");
            Ok(output)
        }
        Err(e) => {
            let _ = fs::remove_file(&output);
            if e.kind() == io::ErrorKind::Interrupted && cancel.is_cancelled() {
                Err(ServiceError::Cancelled)
            } else {
                Err(ServiceError::io(&output, e))
            }
        }
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "cancelled")
}

fn write_tar<W: Write>(writer: W, sources: &[PathBuf], cancel: &CancellationToken) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    for source in sources {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let name = source
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no file name"))?;

        if source.is_dir() {
            builder.append_dir_all(name, source)?;
        } else {
            builder.append_path_with_name(source, name)?;
        }
    }

    builder.into_inner()
}

fn write_zip(file: File, sources: &[PathBuf], cancel: &CancellationToken) -> io::Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for source in sources {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let base = source.parent().unwrap_or(Path::new(""));

        for entry in WalkDir::new(source).skip_hidden(false).follow_links(false).sort(true) {
            let entry = entry.map_err(io::Error::other)?;
            let path = entry.path();
            let relative = path.strip_prefix(base).map_err(io::Error::other)?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                zip.add_directory(name, options).map_err(io::Error::other)?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options).map_err(io::Error::other)?;
                io::copy(&mut File::open(&path)?, &mut zip)?;
            }
        }
    }

    zip.finish().map_err(io::Error::other)?;
    Ok(())
}
