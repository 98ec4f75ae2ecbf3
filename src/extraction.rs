//! Archive extraction and executable finalisation.
//!
//! Extracts `.tar.gz` and `.zip` archives into a destination directory
//! with path traversal protection to prevent zip-slip attacks. The
//! format is fixed by the platform rather than sniffed from file
//! contents, matching the two-format release matrix.

use crate::platform::ArchiveFormat;
use std::fs;
use std::io;
use std::path::{Component, Path};

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive could not be read as its declared format.
    #[error("corrupt or unsupported archive: {reason}")]
    Corrupt {
        /// Description of the decode failure.
        reason: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Extract the archive at `archive_path` into `dest_dir`.
///
/// Returns the list of file names that were extracted. Directory
/// entries are created but not counted.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
/// escape the destination directory, [`ExtractionError::EmptyArchive`]
/// if no files are found, [`ExtractionError::Corrupt`] if the archive
/// cannot be decoded, and [`ExtractionError::Io`] on I/O failures.
pub fn extract(
    archive_path: &Path,
    dest_dir: &Path,
    format: ArchiveFormat,
) -> Result<Vec<String>, ExtractionError> {
    match format {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
    }
}

/// Set the executable bits (owner/group/other) on `path`.
///
/// On platforms without an executable-bit concept this is a no-op, not
/// an error.
///
/// # Errors
///
/// Returns an I/O error if the permissions cannot be updated.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

/// Set the executable bits (owner/group/other) on `path`.
///
/// On platforms without an executable-bit concept this is a no-op, not
/// an error.
///
/// # Errors
///
/// Never fails on this platform.
#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Extract a gzip-compressed tar archive.
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut extracted = Vec::new();

    let entries = archive.entries().map_err(|e| ExtractionError::Corrupt {
        reason: e.to_string(),
    })?;
    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| ExtractionError::Corrupt {
            reason: e.to_string(),
        })?;
        let entry_path = entry
            .path()
            .map_err(|e| ExtractionError::Corrupt {
                reason: e.to_string(),
            })?
            .into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&dest_path)?;

        if entry.header().entry_type().is_file()
            && let Some(name) = entry_path.file_name()
        {
            extracted.push(name.to_string_lossy().into_owned());
        }
    }

    if extracted.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }

    Ok(extracted)
}

/// Extract a zip archive.
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractionError::Corrupt {
        reason: e.to_string(),
    })?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ExtractionError::Corrupt {
                reason: e.to_string(),
            })?;
        // enclosed_name rejects absolute paths and `..` components.
        let Some(entry_path) = entry.enclosed_name() else {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        };

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut output = fs::File::create(&dest_path)?;
        io::copy(&mut entry, &mut output)?;

        if let Some(name) = entry_path.file_name() {
            extracted.push(name.to_string_lossy().into_owned());
        }
    }

    if extracted.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }

    Ok(extracted)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}
