//! Archive packing and unpacking
//!
//! One tar file per backup. Every file under the source directory is stored
//! at its path relative to a base directory, so an archive built from
//! `<tmp_dir>` holds entries like `projects/foo/.envrc`.
//!
//! Any failure of the underlying codec aborts the operation with a typed
//! error rather than continuing past a partial archive.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{VaultError, VaultResult};

/// Extension of plaintext backup artifacts
pub const ARCHIVE_EXTENSION: &str = "tar";

/// Build an archive containing every regular file under `source_dir`.
///
/// Each file is stored under its path relative to `base_dir`, which must be
/// an ancestor of every file encountered:
///
/// ```text
/// source_dir: /foo/bar     base_dir: /foo
///
///   original path          in archive
///   /foo/bar/baz/kk.1      bar/baz/kk.1
///   /foo/bar/kk.3          bar/kk.3
/// ```
///
/// `output` must carry the `tar` extension; anything else is a caller bug
/// and is rejected up front.
pub fn pack(source_dir: &Path, base_dir: &Path, output: &Path) -> VaultResult<PathBuf> {
    if output.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
        return Err(VaultError::Archive(format!(
            "Archive output must have a .{} extension: {}",
            ARCHIVE_EXTENSION,
            output.display()
        )));
    }

    let file = File::create(output).map_err(|e| {
        VaultError::Archive(format!("Failed to create archive {}: {}", output.display(), e))
    })?;
    let mut builder = tar::Builder::new(file);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| {
            VaultError::Archive(format!("Failed to walk {}: {}", source_dir.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path_in_archive = entry.path().strip_prefix(base_dir).map_err(|_| {
            VaultError::Archive(format!(
                "{} lies outside the archive base {}",
                entry.path().display(),
                base_dir.display()
            ))
        })?;

        debug!("Adding file to archive as {}", path_in_archive.display());
        builder
            .append_path_with_name(entry.path(), path_in_archive)
            .map_err(|e| {
                VaultError::Archive(format!(
                    "Failed to add {} to archive: {}",
                    entry.path().display(),
                    e
                ))
            })?;
    }

    builder.finish().map_err(|e| {
        VaultError::Archive(format!("Failed to finish archive {}: {}", output.display(), e))
    })?;

    Ok(output.to_path_buf())
}

/// Extract every entry of `archive_path` into `dest_dir`, preserving
/// relative structure and creating directories as needed.
pub fn unpack(archive_path: &Path, dest_dir: &Path) -> VaultResult<()> {
    let file = File::open(archive_path).map_err(|e| {
        VaultError::Archive(format!(
            "Failed to open archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    let mut archive = tar::Archive::new(file);
    archive.unpack(dest_dir).map_err(|e| {
        VaultError::Archive(format!(
            "Failed to extract {} into {}: {}",
            archive_path.display(),
            dest_dir.display(),
            e
        ))
    })?;

    debug!("Extracted {} into {}", archive_path.display(), dest_dir.display());

    Ok(())
}
