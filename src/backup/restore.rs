//! Restore orchestration
//!
//! Locates the most recent backup artifact, decrypts it when encryption is
//! in use, unpacks it into `tmp_dir` and copies every file back to its
//! original location under `root_dir`.
//!
//! The per-file copy loop is not atomic: a failure partway through leaves
//! earlier files restored, with no rollback. Cleanup still runs — `tmp_dir`
//! is always removed, and the decrypted plaintext archive is deleted only
//! when encryption is in use (otherwise the archive IS the durable backup).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::archive::{unpack, ARCHIVE_EXTENSION};
use crate::config::Config;
use crate::encrypt::{decrypt, ENCRYPTED_EXTENSION};
use crate::error::{VaultError, VaultResult};
use crate::io::{copy_file, FileGuard, TempDirGuard};

/// Restore the most recent backup into `config.root_dir`
pub fn restore(config: &Config) -> VaultResult<()> {
    let (archive_path, transient) = locate_archive(config)?;

    // The decrypted archive was derived solely for this restore; the
    // original .tar artifact must survive when encryption is off.
    let mut archive_guard = FileGuard::new(archive_path.clone());
    if !transient {
        archive_guard.disarm();
    }

    let tmp_dir = config.tmp_dir();
    let _tmp_guard = TempDirGuard::new(tmp_dir.clone());

    fs::create_dir_all(&tmp_dir).map_err(|e| {
        VaultError::Io(format!(
            "Failed to create extraction directory {}: {}",
            tmp_dir.display(),
            e
        ))
    })?;
    unpack(&archive_path, &tmp_dir)?;

    for entry in WalkDir::new(&tmp_dir) {
        let entry = entry
            .map_err(|e| VaultError::Io(format!("Failed to walk {}: {}", tmp_dir.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        restore_file(entry.path(), &tmp_dir, config)?;
    }

    info!("Restore process finished");

    Ok(())
}

/// Pick the artifact to restore from.
///
/// Returns the plaintext archive path plus whether it is transient (derived
/// by decryption and to be deleted afterwards).
fn locate_archive(config: &Config) -> VaultResult<(PathBuf, bool)> {
    if config.encrypt_backup {
        let encrypted_path = find_latest_backup(&config.backup_dir, true)?;
        let archive_path = decrypt(&encrypted_path)?;
        Ok((archive_path, true))
    } else {
        let archive_path = find_latest_backup(&config.backup_dir, false)?;
        Ok((archive_path, false))
    }
}

/// Copy one extracted file back under `root_dir`.
///
/// Layout of an extracted backup file:
///
/// ```text
///   my_backup_dir/.tmp/projects/foo/.envrc
///   ------▲------ --▲- ---▲---- ----▲-----
///         │         │     │         └─ relative path
///         │         │     └─ top parent, must equal root_dir's name
///         │         └─ extraction directory
///         └─ backup store
/// ```
///
/// A top parent that differs from `root_dir`'s name means this backup was
/// taken for a different root; that is fatal, not recoverable.
fn restore_file(staged: &Path, tmp_dir: &Path, config: &Config) -> VaultResult<()> {
    let relative_to_tmp_dir = staged.strip_prefix(tmp_dir).map_err(|_| {
        VaultError::Io(format!(
            "{} lies outside the extraction directory {}",
            staged.display(),
            tmp_dir.display()
        ))
    })?;

    let root_name = config
        .root_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            VaultError::Config(format!(
                "root_dir {} has no directory name",
                config.root_dir.display()
            ))
        })?;

    let top_parent = relative_to_tmp_dir
        .iter()
        .next()
        .and_then(|p| p.to_str())
        .ok_or_else(|| {
            VaultError::Io(format!(
                "Extracted entry {} has no path components",
                staged.display()
            ))
        })?;

    if top_parent != root_name {
        return Err(VaultError::RootMismatch {
            expected: root_name.to_string(),
            found: top_parent.to_string(),
        });
    }

    // Strip the top parent; what remains is the path under root_dir.
    let relative_path: PathBuf = relative_to_tmp_dir.iter().skip(1).collect();
    let final_path = config.root_dir.join(relative_path);

    debug!("Restoring {} to {}", staged.display(), final_path.display());
    copy_file(staged, &final_path)
}

/// All backup artifacts of the relevant kind in `dir`
fn find_all_backups(dir: &Path, extension: &str) -> VaultResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        VaultError::Io(format!(
            "Failed to read backup directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| VaultError::Io(format!("Failed to read entry in {}: {}", dir.display(), e)))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            backups.push(path);
        }
    }

    Ok(backups)
}

/// Most recent backup artifact in `dir`.
///
/// Artifact names start with a `YYYYMMDD-HHMMSS` timestamp, so
/// lexicographic order is chronological order and the last one sorts most
/// recent.
pub fn find_latest_backup(dir: &Path, encrypted: bool) -> VaultResult<PathBuf> {
    let extension = if encrypted {
        ENCRYPTED_EXTENSION
    } else {
        ARCHIVE_EXTENSION
    };

    let mut backups = find_all_backups(dir, extension)?;
    backups.sort();
    info!("{} backups found", backups.len());

    let most_recent = backups.pop().ok_or_else(|| {
        VaultError::backup_not_found(format!("no .{} files in {}", extension, dir.display()))
    })?;
    info!("Most recent backup: {}", most_recent.display());

    Ok(most_recent)
}
