//! Backup orchestration
//!
//! Composes scanner, staging, archiver and the encryption gateway into one
//! operation:
//!
//! 1. scan `root_dir` for marker files;
//! 2. stage each file into `tmp_dir`, preserving its path relative to
//!    `root_dir`'s parent, so the root's own name becomes the top-level
//!    folder inside the archive and restore can tell which root a backup
//!    belongs to;
//! 3. pack the staging area into a timestamp-named tar in `backup_dir`;
//! 4. if encryption is enabled, encrypt the archive and delete the
//!    plaintext — on success and on failure alike.
//!
//! `tmp_dir` is removed on every exit path; exactly one artifact is left in
//! `backup_dir`, never both a `.tar` and a `.gpg`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::{pack, ARCHIVE_EXTENSION};
use crate::config::Config;
use crate::encrypt::{encrypt, ENCRYPTED_EXTENSION};
use crate::error::{VaultError, VaultResult};
use crate::io::{copy_file, FileGuard, TempDirGuard};
use crate::scan::{scan, Snapshot};

/// Run a full backup, returning the path of the durable artifact
pub fn backup(config: &Config) -> VaultResult<PathBuf> {
    let _tmp_guard = TempDirGuard::new(config.tmp_dir());

    let snapshot = scan(&config.root_dir, &config.exclude)?;

    stage_snapshot_files(&snapshot, config)?;

    let archive_path = archive_staging_area(&snapshot, config)?;

    if config.encrypt_backup {
        encrypt_archive(&archive_path, config)
    } else {
        Ok(archive_path)
    }
}

/// Copy every snapshot file into `tmp_dir`, mirroring its original layout.
///
/// Paths are taken relative to `root_dir`'s parent so the root directory's
/// own name appears as the top-level folder inside the staging area.
fn stage_snapshot_files(snapshot: &Snapshot, config: &Config) -> VaultResult<()> {
    fs::create_dir_all(config.tmp_dir()).map_err(|e| {
        VaultError::Io(format!(
            "Failed to create staging directory {}: {}",
            config.tmp_dir().display(),
            e
        ))
    })?;

    let base_path = staging_base(&config.root_dir)?;

    let total = snapshot.files.len();
    for (i, path) in snapshot.files.iter().enumerate() {
        let partial = path.strip_prefix(base_path).map_err(|_| {
            VaultError::Io(format!(
                "{} lies outside the scan root {}",
                path.display(),
                config.root_dir.display()
            ))
        })?;
        let staged_path = config.tmp_dir().join(partial);
        copy_file(path, &staged_path)?;
        info!("{}/{}  {} backed up", i + 1, total, partial.display());
    }

    Ok(())
}

/// The directory staged paths are taken relative to: the root's parent
fn staging_base(root_dir: &Path) -> VaultResult<&Path> {
    root_dir.parent().ok_or_else(|| {
        VaultError::Config(format!(
            "root_dir {} has no parent directory",
            root_dir.display()
        ))
    })
}

/// Pack the staging area into `backup_dir` and delete it
fn archive_staging_area(snapshot: &Snapshot, config: &Config) -> VaultResult<PathBuf> {
    let archive_path = config
        .backup_dir
        .join(format!("{}.{}", snapshot.archive_filename(), ARCHIVE_EXTENSION));

    let tmp_dir = config.tmp_dir();
    pack(&tmp_dir, &tmp_dir, &archive_path)?;

    fs::remove_dir_all(&tmp_dir).map_err(|e| {
        VaultError::Io(format!(
            "Failed to remove staging directory {}: {}",
            tmp_dir.display(),
            e
        ))
    })?;

    Ok(archive_path)
}

/// Encrypt the archive for the configured recipient.
///
/// The plaintext archive is deleted whether encryption succeeds or fails,
/// so an `EncryptionError` never leaves an unencrypted backup behind.
fn encrypt_archive(archive_path: &Path, config: &Config) -> VaultResult<PathBuf> {
    let recipient = config.encryption_recipient.as_deref().ok_or_else(|| {
        VaultError::Encryption("Config must specify a recipient to run encryption".into())
    })?;

    let encrypted_path = archive_path.with_extension(ENCRYPTED_EXTENSION);

    let _plaintext_guard = FileGuard::new(archive_path.to_path_buf());

    debug!("Attempting to encrypt {}", archive_path.display());
    encrypt(archive_path, &encrypted_path, recipient)?;

    Ok(encrypted_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    use crate::archive::unpack;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn plaintext_config(temp: &TempDir) -> Config {
        let root_dir = temp.path().join("root");
        fs::create_dir_all(&root_dir).unwrap();
        Config {
            root_dir,
            backup_dir: temp.path().join("backups"),
            exclude: HashSet::new(),
            encrypt_backup: false,
            encryption_recipient: None,
        }
    }

    fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
        if !dir.exists() {
            return vec![];
        }
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
            .collect()
    }

    #[test]
    fn test_backup_creates_exactly_one_tar_artifact() {
        let temp = TempDir::new().unwrap();
        let config = plaintext_config(&temp);
        touch(&config.root_dir.join(".envrc"), "export A=1");
        touch(&config.root_dir.join("foo").join(".envrc"), "export B=2");

        let artifact = backup(&config).unwrap();

        assert!(artifact.exists());
        assert_eq!(files_with_extension(&config.backup_dir, "tar").len(), 1);
        assert_eq!(files_with_extension(&config.backup_dir, "gpg").len(), 0);
    }

    #[test]
    fn test_backup_removes_staging_directory() {
        let temp = TempDir::new().unwrap();
        let config = plaintext_config(&temp);
        touch(&config.root_dir.join(".envrc"), "export A=1");

        backup(&config).unwrap();

        assert!(!config.tmp_dir().exists());
    }

    #[test]
    fn test_archive_layout_includes_root_name_as_top_folder() {
        let temp = TempDir::new().unwrap();
        let config = plaintext_config(&temp);
        touch(&config.root_dir.join("proj").join(".envrc"), "export C=3");

        let artifact = backup(&config).unwrap();

        let dest = temp.path().join("inspect");
        fs::create_dir_all(&dest).unwrap();
        unpack(&artifact, &dest).unwrap();

        // root_dir is named "root", so entries start with "root/"
        assert!(dest.join("root").join("proj").join(".envrc").exists());
    }

    #[test]
    fn test_backup_honors_exclusions() {
        let temp = TempDir::new().unwrap();
        let mut config = plaintext_config(&temp);
        config.exclude.insert("skipped".into());
        touch(&config.root_dir.join(".envrc"), "keep");
        touch(&config.root_dir.join("skipped").join(".envrc"), "drop");

        let artifact = backup(&config).unwrap();

        let dest = temp.path().join("inspect");
        fs::create_dir_all(&dest).unwrap();
        unpack(&artifact, &dest).unwrap();

        assert!(dest.join("root").join(".envrc").exists());
        assert!(!dest.join("root").join("skipped").exists());
    }

    #[test]
    fn test_encryption_failure_leaves_no_artifacts() {
        let temp = TempDir::new().unwrap();
        let mut config = plaintext_config(&temp);
        config.encrypt_backup = true;
        config.encryption_recipient = Some("nobody@invalid.example".into());
        touch(&config.root_dir.join(".envrc"), "secret");

        let err = backup(&config).unwrap_err();

        // gpg missing and keyless recipient both surface as EncryptionError
        assert!(err.is_encryption());
        assert_eq!(files_with_extension(&config.backup_dir, "tar").len(), 0);
        assert_eq!(files_with_extension(&config.backup_dir, "gpg").len(), 0);
        assert!(!config.tmp_dir().exists());
    }

    #[test]
    fn test_backup_of_empty_tree_still_produces_archive() {
        let temp = TempDir::new().unwrap();
        let config = plaintext_config(&temp);

        let artifact = backup(&config).unwrap();

        assert!(artifact.exists());
    }
}
