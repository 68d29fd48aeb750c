//! Filesystem plumbing shared by backup and restore
//!
//! Small copy helper plus the Drop-based cleanup guards that implement the
//! "tmp_dir and transient archives are removed exactly once, on every exit
//! path" contract.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{VaultError, VaultResult};

/// Copy a file, creating the destination's parent directories as needed
pub fn copy_file(src: &Path, dst: &Path) -> VaultResult<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            VaultError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    fs::copy(src, dst).map_err(|e| {
        VaultError::Io(format!(
            "Failed to copy {} to {}: {}",
            src.display(),
            dst.display(),
            e
        ))
    })?;

    Ok(())
}

/// Removes a directory tree when dropped.
///
/// Cleanup is best-effort: a failure to remove is logged, not propagated,
/// since guards run on error paths where the original failure matters more.
pub struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            debug!("Cleaning up temporary directory {}", self.path.display());
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Deletes a single file when dropped, unless disarmed.
pub struct FileGuard {
    path: PathBuf,
    armed: bool,
}

impl FileGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Keep the file: the guard becomes a no-op on drop.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            debug!("Cleaning up transient file {}", self.path.display());
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
