//! Configuration model for envault
//!
//! The `Config` value is the single input every operation consumes. It is
//! loaded from a JSON file (see `sources`), validated once, and immutable
//! afterwards.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Validated configuration for backup and restore operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Top of the filesystem where scanning for .envrc files starts
    pub root_dir: PathBuf,

    /// Directory where backup artifacts are stored
    pub backup_dir: PathBuf,

    /// Path-segment names to prune while scanning, matched against each
    /// path's basename without extension
    #[serde(default)]
    pub exclude: HashSet<String>,

    /// Whether to encrypt the archive. Enabled by default so plaintext
    /// backups only happen on explicit opt-out.
    #[serde(default = "default_encrypt_backup")]
    pub encrypt_backup: bool,

    /// Email identifying the public key used to encrypt the archive.
    /// Required whenever `encrypt_backup` is true.
    #[serde(default)]
    pub encryption_recipient: Option<String>,
}

fn default_encrypt_backup() -> bool {
    true
}

impl Config {
    /// Transient directory used for backup staging and restore extraction
    pub fn tmp_dir(&self) -> PathBuf {
        self.backup_dir.join(".tmp")
    }

    /// Check the cross-field invariants that serde cannot express.
    ///
    /// Must pass before any scan/backup/restore work begins.
    pub fn validate(&self) -> VaultResult<()> {
        if self.encrypt_backup
            && self
                .encryption_recipient
                .as_deref()
                .map_or(true, |r| r.is_empty())
        {
            return Err(VaultError::Config(
                "Encryption is enabled (by default), but no recipient is specified. \
                 Please either specify a recipient in the config file, or explicitly \
                 disable encryption in the config file."
                    .into(),
            ));
        }
        Ok(())
    }
}
