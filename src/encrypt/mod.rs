//! Encryption gateway
//!
//! Wraps the external `gpg` tool for public-key encryption of backup
//! archives. Two preconditions are checked explicitly before any
//! invocation, so a missing tool or keyless recipient surfaces as a
//! distinguishable error instead of opaque tool output:
//!
//! 1. the `gpg` binary is available;
//! 2. for encryption, the recipient resolves to a known public key.
//!
//! The decrypting side needs no key bookkeeping here: the ciphertext itself
//! identifies the private key to use.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, warn};

use crate::archive::ARCHIVE_EXTENSION;
use crate::error::{VaultError, VaultResult};

/// Extension of encrypted backup artifacts
pub const ENCRYPTED_EXTENSION: &str = "gpg";

/// Check whether the gpg binary is available
pub fn is_gpg_installed() -> bool {
    match Command::new("gpg").arg("--version").output() {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Check whether `recipient` has a public key in the local keyring.
///
/// gpg renders key owners as `Name <email>`, so the recipient is matched
/// in angle brackets against the `--list-keys` output.
pub fn recipient_has_key(recipient: &str) -> VaultResult<bool> {
    let output = run_gpg(&["--list-keys".into()])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    let found = stdout.contains(&format!("<{}>", recipient));
    if found {
        debug!("Recipient '{}' is associated with a GPG key", recipient);
    } else {
        debug!("Recipient '{}' is not associated with any GPG key", recipient);
    }

    Ok(found)
}

/// Encrypt `plain_path` into `encrypted_path` for `recipient`
pub fn encrypt(plain_path: &Path, encrypted_path: &Path, recipient: &str) -> VaultResult<()> {
    if !is_gpg_installed() {
        return Err(VaultError::Encryption("gpg is not installed".into()));
    }

    if !recipient_has_key(recipient)? {
        return Err(VaultError::Encryption(format!(
            "No key found for recipient '{}'",
            recipient
        )));
    }

    let output = run_gpg(&[
        "--output".into(),
        encrypted_path.display().to_string(),
        "--encrypt".into(),
        "--recipient".into(),
        recipient.into(),
        plain_path.display().to_string(),
    ])?;
    check_gpg_result("encrypt", &output)?;

    debug!("Encryption output: {}", encrypted_path.display());

    Ok(())
}

/// Decrypt `encrypted_path`, returning the derived plaintext archive path
pub fn decrypt(encrypted_path: &Path) -> VaultResult<PathBuf> {
    if !is_gpg_installed() {
        return Err(VaultError::Encryption("gpg is not installed".into()));
    }

    let decrypted_path = decrypted_output_path(encrypted_path);

    let output = run_gpg(&[
        "--output".into(),
        decrypted_path.display().to_string(),
        "--decrypt".into(),
        encrypted_path.display().to_string(),
    ])?;
    check_gpg_result("decrypt", &output)?;

    debug!("Decryption output: {}", decrypted_path.display());

    Ok(decrypted_path)
}

/// Plaintext path for an encrypted archive: same stem, archive extension
pub fn decrypted_output_path(encrypted_path: &Path) -> PathBuf {
    encrypted_path.with_extension(ARCHIVE_EXTENSION)
}

fn run_gpg(args: &[String]) -> VaultResult<Output> {
    debug!("Executing 'gpg {}' ...", args.join(" "));
    Command::new("gpg")
        .args(args)
        .output()
        .map_err(|e| VaultError::Encryption(format!("Failed to run gpg: {}", e)))
}

/// Log any tool diagnostics; treat a non-zero exit as a hard failure
fn check_gpg_result(operation: &str, output: &Output) -> VaultResult<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stdout.trim().is_empty() {
        warn!("gpg {} stdout: {}", operation, stdout.trim());
    }
    if !stderr.trim().is_empty() {
        warn!("gpg {} stderr: {}", operation, stderr.trim());
    }

    if !output.status.success() {
        return Err(VaultError::Encryption(format!(
            "gpg {} failed: {}",
            operation,
            stderr.trim()
        )));
    }

    Ok(())
}
