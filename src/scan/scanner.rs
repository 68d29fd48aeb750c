//! Directory tree scanner
//!
//! Walks the tree under a root directory with an explicit work stack and
//! collects every path whose basename (without extension) equals the marker
//! name, pruning excluded subtrees as it goes.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::snapshot::Snapshot;
use crate::error::{VaultError, VaultResult};

/// Basename of the files this tool backs up
pub const MARKER_NAME: &str = ".envrc";

/// Scan the tree under `root`, collecting marker files into a snapshot.
///
/// Exclusion matches each path's basename without its final extension; an
/// excluded directory is pruned entirely, nothing beneath it is visited.
///
/// Quirk, kept on purpose: any path whose stem equals the marker name is
/// collected unconditionally, even a directory. A directory literally named
/// `.envrc` therefore ends up in the snapshot and is never descended into.
pub fn scan(root: &Path, exclude: &HashSet<String>) -> VaultResult<Snapshot> {
    debug!("Scanning direnv files in {}", root.display());

    // BTreeSet gives both set semantics and lexicographic output order.
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();

    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(curr) = stack.pop() {
        if stem_is_excluded(&curr, exclude) {
            continue;
        }

        let entries = fs::read_dir(&curr).map_err(|e| {
            VaultError::Io(format!("Failed to read directory {}: {}", curr.display(), e))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                VaultError::Io(format!(
                    "Failed to read entry in {}: {}",
                    curr.display(),
                    e
                ))
            })?;
            let path = entry.path();

            if path_stem(&path) == Some(MARKER_NAME) {
                found.insert(path);
                continue;
            }

            if stem_is_excluded(&path, exclude) {
                continue;
            }

            if path.is_dir() {
                stack.push(path);
            }
        }
    }

    debug!("Found {} direnv files", found.len());

    Ok(Snapshot::new(found.into_iter().collect()))
}

/// Basename without its final extension, like Python's `Path.stem`
fn path_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn stem_is_excluded(path: &Path, exclude: &HashSet<String>) -> bool {
    path_stem(path).is_some_and(|stem| exclude.contains(stem))
}
