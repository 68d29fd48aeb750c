//! Snapshot model
//!
//! A `Snapshot` is the immutable result of one scan: the sorted list of
//! discovered marker files plus the capture timestamp. It is consumed by
//! the staging step right away; the JSON form exists for tooling and
//! debugging, not as a durable store.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// The result of one scan: file list plus capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Absolute paths of every discovered marker file, sorted, no duplicates
    pub files: Vec<PathBuf>,

    /// Capture time, truncated to whole seconds for deterministic,
    /// human-readable archive naming
    pub timestamp: DateTime<Local>,
}

impl Snapshot {
    /// Build a snapshot captured now
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            timestamp: truncate_to_seconds(Local::now()),
        }
    }

    /// Archive file name derived from the capture timestamp,
    /// e.g. `20220727-181651` (no separators or colons)
    pub fn archive_filename(&self) -> String {
        self.timestamp.format("%Y%m%d-%H%M%S").to_string()
    }
}

/// Zero out sub-second precision
fn truncate_to_seconds(ts: DateTime<Local>) -> DateTime<Local> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Serialize a snapshot to a JSON file
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> VaultResult<()> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| VaultError::Json(format!("Failed to serialize snapshot: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| VaultError::Io(format!("Failed to write snapshot file: {}", e)))?;
    Ok(())
}

/// Read a snapshot back from its JSON file
pub fn read_snapshot(path: &Path) -> VaultResult<Snapshot> {
    let contents = fs::read_to_string(path)
        .map_err(|e| VaultError::Io(format!("Failed to read snapshot file: {}", e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| VaultError::Json(format!("Failed to parse snapshot file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_truncated_to_whole_seconds() {
        let snapshot = Snapshot::new(vec![]);
        assert_eq!(snapshot.timestamp.nanosecond(), 0);
    }

    #[test]
    fn test_archive_filename_format() {
        let snapshot = Snapshot::new(vec![]);
        let name = snapshot.archive_filename();

        // YYYYMMDD-HHMMSS: 15 chars, one dash, no colons
        assert_eq!(name.len(), 15);
        assert_eq!(name.matches('-').count(), 1);
        assert!(!name.contains(':'));
        assert!(name[..8].chars().all(|c| c.is_ascii_digit()));
        assert!(name[9..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("snapshot.json");

        let snapshot = Snapshot::new(vec![
            PathBuf::from("/data/root/.envrc"),
            PathBuf::from("/data/root/foo/.envrc"),
        ]);

        write_snapshot(&snapshot, &path).unwrap();
        let loaded = read_snapshot(&path).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_read_snapshot_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_snapshot(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
    }
}
