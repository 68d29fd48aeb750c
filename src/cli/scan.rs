//! Scan CLI command
//!
//! Lists the files a backup would include, without touching the backup
//! store. Useful for checking exclusion rules.

use crate::config::Config;
use crate::error::{VaultError, VaultResult};
use crate::scan::scan;

/// Handle the `scan` command
pub fn handle_scan_command(config: &Config, json: bool) -> VaultResult<()> {
    let snapshot = scan(&config.root_dir, &config.exclude)?;

    if json {
        let rendered = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| VaultError::Json(format!("Failed to serialize snapshot: {}", e)))?;
        println!("{}", rendered);
    } else {
        for path in &snapshot.files {
            println!("{}", path.display());
        }
        println!("Found {} direnv file(s)", snapshot.files.len());
    }

    Ok(())
}
