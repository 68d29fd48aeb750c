//! Restore CLI command

use crate::backup::restore;
use crate::config::Config;
use crate::error::VaultResult;

/// Handle the `restore` command
pub fn handle_restore_command(config: &Config) -> VaultResult<()> {
    println!(
        "Restoring the most recent backup from {}",
        config.backup_dir.display()
    );

    restore(config)?;

    println!("Restore complete: {}", config.root_dir.display());
    Ok(())
}
