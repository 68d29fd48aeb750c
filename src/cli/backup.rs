//! Backup CLI command

use crate::backup::backup;
use crate::config::Config;
use crate::error::VaultResult;

/// Handle the `backup` command
pub fn handle_backup_command(config: &Config) -> VaultResult<()> {
    println!("Backing up direnv files under {}", config.root_dir.display());

    let artifact = backup(config)?;

    println!("Backup created: {}", artifact.display());
    Ok(())
}
