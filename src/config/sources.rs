//! Configuration file discovery and loading
//!
//! The config file path is resolved through an ordered list of sources,
//! each of which may or may not produce a path; the first one that does
//! wins:
//!
//! 1. `ENVAULT_CONFIG` environment variable (if set and the path exists)
//! 2. `--config` CLI argument

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::settings::Config;
use crate::error::{VaultError, VaultResult};

/// Environment variable naming the config file path
pub const CONFIG_ENVVAR: &str = "ENVAULT_CONFIG";

/// Resolve the config file path from the ordered source list
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    let sources = [config_path_from_env(), cli_path.map(Path::to_path_buf)];
    sources.into_iter().flatten().next()
}

/// First source: the `ENVAULT_CONFIG` environment variable
fn config_path_from_env() -> Option<PathBuf> {
    let value = std::env::var(CONFIG_ENVVAR).ok()?;
    let path = PathBuf::from(value);
    if path.exists() {
        debug!("{} points at {}", CONFIG_ENVVAR, path.display());
        Some(path)
    } else {
        debug!(
            "{} is set but {} does not exist, trying next source",
            CONFIG_ENVVAR,
            path.display()
        );
        None
    }
}

/// Load and validate the configuration, resolving the path first
pub fn load_config(cli_path: Option<&Path>) -> VaultResult<Config> {
    let path = resolve_config_path(cli_path).ok_or_else(|| {
        VaultError::Config(format!(
            "No config file found: set {} or pass --config",
            CONFIG_ENVVAR
        ))
    })?;
    read_config(&path)
}

/// Read and validate a config file at a known path
pub fn read_config(path: &Path) -> VaultResult<Config> {
    let raw = fs::read_to_string(path).map_err(|e| {
        VaultError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    if raw.trim().is_empty() {
        return Err(VaultError::Config("Config file is empty".into()));
    }

    let config: Config = serde_json::from_str(&raw).map_err(|e| {
        VaultError::Config(format!("Provided config file contains invalid JSON: {}", e))
    })?;

    config.validate()?;

    debug!("Config loaded from {}: {:?}", path.display(), config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    fn write_config_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn valid_config_json() -> &'static str {
        r#"{
            "root_dir": "/data/root",
            "backup_dir": "/data/backups",
            "encrypt_backup": false
        }"#
    }

    #[test]
    fn test_read_config_parses_valid_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config_file(temp.path(), "config.json", valid_config_json());

        let config = read_config(&path).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/data/root"));
        assert!(!config.encrypt_backup);
    }

    #[test]
    fn test_read_config_rejects_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config_file(temp.path(), "config.json", "");

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_read_config_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = write_config_file(temp.path(), "config.json", "{not json");

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_read_config_runs_validation() {
        let temp = TempDir::new().unwrap();
        // encrypt_backup defaults to true, so a recipient is required
        let path = write_config_file(
            temp.path(),
            "config.json",
            r#"{"root_dir": "/r", "backup_dir": "/b"}"#,
        );

        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    // The source-priority cases share the ENVAULT_CONFIG process
    // environment, so they run as one test to keep them off parallel
    // threads.
    #[test]
    fn test_source_priority_chain() {
        let temp = TempDir::new().unwrap();
        let env_path = write_config_file(temp.path(), "env.json", valid_config_json());
        let cli_path = write_config_file(temp.path(), "cli.json", valid_config_json());

        // No source at all
        env::remove_var(CONFIG_ENVVAR);
        let err = load_config(None).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
        assert!(err.to_string().contains("No config file found"));

        // CLI path alone
        assert_eq!(resolve_config_path(Some(&cli_path)).unwrap(), cli_path);

        // Environment variable beats the CLI path
        env::set_var(CONFIG_ENVVAR, &env_path);
        assert_eq!(resolve_config_path(Some(&cli_path)).unwrap(), env_path);

        // A dangling environment variable falls through to the CLI path
        env::set_var(CONFIG_ENVVAR, temp.path().join("does-not-exist.json"));
        assert_eq!(resolve_config_path(Some(&cli_path)).unwrap(), cli_path);

        env::remove_var(CONFIG_ENVVAR);
    }
}
