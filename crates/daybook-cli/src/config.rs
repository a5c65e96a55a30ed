//! Config file discovery for the CLI.

use std::path::{Path, PathBuf};

use daybook_core::config::ClientConfig;

use crate::error::CliError;

const CONFIG_DIR_NAME: &str = "daybook";
const CONFIG_FILE_NAME: &str = "config.json";

/// Config file location: the explicit path, or `<config dir>/daybook/config.json`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Could not determine config directory".to_string()))
}

/// Load the config file and apply `DAYBOOK_*` environment overrides.
pub fn load_config(path: &Path) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load_from_path(path)?;
    config.apply_env()?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
