//! Locating and loading the CLI configuration.

use std::path::{Path, PathBuf};

use jotpad_core::config::AppConfig;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "jotpad";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}

/// Load `config.json` (explicit path or the platform default), apply
/// `JOTPAD_*` environment overrides, and validate.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let config = AppConfig::load_from_path(&path)?.with_env_overrides();
    config.validate()?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Precedence: `--data-dir`, then config/env, then the platform data dir.
pub fn resolve_data_dir(
    cli_data_dir: Option<PathBuf>,
    config: &AppConfig,
) -> Result<PathBuf, CliError> {
    match cli_data_dir.or_else(|| config.data_dir.clone()) {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}
