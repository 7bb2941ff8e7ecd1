//! Configuration commands.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The effective configuration rendered as TOML.
pub fn dump_string(config: &ClientConfig) -> ClientResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))
}

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: Option<&Path>) -> ClientResult<()> {
    println!("# config.toml ({})", config_path(path).display());
    println!("{}", dump_string(config)?);
    println!("# store: {}", config.store_path().display());
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: Option<&Path>) -> ClientResult<()> {
    println!("config: {}", config_path(path).display());
    Ok(())
}

fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(ClientConfig::default_path)
}
