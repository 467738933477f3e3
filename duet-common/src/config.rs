//! Configuration file resolution and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-user configuration directory and file
pub const CONFIG_DIR_NAME: &str = "duet";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Where a configuration was ultimately loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line
    CommandLine(PathBuf),
    /// Path taken from an environment variable
    Environment(PathBuf),
    /// Per-user config file in the platform config directory
    UserFile(PathBuf),
    /// No file found; compiled defaults
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserFile(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Per-user TOML config file
/// 4. Compiled defaults (fallback)
///
/// Explicit paths (1 and 2) must exist; a missing per-user file silently
/// falls through to defaults.
pub fn resolve_config_source(cli_arg: Option<&Path>, env_var_name: &str) -> Result<ConfigSource> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(ConfigSource::CommandLine(path.to_path_buf()));
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file named by {} not found: {}",
                    env_var_name,
                    path.display()
                )));
            }
            return Ok(ConfigSource::Environment(path));
        }
    }

    // Priority 3: per-user config file
    if let Some(path) = user_config_file() {
        if path.exists() {
            return Ok(ConfigSource::UserFile(path));
        }
    }

    // Priority 4: compiled defaults
    Ok(ConfigSource::Defaults)
}

/// Platform path of the per-user config file (~/.config/duet/config.toml on Linux)
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load a TOML document from `source`, or `T::default()` when there is no file
pub fn load_toml<T>(source: &ConfigSource) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = source.path() else {
        debug!("No config file, using built-in defaults");
        return Ok(T::default());
    };

    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_toml(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Parse a TOML string into a typed configuration
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> std::result::Result<T, toml::de::Error> {
    toml::from_str(content)
}
