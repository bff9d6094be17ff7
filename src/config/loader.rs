// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::{Result, SitewatchError};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Sitewatch.toml";

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Resolve the configuration used for a run.
///
/// - An explicit path must exist.
/// - Without one, [`DEFAULT_CONFIG_FILE`] is used when present, otherwise the
///   built-in defaults apply.
///
/// Returns the validated config and the path it came from, if any.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(SitewatchError::Config(format!(
                "config file {:?} does not exist",
                path
            )));
        }
        return Ok((load_and_validate(path)?, Some(path.to_path_buf())));
    }

    let default = default_config_path();
    if default.is_file() {
        return Ok((load_and_validate(&default)?, Some(default)));
    }

    debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
    let config = ConfigFile::default();
    validate_config(&config)?;
    Ok((config, None))
}

/// Default config location: `Sitewatch.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Project root: every relative path and watch pattern is resolved here.
///
/// - A config path with a non-empty parent (e.g. `site/Sitewatch.toml`) uses
///   that directory.
/// - A bare file name, or no config file at all, uses the working directory.
pub fn project_root(config_path: Option<&Path>) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
