// src/config/mod.rs

//! Configuration loading and validation for sitewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate paths, globs and ports (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    load_and_validate, load_from_path, project_root, resolve_config, DEFAULT_CONFIG_FILE,
};
pub use model::{
    ConfigFile, ConfigSection, ImagesSection, ScriptsSection, ServeSection, SiteSection,
    StylesSection, TriggerWhileRunningBehaviour, WatchSection,
};
pub use validate::validate_config;
