// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{Result, SitewatchError};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - every extension list is non-empty
/// - `scripts.bundle_name` is a plain file name
/// - `scripts.order` holds relative paths, none listed twice
/// - `site.generator` is set
/// - no output directory lives inside its own source directory
/// - every watch / exclude glob compiles
/// - HTTP and live-reload ports differ
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_extensions(cfg)?;
    validate_scripts(cfg)?;
    validate_site(cfg)?;
    validate_dirs(cfg)?;
    validate_globs(cfg)?;
    validate_serve(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitewatchError {
    SitewatchError::Config(msg.into())
}

fn validate_extensions(cfg: &ConfigFile) -> Result<()> {
    let lists = [
        ("styles", &cfg.styles.extensions),
        ("scripts", &cfg.scripts.extensions),
        ("images", &cfg.images.extensions),
    ];
    for (section, exts) in lists {
        if exts.is_empty() {
            return Err(config_error(format!(
                "[{section}].extensions must list at least one extension"
            )));
        }
        if let Some(bad) = exts.iter().find(|e| e.trim().is_empty() || e.contains('/')) {
            return Err(config_error(format!(
                "[{section}].extensions contains an invalid extension {bad:?}"
            )));
        }
    }
    Ok(())
}

fn validate_scripts(cfg: &ConfigFile) -> Result<()> {
    let name = cfg.scripts.bundle_name.trim();
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        return Err(config_error(format!(
            "[scripts].bundle_name must be a plain file name (got {:?})",
            cfg.scripts.bundle_name
        )));
    }

    let mut seen = HashSet::new();
    for entry in &cfg.scripts.order {
        let relative = Path::new(entry)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !relative || entry.trim().is_empty() {
            return Err(config_error(format!(
                "[scripts].order entry {entry:?} must be a path relative to source_dir"
            )));
        }
        let normalized: PathBuf = Path::new(entry)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        if !seen.insert(normalized) {
            return Err(config_error(format!(
                "[scripts].order lists {entry:?} more than once"
            )));
        }
    }
    Ok(())
}

fn validate_site(cfg: &ConfigFile) -> Result<()> {
    if cfg.site.generator.trim().is_empty() {
        return Err(config_error("[site].generator must not be empty"));
    }
    Ok(())
}

fn validate_dirs(cfg: &ConfigFile) -> Result<()> {
    let pairs = [
        ("styles", &cfg.styles.source_dir, &cfg.styles.output_dir),
        ("scripts", &cfg.scripts.source_dir, &cfg.scripts.output_dir),
        ("images", &cfg.images.source_dir, &cfg.images.output_dir),
    ];
    for (section, source, output) in pairs {
        if Path::new(output).starts_with(Path::new(source)) {
            return Err(config_error(format!(
                "[{section}].output_dir {output:?} must not be inside source_dir {source:?}"
            )));
        }
    }
    Ok(())
}

fn validate_globs(cfg: &ConfigFile) -> Result<()> {
    let patterns = cfg
        .site
        .watch
        .iter()
        .map(|p| ("[site].watch", p))
        .chain(cfg.watch.exclude.iter().map(|p| ("[watch].exclude", p)));

    for (key, pattern) in patterns {
        Glob::new(pattern)
            .map_err(|e| config_error(format!("{key} has invalid glob {pattern:?}: {e}")))?;
    }
    Ok(())
}

fn validate_serve(cfg: &ConfigFile) -> Result<()> {
    if cfg.serve.live_reload && cfg.serve.port != 0 && cfg.serve.port == cfg.serve.ws_port {
        return Err(config_error(format!(
            "[serve].port and [serve].ws_port must differ (both {})",
            cfg.serve.port
        )));
    }
    Ok(())
}
