// src/serve/path.rs

//! Mapping request URLs onto files in the site directory.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file under `site_dir`.
///
/// Directories resolve to their `index.html`. Returns `None` for anything
/// missing or outside `site_dir`, including `..` segments and symlinks that
/// point elsewhere.
pub fn resolve_path(url: &str, site_dir: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    let relative = Path::new(&clean);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let canonical = site_dir.join(relative).canonicalize().ok()?;
    let root = site_dir.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Strip query and fragment, percent-decode, trim slashes.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)?;
    Some(decoded.trim_matches('/').to_string())
}
