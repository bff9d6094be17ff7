// src/watch/hash.rs

//! Content fingerprints for `use_hash` mode.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;
use walkdir::WalkDir;

use crate::engine::Action;
use crate::watch::patterns::WatchTable;
use crate::watch::watcher::relative_str;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash the relative paths and contents of `paths`.
///
/// Input order does not matter. Renaming, adding or removing a file changes
/// the result just like editing one does.
pub fn compute_hash_for_paths(root: &Path, paths: &[PathBuf]) -> Result<String> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();

    let mut hasher = Hasher::new();
    for path in sorted {
        if !path.is_file() {
            continue;
        }
        let rel = relative_str(root, path).unwrap_or_else(|| path.to_string_lossy().into_owned());
        hasher.update(rel.as_bytes());
        hasher.update(&[0]);
        hasher.update(compute_file_hash(path)?.as_bytes());
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Every file under `root` that belongs to `action`'s group.
pub fn collect_group_files(root: &Path, table: &WatchTable, action: Action) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        // Skip excluded trees such as `_site/**` entirely.
        .filter_entry(|e| {
            !e.file_type().is_dir()
                || relative_str(root, e.path())
                    .is_none_or(|rel| rel.is_empty() || !table.is_excluded(&format!("{rel}/")))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            relative_str(root, e.path()).is_some_and(|rel| table.matches(action, &rel))
        })
        .map(|e| e.into_path())
        .collect()
}

/// Last seen fingerprint per action, in memory only.
#[derive(Debug, Default)]
pub struct GroupFingerprints {
    last: HashMap<Action, String>,
}

impl GroupFingerprints {
    /// Recompute `action`'s fingerprint and store it. Returns whether it
    /// differs from the stored one (always true the first time).
    pub fn refresh(&mut self, root: &Path, table: &WatchTable, action: Action) -> Result<bool> {
        let files = collect_group_files(root, table, action);
        let hash = compute_hash_for_paths(root, &files)?;
        let changed = self.last.get(&action) != Some(&hash);
        debug!(%action, files = files.len(), changed, "group fingerprint");
        self.last.insert(action, hash);
        Ok(changed)
    }

    /// Record the current fingerprint of every group.
    pub fn prime(&mut self, root: &Path, table: &WatchTable) -> Result<()> {
        for registration in table.registrations() {
            self.refresh(root, table, registration.action)?;
        }
        Ok(())
    }
}
