// src/compile/sources.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Returns true if `path` has one of `extensions` (case-insensitive, no dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Recursively list the files under `dir` matching `extensions`.
///
/// The result is sorted lexically by path, independent of the order the
/// platform happens to enumerate directory entries in.
///
/// A missing or unreadable `dir` is an error.
pub fn collect_sources(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("source directory {:?} does not exist", dir);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking source directory {:?}", dir))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Path of `file` relative to `base`, falling back to the file name.
pub fn relative_to(base: &Path, file: &Path) -> PathBuf {
    match file.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| file.to_path_buf()),
    }
}
