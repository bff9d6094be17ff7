// src/compile/mod.rs

//! Asset compilation: stylesheets, the script bundle and image copies.
//!
//! - [`styles`] compiles every stylesheet to minified CSS.
//! - [`scripts`] concatenates script files into one minified bundle.
//! - [`images`] copies image files verbatim.
//!
//! Each compiler recompiles its whole source tree on every call. Errors in a
//! single file are collected in the [`CompileReport`] and logged; they never
//! abort the call, so a long-running watcher keeps serving the last good
//! output for that file.

pub mod images;
pub mod minify;
pub mod scripts;
pub mod sources;
pub mod styles;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::errors::SitewatchError;

pub use images::AssetCopier;
pub use scripts::ScriptCompiler;
pub use styles::StyleCompiler;

/// Stop signal for a compile run that lives on the blocking pool, where
/// aborting the owning task has no effect. Checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a single compiler invocation did.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Outputs whose content changed and were (re)written.
    pub written: Vec<PathBuf>,
    /// Outputs that already had the exact bytes and were left untouched.
    pub unchanged: Vec<PathBuf>,
    /// Per-file failures (`SitewatchError::Compile`).
    pub failures: Vec<SitewatchError>,
    /// The run stopped early on a [`CancelFlag`]; outputs not listed above
    /// were left as they were.
    pub cancelled: bool,
}

impl CompileReport {
    /// True when no file failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every output path the call produced, written or unchanged.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.written
            .iter()
            .chain(self.unchanged.iter())
            .map(PathBuf::as_path)
    }

    pub(crate) fn record_output(&mut self, path: PathBuf, changed: bool) {
        if changed {
            self.written.push(path);
        } else {
            self.unchanged.push(path);
        }
    }

    pub(crate) fn record_failure(&mut self, path: &Path, message: impl Into<String>) {
        let failure = SitewatchError::Compile {
            path: path.to_path_buf(),
            message: message.into(),
        };
        error!("{failure}");
        self.failures.push(failure);
    }

    /// Log a one-line summary for `label`.
    pub fn log_summary(&self, label: &str) {
        if self.cancelled {
            info!(step = label, written = self.written.len(), "compile cancelled");
            return;
        }
        info!(
            step = label,
            written = self.written.len(),
            unchanged = self.unchanged.len(),
            failed = self.failures.len(),
            "compile finished"
        );
    }
}

/// Write `contents` to `path` unless the file already holds exactly these
/// bytes. Parent directories are created as needed.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<bool> {
    if let Ok(existing) = fs::read(path)
        && existing == contents
    {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("writing file {:?}", path))?;
    Ok(true)
}
