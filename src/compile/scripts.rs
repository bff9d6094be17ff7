// src/compile/scripts.rs

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::compile::sources::collect_sources;
use crate::compile::{minify, write_if_changed, CancelFlag, CompileReport};
use crate::config::ScriptsSection;

/// Separator inserted between concatenated files.
const JOIN_SEPARATOR: &str = "\n";

/// Concatenates every script under `source_dir` into a single bundle.
#[derive(Debug, Clone)]
pub struct ScriptCompiler {
    source_dir: PathBuf,
    output_dir: PathBuf,
    bundle_name: String,
    extensions: Vec<String>,
    order: Vec<PathBuf>,
    minify: bool,
}

impl ScriptCompiler {
    /// Build from the `[scripts]` section, resolving paths against `root`.
    pub fn from_config(root: &Path, cfg: &ScriptsSection) -> Self {
        let source_dir = root.join(&cfg.source_dir);
        let order = cfg
            .order
            .iter()
            .map(|rel| source_dir.join(normalize_entry(rel)))
            .collect();
        Self {
            output_dir: root.join(&cfg.output_dir),
            bundle_name: cfg.bundle_name.clone(),
            extensions: cfg.extensions.clone(),
            order,
            minify: cfg.minify,
            source_dir,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Full path of the bundle this compiler writes.
    pub fn bundle_path(&self) -> PathBuf {
        self.output_dir.join(&self.bundle_name)
    }

    /// Bundle order: the configured `order` entries first, then every other
    /// source in lexical path order.
    pub fn ordered_sources(&self) -> Result<Vec<PathBuf>> {
        let discovered = collect_sources(&self.source_dir, &self.extensions)?;

        let mut ordered: Vec<PathBuf> = self.order.clone();
        ordered.extend(discovered.into_iter().filter(|p| !self.order.contains(p)));
        Ok(ordered)
    }

    /// Build the bundle.
    ///
    /// Every source is syntax-checked first. If any file fails (or cannot be
    /// read), each failure is reported against its own path and the bundle
    /// keeps its previous content.
    pub fn compile_all(&self) -> Result<CompileReport> {
        self.compile_until(&CancelFlag::new())
    }

    /// [`compile_all`](Self::compile_all), giving up before the bundle is
    /// written once `cancel` is set.
    pub fn compile_until(&self, cancel: &CancelFlag) -> Result<CompileReport> {
        let mut report = CompileReport::default();
        let mut parts = Vec::new();

        for source in self.ordered_sources()? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.log_summary("scripts");
                return Ok(report);
            }
            let text = match fs::read_to_string(&source) {
                Ok(text) => text,
                Err(e) => {
                    report.record_failure(&source, e.to_string());
                    continue;
                }
            };
            if let Err(message) = minify::check_js(&text) {
                report.record_failure(&source, message);
                continue;
            }
            debug!(path = ?source, "adding script to bundle");
            parts.push(text);
        }

        let bundle = self.bundle_path();

        if !report.is_clean() {
            warn!(path = ?bundle, "bundle not updated; fix the errors above");
            report.log_summary("scripts");
            return Ok(report);
        }

        let joined = parts.join(JOIN_SEPARATOR);
        let code = if self.minify {
            match minify::minify_js(&joined) {
                Ok(code) => code,
                Err(message) => {
                    report.record_failure(&bundle, message);
                    report.log_summary("scripts");
                    return Ok(report);
                }
            }
        } else {
            joined
        };

        if cancel.is_cancelled() {
            report.cancelled = true;
            report.log_summary("scripts");
            return Ok(report);
        }

        let changed = write_if_changed(&bundle, code.as_bytes())?;
        report.record_output(bundle, changed);
        report.log_summary("scripts");
        Ok(report)
    }
}

/// `./vendor/lib.js` and `vendor//lib.js` name the same file as
/// `vendor/lib.js`; drop the no-op components so the entry compares equal to
/// the discovered path.
fn normalize_entry(rel: &str) -> PathBuf {
    Path::new(rel)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
