// src/compile/styles.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::compile::sources::{collect_sources, relative_to};
use crate::compile::{minify, write_if_changed, CancelFlag, CompileReport};
use crate::config::StylesSection;

/// Compiles every stylesheet under `source_dir` into `output_dir`.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    source_dir: PathBuf,
    output_dir: PathBuf,
    extensions: Vec<String>,
    minify: bool,
}

impl StyleCompiler {
    /// Build from the `[styles]` section, resolving paths against `root`.
    pub fn from_config(root: &Path, cfg: &StylesSection) -> Self {
        Self {
            source_dir: root.join(&cfg.source_dir),
            output_dir: root.join(&cfg.output_dir),
            extensions: cfg.extensions.clone(),
            minify: cfg.minify,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Compile the whole source tree.
    ///
    /// Partials (file names starting with `_`) are only reachable through
    /// imports and produce no output of their own. A file that fails to
    /// compile is reported and its previous output is left in place; the
    /// other files are still compiled.
    pub fn compile_all(&self) -> Result<CompileReport> {
        self.compile_until(&CancelFlag::new())
    }

    /// [`compile_all`](Self::compile_all), stopping before the next file once
    /// `cancel` is set.
    pub fn compile_until(&self, cancel: &CancelFlag) -> Result<CompileReport> {
        let mut report = CompileReport::default();

        for source in collect_sources(&self.source_dir, &self.extensions)? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if is_partial(&source) {
                debug!(path = ?source, "skipping partial");
                continue;
            }

            let css = match self.compile_one(&source) {
                Ok(css) => css,
                Err(message) => {
                    report.record_failure(&source, message);
                    continue;
                }
            };

            let output = self.output_path(&source);
            let changed = write_if_changed(&output, css.as_bytes())?;
            debug!(path = ?output, changed, "stylesheet compiled");
            report.record_output(output, changed);
        }

        report.log_summary("styles");
        Ok(report)
    }

    /// Where the compiled CSS for `source` goes.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        self.output_dir
            .join(relative_to(&self.source_dir, source))
            .with_extension("css")
    }

    fn compile_one(&self, source: &Path) -> Result<String, String> {
        let options = grass::Options::default()
            .load_path(&self.source_dir)
            .style(grass::OutputStyle::Expanded);
        let css = grass::from_path(source, &options).map_err(|e| e.to_string())?;

        if self.minify {
            minify::minify_css(&css)
        } else {
            Ok(css)
        }
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
