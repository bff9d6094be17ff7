// src/compile/images.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::compile::sources::{collect_sources, relative_to};
use crate::compile::{write_if_changed, CancelFlag, CompileReport};
use crate::config::ImagesSection;

/// Copies image files verbatim from `source_dir` to `output_dir`.
#[derive(Debug, Clone)]
pub struct AssetCopier {
    source_dir: PathBuf,
    output_dir: PathBuf,
    extensions: Vec<String>,
}

impl AssetCopier {
    /// Build from the `[images]` section, resolving paths against `root`.
    pub fn from_config(root: &Path, cfg: &ImagesSection) -> Self {
        Self {
            source_dir: root.join(&cfg.source_dir),
            output_dir: root.join(&cfg.output_dir),
            extensions: cfg.extensions.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Copy every matching file, byte for byte. Files with other extensions
    /// are never copied.
    pub fn copy_all(&self) -> Result<CompileReport> {
        self.copy_until(&CancelFlag::new())
    }

    /// [`copy_all`](Self::copy_all), stopping before the next file once
    /// `cancel` is set.
    pub fn copy_until(&self, cancel: &CancelFlag) -> Result<CompileReport> {
        let mut report = CompileReport::default();

        for source in collect_sources(&self.source_dir, &self.extensions)? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let bytes = match fs::read(&source) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.record_failure(&source, e.to_string());
                    continue;
                }
            };

            let output = self.output_dir.join(relative_to(&self.source_dir, &source));
            match write_if_changed(&output, &bytes) {
                Ok(changed) => {
                    debug!(path = ?output, changed, "image copied");
                    report.record_output(output, changed);
                }
                Err(e) => report.record_failure(&source, format!("{e:#}")),
            }
        }

        report.log_summary("images");
        Ok(report)
    }
}
