#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sitewatch::config::{ConfigFile, TriggerWhileRunningBehaviour};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with minification on, live reload off
/// and both server ports set to 0 so tests never collide on a port.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = ConfigFile::default();
        config.serve.port = 0;
        config.serve.ws_port = 0;
        config.serve.live_reload = false;
        Self { config }
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running = behaviour;
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.config.use_hash = val;
        self
    }

    pub fn minify(mut self, val: bool) -> Self {
        self.config.styles.minify = val;
        self.config.scripts.minify = val;
        self
    }

    pub fn script_order(mut self, entry: &str) -> Self {
        self.config.scripts.order.push(entry.to_string());
        self
    }

    pub fn generator(mut self, program: &str, args: &[&str]) -> Self {
        self.config.site.generator = program.to_string();
        self.config.site.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn reload_on_failure(mut self, val: bool) -> Self {
        self.config.site.reload_on_failure = val;
        self
    }

    pub fn live_reload(mut self, val: bool) -> Self {
        self.config.serve.live_reload = val;
        self
    }

    pub fn site_watch(mut self, pattern: &str) -> Self {
        self.config.site.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project directory on disk.
pub struct ProjectDir {
    dir: TempDir,
}

impl ProjectDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> std::io::Result<PathBuf> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn mkdir(&self, rel: &str) -> std::io::Result<PathBuf> {
        let path = self.join(rel);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    pub fn read(&self, rel: &str) -> std::io::Result<Vec<u8>> {
        fs::read(self.join(rel))
    }

    pub fn read_to_string(&self, rel: &str) -> std::io::Result<String> {
        fs::read_to_string(self.join(rel))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }
}
