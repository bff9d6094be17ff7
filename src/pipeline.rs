// src/pipeline.rs

//! The concrete work behind each [`Action`].
//!
//! Compilers are synchronous and run on Tokio's blocking pool; the site
//! generator is a child process. Browser reloads go through a
//! [`ReloadNotifier`] so the dev server can be swapped out in tests.
//!
//! Each action holds its own run lock for as long as its work really runs.
//! Blocking compiles outlive an aborted task, so the lock travels into the
//! blocking closure; a restarted action waits for the old run to stop.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info};

use crate::compile::{AssetCopier, CancelFlag, CompileReport, ScriptCompiler, StyleCompiler};
use crate::config::ConfigFile;
use crate::engine::{Action, ActionOutcome};
use crate::exec::SiteGenerator;

/// Something that can tell connected browsers to reload.
pub trait ReloadNotifier: Send + Sync {
    /// Broadcast a reload. Returns how many clients were notified.
    fn reload(&self) -> usize;
}

/// One lock per action.
#[derive(Debug, Default)]
struct RunLocks {
    styles: Arc<Mutex<()>>,
    scripts: Arc<Mutex<()>>,
    images: Arc<Mutex<()>>,
    site: Arc<Mutex<()>>,
}

impl RunLocks {
    async fn acquire(&self, action: Action) -> OwnedMutexGuard<()> {
        let lock = match action {
            Action::Styles => &self.styles,
            Action::Scripts => &self.scripts,
            Action::Images => &self.images,
            Action::SiteRebuild => &self.site,
        };
        if lock.try_lock().is_err() {
            debug!(%action, "waiting for the previous run to stop");
        }
        Arc::clone(lock).lock_owned().await
    }
}

pub struct Pipeline {
    styles: StyleCompiler,
    scripts: ScriptCompiler,
    images: AssetCopier,
    site: SiteGenerator,
    reload: Option<Arc<dyn ReloadNotifier>>,
    reload_on_failure: bool,
    locks: RunLocks,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("styles", &self.styles)
            .field("scripts", &self.scripts)
            .field("images", &self.images)
            .field("site", &self.site)
            .field("live_reload", &self.reload.is_some())
            .field("reload_on_failure", &self.reload_on_failure)
            .finish()
    }
}

impl Pipeline {
    /// Build every step from `cfg`, resolving paths against `root`.
    pub fn from_config(root: &Path, cfg: &ConfigFile) -> Self {
        Self {
            styles: StyleCompiler::from_config(root, &cfg.styles),
            scripts: ScriptCompiler::from_config(root, &cfg.scripts),
            images: AssetCopier::from_config(root, &cfg.images),
            site: SiteGenerator::from_config(root, &cfg.site),
            reload: None,
            reload_on_failure: cfg.site.reload_on_failure,
            locks: RunLocks::default(),
        }
    }

    /// Attach the notifier used after site rebuilds.
    pub fn with_reload(mut self, notifier: Arc<dyn ReloadNotifier>) -> Self {
        self.reload = Some(notifier);
        self
    }

    pub fn styles(&self) -> &StyleCompiler {
        &self.styles
    }

    pub fn scripts(&self) -> &ScriptCompiler {
        &self.scripts
    }

    pub fn images(&self) -> &AssetCopier {
        &self.images
    }

    pub fn site(&self) -> &SiteGenerator {
        &self.site
    }

    pub async fn compile_styles(&self) -> Result<CompileReport> {
        self.compile_until(Action::Styles, CancelFlag::new()).await
    }

    pub async fn compile_scripts(&self) -> Result<CompileReport> {
        self.compile_until(Action::Scripts, CancelFlag::new()).await
    }

    pub async fn copy_images(&self) -> Result<CompileReport> {
        self.compile_until(Action::Images, CancelFlag::new()).await
    }

    /// Run one of the compile actions on the blocking pool.
    async fn compile_until(&self, action: Action, cancel: CancelFlag) -> Result<CompileReport> {
        type Job = Box<dyn FnOnce(&CancelFlag) -> Result<CompileReport> + Send>;

        let job: Job = match action {
            Action::Styles => {
                let compiler = self.styles.clone();
                Box::new(move |cancel| compiler.compile_until(cancel))
            }
            Action::Scripts => {
                let compiler = self.scripts.clone();
                Box::new(move |cancel| compiler.compile_until(cancel))
            }
            Action::Images => {
                let copier = self.images.clone();
                Box::new(move |cancel| copier.copy_until(cancel))
            }
            Action::SiteRebuild => anyhow::bail!("{action} is not a compile step"),
        };

        let guard = self.locks.acquire(action).await;
        Ok(tokio::task::spawn_blocking(move || {
            let _guard = guard;
            job(&cancel)
        })
        .await??)
    }

    /// Run the generator once, without reloading anyone.
    pub async fn build_site(&self) -> ActionOutcome {
        let _guard = self.locks.acquire(Action::SiteRebuild).await;
        self.site.build().await
    }

    /// Run the generator, then reload browsers.
    ///
    /// After a failed build the reload is skipped unless
    /// `site.reload_on_failure` is set, so the browser keeps showing the
    /// last good page.
    pub async fn rebuild_site(&self) -> ActionOutcome {
        let outcome = self.build_site().await;

        if !outcome.is_success() && !self.reload_on_failure {
            info!(?outcome, "site build failed; skipping browser reload");
            return outcome;
        }

        if let Some(notifier) = &self.reload {
            let clients = notifier.reload();
            info!(clients, "browser reload sent");
        }
        outcome
    }

    /// Run `action` and map the result to an outcome.
    pub async fn run_action(&self, action: Action) -> ActionOutcome {
        self.run_action_until(action, CancelFlag::new()).await
    }

    /// [`run_action`](Self::run_action) with a stop signal for the compile
    /// actions. The generator is stopped by dropping the future instead.
    pub async fn run_action_until(&self, action: Action, cancel: CancelFlag) -> ActionOutcome {
        if action == Action::SiteRebuild {
            return self.rebuild_site().await;
        }

        match self.compile_until(action, cancel).await {
            Ok(report) if report.cancelled => ActionOutcome::Failed(-1),
            Ok(report) if report.is_clean() => ActionOutcome::Success,
            Ok(_) => ActionOutcome::Failed(1),
            Err(err) => {
                error!(%action, error = %format!("{err:#}"), "action could not run");
                ActionOutcome::Failed(-1)
            }
        }
    }
}
