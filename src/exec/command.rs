// src/exec/command.rs

//! Running the external static-site generator.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{error, info};

use crate::config::SiteSection;
use crate::engine::ActionOutcome;

/// Name of the platform this binary runs on (`"linux"`, `"macos"`,
/// `"windows"`, ...).
pub fn current_platform() -> &'static str {
    std::env::consts::OS
}

/// Executable name for `base` on `platform`.
///
/// Windows installs Ruby tools as batch wrappers, so `jekyll` becomes
/// `jekyll.bat` there. Names that already carry an extension are kept.
pub fn generator_program(base: &str, platform: &str) -> String {
    let has_extension = Path::new(base).extension().is_some();
    if platform.starts_with("win") && !has_extension {
        format!("{base}.bat")
    } else {
        base.to_string()
    }
}

/// One configured generator invocation (`jekyll build` by default).
#[derive(Debug, Clone)]
pub struct SiteGenerator {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    output_dir: PathBuf,
}

impl SiteGenerator {
    /// Build from the `[site]` section. The generator runs in `root`.
    pub fn from_config(root: &Path, cfg: &SiteSection) -> Self {
        Self {
            program: generator_program(&cfg.generator, current_platform()),
            args: cfg.args.clone(),
            working_dir: root.to_path_buf(),
            output_dir: root.join(&cfg.output_dir),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Directory the generator writes the site to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Human-readable command line, for logs and `--dry-run`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the generator to completion.
    ///
    /// A generator that cannot be started yields `Failed(-1)`; otherwise the
    /// outcome mirrors the exit status. Output goes straight to the terminal.
    /// Dropping the returned future kills the child process.
    pub async fn build(&self) -> ActionOutcome {
        match self.build_inner().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(cmd = %self.command_line(), error = %format!("{err:#}"), "site generator failed to run");
                ActionOutcome::Failed(-1)
            }
        }
    }

    async fn build_inner(&self) -> Result<ActionOutcome> {
        info!(cmd = %self.command_line(), dir = ?self.working_dir, "running site generator");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning site generator '{}'", self.program))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for site generator '{}'", self.program))?;

        let code = status.code().unwrap_or(-1);
        info!(exit_code = code, success = status.success(), "site generator exited");

        Ok(if status.success() {
            ActionOutcome::Success
        } else {
            ActionOutcome::Failed(code)
        })
    }
}
