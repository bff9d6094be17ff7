// src/lib.rs

pub mod cli;
pub mod compile;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::compile::CompileReport;
use crate::config::{project_root, resolve_config, ConfigFile};
use crate::engine::{ActionOutcome, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{Result, SitewatchError};
use crate::exec::PipelineBackend;
use crate::watch::{spawn_watcher, WatchOptions, WatchTable};

pub use crate::pipeline::{Pipeline, ReloadNotifier};
pub use crate::serve::{DevServer, ReloadHandle};

/// High-level entry point used by `main.rs`.
///
/// Resolves the config and project root, then runs either one build step
/// or the full development workflow.
pub async fn run(args: CliArgs) -> Result<()> {
    let (cfg, config_path) = resolve_config(args.config.as_deref().map(Path::new))?;
    let root = project_root(config_path.as_deref());
    let command = args.command.unwrap_or(Command::Dev);

    if args.dry_run {
        print_dry_run(&cfg, &root, command)?;
        return Ok(());
    }

    let pipeline = Pipeline::from_config(&root, &cfg);

    match command {
        Command::Styles => require_clean("styles", pipeline.compile_styles().await?),
        Command::Scripts => require_clean("scripts", pipeline.compile_scripts().await?),
        Command::Images => require_clean("images", pipeline.copy_images().await?),
        Command::SiteBuild => match pipeline.build_site().await {
            ActionOutcome::Success => Ok(()),
            ActionOutcome::Failed(code) => Err(SitewatchError::SiteBuild { code }),
        },
        Command::Dev => run_dev(&root, &cfg, pipeline).await,
    }
}

fn require_clean(step: &str, report: CompileReport) -> Result<()> {
    if report.is_clean() {
        return Ok(());
    }
    Err(anyhow!("{step}: {} file(s) failed to compile", report.failures.len()).into())
}

/// The development workflow.
///
/// Strictly in order: scripts, styles, initial site build, dev server, then
/// the watcher and the runtime until Ctrl-C. Compile failures and a failed
/// initial build are logged and start-up continues; filesystem errors abort.
pub async fn run_dev(root: &Path, cfg: &ConfigFile, pipeline: Pipeline) -> Result<()> {
    pipeline.compile_scripts().await?;
    pipeline.compile_styles().await?;

    if let ActionOutcome::Failed(code) = pipeline.build_site().await {
        warn!(code, "initial site build failed; serving whatever is on disk");
    }

    let server = DevServer::start(&cfg.serve, pipeline.site().output_dir())?;
    info!("serving at {}", server.url());

    let pipeline = Arc::new(pipeline.with_reload(Arc::new(server.reload_handle())));
    let table = Arc::new(WatchTable::from_config(cfg)?);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher = spawn_watcher(
        root,
        table,
        rt_tx.clone(),
        WatchOptions {
            debounce: Duration::from_millis(cfg.config.debounce_ms),
            use_hash: cfg.config.use_hash,
        },
    )?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(cfg.config.triggered_while_running, RuntimeOptions::default());
    let backend = PipelineBackend::new(pipeline, rt_tx);
    Runtime::new(core, rt_rx, backend).run().await?;

    drop(server);
    info!("dev session finished");
    Ok(())
}

/// Print the resolved configuration and watch table.
fn print_dry_run(cfg: &ConfigFile, root: &Path, command: Command) -> Result<()> {
    let pipeline = Pipeline::from_config(root, cfg);
    let table = WatchTable::from_config(cfg)?;

    println!("sitewatch dry-run");
    println!("  command = {command:?}");
    println!("  root = {}", root.display());
    println!(
        "  config.triggered_while_running = {:?}",
        cfg.config.triggered_while_running
    );
    println!("  config.debounce_ms = {}", cfg.config.debounce_ms);
    println!("  config.use_hash = {}", cfg.config.use_hash);
    println!();

    println!("steps:");
    println!(
        "  styles:  {} -> {}",
        pipeline.styles().source_dir().display(),
        pipeline.styles().output_dir().display()
    );
    println!(
        "  scripts: {} -> {}",
        pipeline.scripts().source_dir().display(),
        pipeline.scripts().bundle_path().display()
    );
    println!(
        "  images:  {} -> {}",
        cfg.images.source_dir,
        pipeline.images().output_dir().display()
    );
    println!("  site:    {}", pipeline.site().command_line());
    println!(
        "  serve:   http://{}:{} (live reload: {}, ws port {})",
        cfg.serve.interface, cfg.serve.port, cfg.serve.live_reload, cfg.serve.ws_port
    );
    println!();

    println!("watch:");
    for registration in table.registrations() {
        println!("  - {} <- {:?}", registration.action, registration.patterns);
    }
    if !cfg.watch.exclude.is_empty() {
        println!("  exclude: {:?}", cfg.watch.exclude);
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
