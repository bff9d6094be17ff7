// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{Action, RuntimeEvent, TriggerReason};
use crate::watch::hash::GroupFingerprints;
use crate::watch::patterns::WatchTable;

/// Watcher tuning taken from `[config]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Quiet period that ends a burst of events.
    pub debounce: Duration,
    /// Suppress triggers whose group content did not change.
    pub use_hash: bool,
}

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops file
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonical paths, which matters where the same
/// directory is reachable under several prefixes (macOS `/private/var`).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize())
        && let Ok(rel) = path_canon.strip_prefix(&root_canon)
    {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    None
}

/// Access events and pure metadata changes (permissions, timestamps) never
/// trigger anything.
pub fn is_ignored_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(_) | EventKind::Modify(ModifyKind::Metadata(_))
    )
}

/// Actions triggered by one notify event.
pub fn actions_for_event(root: &Path, table: &WatchTable, event: &Event) -> BTreeSet<Action> {
    if is_ignored_kind(&event.kind) {
        return BTreeSet::new();
    }

    event
        .paths
        .iter()
        .filter_map(|path| relative_str(root, path))
        .flat_map(|rel| table.actions_for(&rel))
        .collect()
}

/// Watch `root` recursively and send `RuntimeEvent::ActionTriggered` for
/// every action whose pattern group matches a changed path.
///
/// Events are coalesced: after the first relevant event, further events are
/// collected until `options.debounce` passes without one, and each action
/// is triggered once for the whole burst.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    table: Arc<WatchTable>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatchOptions,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Receiver gone means the watch loop has stopped.
                let _ = event_tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        let mut fingerprints = GroupFingerprints::default();
        if options.use_hash
            && let Err(e) = fingerprints.prime(&root, &table)
        {
            warn!(error = %format!("{e:#}"), "failed to fingerprint watch groups");
        }

        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            let mut pending = actions_for_event(&root, &table, &event);
            if pending.is_empty() {
                continue;
            }

            let mut closed = false;
            loop {
                match tokio::time::timeout(options.debounce, event_rx.recv()).await {
                    Ok(Some(event)) => pending.extend(actions_for_event(&root, &table, &event)),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            for action in pending {
                if options.use_hash {
                    match fingerprints.refresh(&root, &table, action) {
                        Ok(false) => {
                            debug!(%action, "content unchanged; trigger suppressed");
                            continue;
                        }
                        Ok(true) => {}
                        Err(e) => warn!(%action, error = %format!("{e:#}"), "fingerprint failed; triggering anyway"),
                    }
                }

                let trigger = RuntimeEvent::ActionTriggered {
                    action,
                    reason: TriggerReason::FileWatch,
                };
                if runtime_tx.send(trigger).await.is_err() {
                    debug!("runtime gone; stopping watch loop");
                    return;
                }
            }

            if closed {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
