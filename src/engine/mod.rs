// src/engine/mod.rs

//! Orchestration engine for the watch loop.
//!
//! This module ties together:
//! - the per-action in-flight guard (what happens when an action is
//!   triggered again while it is still running)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - action completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

/// A rebuild step the watcher can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Recompile stylesheets.
    Styles,
    /// Rebuild the script bundle.
    Scripts,
    /// Recopy images.
    Images,
    /// Run the site generator, then reload connected browsers.
    SiteRebuild,
}

impl Action {
    /// Every action, in a stable order.
    pub const ALL: [Action; 4] = [
        Action::Styles,
        Action::Scripts,
        Action::Images,
        Action::SiteRebuild,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Styles => "styles",
            Action::Scripts => "scripts",
            Action::Images => "images",
            Action::SiteRebuild => "site-rebuild",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    /// Exit code of the generator, `1` for compile failures, `-1` when the
    /// action could not run at all.
    Failed(i32),
}

impl ActionOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

/// Why an action was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (tests, start-up seeding).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// One invocation of an action, as handed to the backend.
///
/// `run_id` is unique per invocation so late completions of a cancelled
/// invocation can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAction {
    pub action: Action,
    pub run_id: u64,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once every action is idle with nothing
    /// pending.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, the backend, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// An action should run.
    ActionTriggered {
        action: Action,
        reason: TriggerReason,
    },
    /// An action invocation finished.
    ActionCompleted {
        action: Action,
        run_id: u64,
        outcome: ActionOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use self::core::{CoreCommand, CoreRuntime, CoreStep};
pub use queue::{ActionSlots, SlotState};
pub use runtime::Runtime;
pub use crate::config::TriggerWhileRunningBehaviour;
