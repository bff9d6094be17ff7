// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces:
//! - an updated slot state
//! - a list of commands describing what the IO shell should do next
//!
//! It has no channels, no Tokio types and performs no IO, so it can be
//! tested without processes or a filesystem.

use tracing::{info, warn};

use crate::engine::queue::ActionSlots;
use crate::engine::{
    Action, ActionOutcome, RuntimeEvent, RuntimeOptions, ScheduledAction, TriggerReason,
    TriggerWhileRunningBehaviour,
};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start this invocation on the backend.
    Dispatch(ScheduledAction),
    /// Abort this invocation.
    Cancel(ScheduledAction),
    /// Request that the runtime exits (every action idle, `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CoreRuntime {
    slots: ActionSlots,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, options: RuntimeOptions) -> Self {
        Self {
            slots: ActionSlots::new(behaviour),
            options,
        }
    }

    /// Expose whether every action is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.slots.all_idle()
    }

    pub fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::ActionTriggered { action, reason } => self.on_trigger(action, reason),
            RuntimeEvent::ActionCompleted {
                action,
                run_id,
                outcome,
            } => self.on_completion(action, run_id, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn on_trigger(&mut self, action: Action, reason: TriggerReason) -> CoreStep {
        info!(%action, ?reason, "action triggered");
        CoreStep {
            commands: self.slots.record_trigger(action),
            keep_running: true,
        }
    }

    fn on_completion(&mut self, action: Action, run_id: u64, outcome: ActionOutcome) -> CoreStep {
        match outcome {
            ActionOutcome::Success => info!(%action, run_id, "action completed"),
            ActionOutcome::Failed(code) => warn!(%action, run_id, code, "action failed"),
        }

        let mut commands = self.slots.record_completion(action, run_id);

        let mut keep_running = true;
        if self.options.exit_when_idle && self.slots.all_idle() {
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}
