// src/engine/queue.rs

use std::collections::BTreeMap;

use tracing::debug;

use super::core::CoreCommand;
use super::{Action, ScheduledAction, TriggerWhileRunningBehaviour};

/// In-flight state of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    /// An invocation is running. `pending` records that one more run was
    /// requested meanwhile (queue mode only).
    Running { run_id: u64, pending: bool },
}

/// One single-slot guard per action.
///
/// Semantics:
/// - An action never overlaps itself; different actions are independent.
/// - `Queue`: a trigger while running marks one pending re-run. Any number
///   of further triggers coalesce into that same re-run, which starts as
///   soon as the current invocation completes.
/// - `Cancel`: a trigger while running cancels the current invocation and
///   dispatches a fresh one right away.
/// - Completions carrying a `run_id` other than the running one are stale
///   (typically from a cancelled invocation) and ignored.
#[derive(Debug)]
pub struct ActionSlots {
    behaviour: TriggerWhileRunningBehaviour,
    slots: BTreeMap<Action, SlotState>,
    run_counter: u64,
}

impl ActionSlots {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        let slots = Action::ALL
            .iter()
            .map(|&action| (action, SlotState::Idle))
            .collect();
        Self {
            behaviour,
            slots,
            run_counter: 0,
        }
    }

    /// Current state of `action`.
    pub fn state_of(&self, action: Action) -> SlotState {
        self.slots.get(&action).copied().unwrap_or(SlotState::Idle)
    }

    /// True when no action is running or pending.
    pub fn all_idle(&self) -> bool {
        self.slots.values().all(|s| *s == SlotState::Idle)
    }

    /// Record a trigger for `action` and return what the shell should do.
    pub fn record_trigger(&mut self, action: Action) -> Vec<CoreCommand> {
        match self.state_of(action) {
            SlotState::Idle => vec![CoreCommand::Dispatch(self.start(action))],
            SlotState::Running { run_id, pending } => match self.behaviour {
                TriggerWhileRunningBehaviour::Queue => {
                    debug!(
                        %action,
                        run_id,
                        already_pending = pending,
                        "action running; re-run queued (queue mode)"
                    );
                    self.slots.insert(
                        action,
                        SlotState::Running {
                            run_id,
                            pending: true,
                        },
                    );
                    Vec::new()
                }
                TriggerWhileRunningBehaviour::Cancel => {
                    debug!(%action, run_id, "action running; restarting (cancel mode)");
                    let old = ScheduledAction { action, run_id };
                    let new = self.start(action);
                    vec![CoreCommand::Cancel(old), CoreCommand::Dispatch(new)]
                }
            },
        }
    }

    /// Record that invocation `run_id` of `action` finished.
    pub fn record_completion(&mut self, action: Action, run_id: u64) -> Vec<CoreCommand> {
        match self.state_of(action) {
            SlotState::Running {
                run_id: current,
                pending,
            } if current == run_id => {
                if pending {
                    debug!(%action, "starting queued re-run");
                    vec![CoreCommand::Dispatch(self.start(action))]
                } else {
                    self.slots.insert(action, SlotState::Idle);
                    Vec::new()
                }
            }
            state => {
                debug!(%action, run_id, ?state, "ignoring stale completion");
                Vec::new()
            }
        }
    }

    fn start(&mut self, action: Action) -> ScheduledAction {
        self.run_counter += 1;
        let run_id = self.run_counter;
        self.slots.insert(
            action,
            SlotState::Running {
                run_id,
                pending: false,
            },
        );
        ScheduledAction { action, run_id }
    }
}
