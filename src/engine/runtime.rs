// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ActionBackend;

use super::core::{CoreCommand, CoreRuntime};
use super::RuntimeEvent;

/// Drives the action slots in response to `RuntimeEvent`s and delegates the
/// actual work to an `ActionBackend`.
///
/// All semantics live in `CoreRuntime`; this struct only reads events from
/// the channel and executes the commands the core returns.
pub struct Runtime<B: ActionBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
}

impl<B: ActionBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: ActionBackend> Runtime<B> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Main event loop. Returns when the core asks to stop or every sender
    /// of the event channel is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("sitewatch runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(scheduled) => {
                debug!(action = %scheduled.action, run_id = scheduled.run_id, "dispatching");
                self.backend.dispatch(scheduled).await?;
            }
            CoreCommand::Cancel(scheduled) => {
                debug!(action = %scheduled.action, run_id = scheduled.run_id, "cancelling");
                self.backend.cancel(scheduled);
            }
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
