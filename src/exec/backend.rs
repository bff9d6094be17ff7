// src/exec/backend.rs

//! Pluggable action backend abstraction.
//!
//! The runtime talks to an `ActionBackend` instead of running work itself.
//! Production uses [`PipelineBackend`]; tests provide their own backend that
//! records dispatches and emits `ActionCompleted` events directly.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::compile::CancelFlag;
use crate::engine::{Action, RuntimeEvent, ScheduledAction};
use crate::errors::Result;
use crate::pipeline::Pipeline;

/// Trait abstracting how scheduled actions are executed.
pub trait ActionBackend: Send {
    /// Start `scheduled`. Completion is reported asynchronously as a
    /// `RuntimeEvent::ActionCompleted` carrying the same `run_id`.
    fn dispatch(
        &mut self,
        scheduled: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Abort `scheduled` if it is still running. A cancelled invocation
    /// reports no completion.
    fn cancel(&mut self, scheduled: ScheduledAction);
}

struct InFlight {
    run_id: u64,
    cancel: CancelFlag,
    handle: JoinHandle<()>,
}

impl InFlight {
    /// Aborting the task drops the generator child; compile work on the
    /// blocking pool only stops at the flag.
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Backend running actions through a shared [`Pipeline`], one Tokio task
/// per invocation.
pub struct PipelineBackend {
    pipeline: Arc<Pipeline>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    in_flight: HashMap<Action, InFlight>,
}

impl PipelineBackend {
    pub fn new(pipeline: Arc<Pipeline>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            pipeline,
            runtime_tx,
            in_flight: HashMap::new(),
        }
    }
}

impl ActionBackend for PipelineBackend {
    fn dispatch(
        &mut self,
        scheduled: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.runtime_tx.clone();
        let ScheduledAction { action, run_id } = scheduled;
        let cancel = CancelFlag::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = pipeline.run_action_until(action, task_cancel).await;
            if tx
                .send(RuntimeEvent::ActionCompleted {
                    action,
                    run_id,
                    outcome,
                })
                .await
                .is_err()
            {
                debug!(%action, run_id, "runtime gone; dropping completion");
            }
        });

        self.in_flight.insert(
            action,
            InFlight {
                run_id,
                cancel,
                handle,
            },
        );
        Box::pin(async { Ok(()) })
    }

    fn cancel(&mut self, scheduled: ScheduledAction) {
        let current = self
            .in_flight
            .get(&scheduled.action)
            .is_some_and(|running| running.run_id == scheduled.run_id);

        if let Some(running) = current
            .then(|| self.in_flight.remove(&scheduled.action))
            .flatten()
        {
            info!(action = %scheduled.action, run_id = scheduled.run_id, "cancelling running action");
            running.stop();
        } else {
            debug!(
                action = %scheduled.action,
                run_id = scheduled.run_id,
                "nothing to cancel; invocation already replaced or finished"
            );
        }
    }
}

impl Drop for PipelineBackend {
    fn drop(&mut self) {
        for (_, running) in self.in_flight.drain() {
            running.stop();
        }
    }
}
