use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sitewatch::engine::{ActionOutcome, RuntimeEvent, ScheduledAction};
use sitewatch::errors::Result;
use sitewatch::exec::ActionBackend;
use sitewatch::pipeline::ReloadNotifier;
use tokio::sync::mpsc;

/// What a `RecordingBackend` saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Dispatch(ScheduledAction),
    Cancel(ScheduledAction),
}

/// A fake backend that:
/// - records every dispatch and cancel
/// - when `auto_complete` is set, immediately reports `ActionCompleted`
///   with that outcome for each dispatched invocation.
pub struct RecordingBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    auto_complete: Option<ActionOutcome>,
}

impl RecordingBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        calls: Arc<Mutex<Vec<BackendCall>>>,
        auto_complete: Option<ActionOutcome>,
    ) -> Self {
        Self {
            runtime_tx,
            calls,
            auto_complete,
        }
    }
}

impl ActionBackend for RecordingBackend {
    fn dispatch(
        &mut self,
        scheduled: ScheduledAction,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let calls = Arc::clone(&self.calls);
        let auto_complete = self.auto_complete;

        Box::pin(async move {
            {
                let mut guard = calls.lock().unwrap();
                guard.push(BackendCall::Dispatch(scheduled));
            }

            if let Some(outcome) = auto_complete {
                tx.send(RuntimeEvent::ActionCompleted {
                    action: scheduled.action,
                    run_id: scheduled.run_id,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel(&mut self, scheduled: ScheduledAction) {
        self.calls.lock().unwrap().push(BackendCall::Cancel(scheduled));
    }
}

/// Reload target that only counts notifications.
#[derive(Debug, Default)]
pub struct CountingNotifier {
    count: AtomicUsize,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadNotifier for CountingNotifier {
    fn reload(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst);
        1
    }
}
