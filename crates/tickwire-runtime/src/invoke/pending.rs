use std::sync::{Arc, Mutex, Weak};

use tokio::sync::oneshot;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::value::Value;

use crate::registry::{Listener, ListenerRegistry};
use crate::scheduler::{RunId, TickScheduler};
use crate::sync::lock;

/// State of one outstanding invoke. Resolution is a take-once on `sender`.
pub(crate) struct PendingInvoke {
    event: String,
    response_listener_id: String,
    sender: Mutex<Option<oneshot::Sender<Result<Value>>>>,
    timer: Mutex<Option<RunId>>,
    registry: Weak<ListenerRegistry>,
    scheduler: Weak<TickScheduler>,
}

impl PendingInvoke {
    pub(crate) fn new(
        event: String,
        response_listener_id: String,
        sender: oneshot::Sender<Result<Value>>,
        registry: Weak<ListenerRegistry>,
        scheduler: Weak<TickScheduler>,
    ) -> Self {
        Self {
            event,
            response_listener_id,
            sender: Mutex::new(Some(sender)),
            timer: Mutex::new(None),
            registry,
            scheduler,
        }
    }

    fn is_resolved(&self) -> bool {
        lock(&self.sender).is_none()
    }

    pub(crate) fn arm_timeout(self: &Arc<Self>, ticks: u32) {
        if self.is_resolved() {
            return;
        }
        let Some(scheduler) = self.scheduler.upgrade() else {
            self.resolve(Err(IpcError::Cancelled));
            return;
        };
        let me = Arc::clone(self);
        let run = scheduler.run_timeout(ticks, move || {
            let event = me.event.clone();
            if me.resolve(Err(IpcError::Timeout { event })) {
                tracing::warn!(event = %me.event, response_listener = %me.response_listener_id, "invoke timed out");
            }
        });
        *lock(&self.timer) = Some(run);
    }

    /// Settle the call. Only the first caller wins; it removes the response
    /// listener and clears the timer. Returns whether this call won.
    pub(crate) fn resolve(&self, outcome: Result<Value>) -> bool {
        let Some(sender) = lock(&self.sender).take() else {
            return false;
        };
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.response_listener_id);
        }
        let timer = lock(&self.timer).take();
        if let (Some(run), Some(scheduler)) = (timer, self.scheduler.upgrade()) {
            scheduler.clear_run(run);
        }
        tracing::debug!(
            event = %self.event,
            response_listener = %self.response_listener_id,
            ok = outcome.is_ok(),
            "invoke resolved"
        );
        // caller may have dropped the handle
        let _ = sender.send(outcome);
        true
    }
}

/// One-shot listener bound to a response listener id.
pub(crate) struct ResponseListener {
    pending: Arc<PendingInvoke>,
    throw_failures: bool,
}

impl ResponseListener {
    pub(crate) fn new(pending: Arc<PendingInvoke>, throw_failures: bool) -> Self {
        Self {
            pending,
            throw_failures,
        }
    }
}

impl Listener for ResponseListener {
    fn call(&self, payload: Value) -> Result<Value> {
        let outcome = match payload {
            Value::Failure(f) if self.throw_failures => Err(IpcError::Failure(f)),
            other => Ok(other),
        };
        self.pending.resolve(outcome);
        Ok(Value::Null)
    }
}
