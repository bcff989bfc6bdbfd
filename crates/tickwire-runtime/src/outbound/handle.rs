use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use tickwire_core::error::{IpcError, Result};

use crate::scheduler::{RunId, TickScheduler};

/// Completion of a send. Resolves once the last fragment has been handed to
/// the channel (immediately for single-message sends).
///
/// Dropping the handle does not stop the stream; use [`SendHandle::cancel`].
pub struct SendHandle {
    rx: oneshot::Receiver<Result<()>>,
    run: Option<RunId>,
    scheduler: Weak<TickScheduler>,
}

impl SendHandle {
    pub(crate) fn completed() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(()));
        Self {
            rx,
            run: None,
            scheduler: Weak::new(),
        }
    }

    pub(crate) fn pending(
        rx: oneshot::Receiver<Result<()>>,
        run: RunId,
        scheduler: Weak<TickScheduler>,
    ) -> Self {
        Self {
            rx,
            run: Some(run),
            scheduler,
        }
    }

    /// Stop a stream that is still transmitting. The handle then resolves to
    /// `IpcError::Cancelled`. Returns whether anything was still running.
    pub fn cancel(&self) -> bool {
        match (self.run, self.scheduler.upgrade()) {
            (Some(run), Some(scheduler)) => scheduler.clear_run(run),
            _ => false,
        }
    }

    /// Outcome without a task context; `None` while still transmitting.
    /// Yields the outcome once; later calls report `Cancelled`.
    pub fn try_take(&mut self) -> Option<Result<()>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(IpcError::Cancelled)),
        }
    }
}

impl Future for SendHandle {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(IpcError::Cancelled)))
    }
}
