use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use tickwire_core::error::{IpcError, Result};
use tickwire_core::value::Value;

/// Result of an invoke.
///
/// Await it from async code, or call [`InvokeHandle::try_take`] between
/// ticks. Either way the outcome is delivered once.
pub struct InvokeHandle {
    event: String,
    rx: oneshot::Receiver<Result<Value>>,
}

impl InvokeHandle {
    pub(crate) fn new(event: String, rx: oneshot::Receiver<Result<Value>>) -> Self {
        Self { event, rx }
    }

    /// Event id the invoke was sent to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// `None` while the call is outstanding.
    pub fn try_take(&mut self) -> Option<Result<Value>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(IpcError::Cancelled)),
        }
    }
}

impl Future for InvokeHandle {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(IpcError::Cancelled)))
    }
}
