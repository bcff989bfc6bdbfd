use std::sync::Arc;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::protocol::envelope::{self, TypeFlag};
use tickwire_core::protocol::stream::StreamChunk;

use crate::channel::Channel;
use crate::scheduler::{Job, JobStep};

/// Called exactly once with the stream's outcome.
pub(crate) type OnFinish = Box<dyn FnOnce(Result<()>) + Send>;

/// Transmits one fragment per step.
///
/// Dropping an unfinished job (cancelled, or its scheduler went away)
/// reports `IpcError::Cancelled`.
pub(crate) struct StreamJob {
    channel: Arc<dyn Channel>,
    flag: TypeFlag,
    event: String,
    stream_id: String,
    fragments: std::vec::IntoIter<StreamChunk>,
    on_finish: Option<OnFinish>,
}

impl StreamJob {
    pub(crate) fn new(
        channel: Arc<dyn Channel>,
        flag: TypeFlag,
        event: String,
        stream_id: String,
        fragments: Vec<StreamChunk>,
        on_finish: OnFinish,
    ) -> Self {
        Self {
            channel,
            flag,
            event,
            stream_id,
            fragments: fragments.into_iter(),
            on_finish: Some(on_finish),
        }
    }

    fn finish(&mut self, outcome: Result<()>) -> JobStep {
        if let Some(f) = self.on_finish.take() {
            f(outcome);
        }
        JobStep::Done
    }
}

impl Job for StreamJob {
    fn step(&mut self) -> JobStep {
        let Some(fragment) = self.fragments.next() else {
            return self.finish(Ok(()));
        };
        let wire = envelope::encode(self.flag, &fragment.to_wire());
        if let Err(e) = self.channel.transmit(&self.event, &wire) {
            tracing::warn!(event = %self.event, stream = %self.stream_id, error = %e, "stream aborted");
            return self.finish(Err(e));
        }
        tracing::trace!(event = %self.event, stream = %self.stream_id, last = fragment.is_last, "fragment sent");
        if fragment.is_last {
            tracing::debug!(event = %self.event, stream = %self.stream_id, "stream finished");
            return self.finish(Ok(()));
        }
        JobStep::Yield
    }
}

impl Drop for StreamJob {
    fn drop(&mut self) {
        if let Some(f) = self.on_finish.take() {
            tracing::debug!(event = %self.event, stream = %self.stream_id, "stream cancelled");
            f(Err(IpcError::Cancelled));
        }
    }
}
