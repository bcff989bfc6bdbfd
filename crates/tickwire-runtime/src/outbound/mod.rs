//! Outbound path: validation, envelope framing and stream scheduling.

mod handle;
mod stream_job;

pub use handle::SendHandle;

use std::sync::Arc;

use tokio::sync::oneshot;

use tickwire_core::codec::PayloadCodec;
use tickwire_core::error::{IpcError, Result};
use tickwire_core::limits::{char_len, MAX_FRAGMENT_LENGTH, MAX_MESSAGE_LENGTH};
use tickwire_core::protocol::envelope::{self, TypeFlag};
use tickwire_core::protocol::stream;
use tickwire_core::value::Value;

use crate::channel::Channel;
use crate::ids::IdAllocator;
use crate::registry::validate_event_id;
use crate::scheduler::{RunId, TickScheduler};

pub(crate) use stream_job::OnFinish;
use stream_job::StreamJob;

/// Target and checks for a one-way send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    pub event: String,
    /// Skip the event id and payload length checks.
    pub force: bool,
}

impl SendOptions {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            force: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Event id checks; `force` only keeps the non-empty rule.
pub(crate) fn check_event(event: &str, force: bool) -> Result<()> {
    if force {
        if event.is_empty() {
            return Err(IpcError::Validation("event id must not be empty".into()));
        }
        return Ok(());
    }
    validate_event_id(event)
}

pub struct Outbound {
    channel: Arc<dyn Channel>,
    scheduler: Arc<TickScheduler>,
    codec: Arc<dyn PayloadCodec>,
    ids: Arc<IdAllocator>,
}

impl Outbound {
    pub fn new(
        channel: Arc<dyn Channel>,
        scheduler: Arc<TickScheduler>,
        codec: Arc<dyn PayloadCodec>,
        ids: Arc<IdAllocator>,
    ) -> Self {
        Self {
            channel,
            scheduler,
            codec,
            ids,
        }
    }

    /// Single message. Payloads over `MAX_MESSAGE_LENGTH` are rejected
    /// unless forced.
    pub fn send(&self, opts: &SendOptions, payload: &Value) -> Result<()> {
        check_event(&opts.event, opts.force)?;
        let encoded = self.codec.encode(payload)?;
        self.send_encoded(TypeFlag::Send, &opts.event, &encoded, opts.force)
    }

    /// Always streamed, one fragment per tick starting next tick.
    pub fn send_stream(&self, opts: &SendOptions, payload: &Value) -> Result<SendHandle> {
        check_event(&opts.event, opts.force)?;
        let encoded = self.codec.encode(payload)?;
        self.stream_with_handle(&opts.event, &encoded)
    }

    /// Streams only when the encoded payload doesn't fit one message.
    pub fn send_auto(&self, opts: &SendOptions, payload: &Value) -> Result<SendHandle> {
        check_event(&opts.event, opts.force)?;
        let encoded = self.codec.encode(payload)?;
        if char_len(&encoded) > MAX_MESSAGE_LENGTH {
            return self.stream_with_handle(&opts.event, &encoded);
        }
        self.send_encoded(TypeFlag::Send, &opts.event, &encoded, opts.force)?;
        Ok(SendHandle::completed())
    }

    /// Answer an invoke on its response listener id.
    pub(crate) fn respond(&self, response_listener_id: &str, value: &Value) -> Result<()> {
        // the handle is not needed; a response stream runs to completion
        self.send_auto(&SendOptions::new(response_listener_id), value)
            .map(drop)
    }

    pub(crate) fn send_encoded(
        &self,
        flag: TypeFlag,
        event: &str,
        payload: &str,
        force: bool,
    ) -> Result<()> {
        if !force && char_len(payload) > MAX_MESSAGE_LENGTH {
            return Err(IpcError::Validation(format!(
                "can't send '{event}' with a message longer than {MAX_MESSAGE_LENGTH} characters"
            )));
        }
        tracing::trace!(event = %event, flag = %flag, len = char_len(payload), "transmit");
        self.channel.transmit(event, &envelope::encode(flag, payload))
    }

    /// Chunk `payload` and schedule a job that transmits one fragment per
    /// tick. `flag` is the single-message flag; its stream variant goes on
    /// the wire.
    pub(crate) fn start_stream(
        &self,
        flag: TypeFlag,
        event: &str,
        payload: &str,
        on_finish: OnFinish,
    ) -> Result<RunId> {
        let stream_id = self.ids.next_stream_id();
        let fragments = stream::chunk(payload, &stream_id, MAX_FRAGMENT_LENGTH)?;
        tracing::debug!(
            event = %event,
            stream = %stream_id,
            fragments = fragments.len(),
            "stream started"
        );
        let job = StreamJob::new(
            Arc::clone(&self.channel),
            flag.streamed(),
            event.to_owned(),
            stream_id,
            fragments,
            on_finish,
        );
        Ok(self.scheduler.run_job(Box::new(job)))
    }

    fn stream_with_handle(&self, event: &str, payload: &str) -> Result<SendHandle> {
        let (tx, rx) = oneshot::channel();
        let on_finish: OnFinish = Box::new(move |res| {
            // receiver may already be gone
            let _ = tx.send(res);
        });
        let run = self.start_stream(TypeFlag::Send, event, payload, on_finish)?;
        Ok(SendHandle::pending(rx, run, Arc::downgrade(&self.scheduler)))
    }
}
