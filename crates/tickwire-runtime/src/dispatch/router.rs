use std::sync::{Arc, Mutex};

use tickwire_core::codec::PayloadCodec;
use tickwire_core::error::{IpcError, Result};
use tickwire_core::protocol::envelope::{self, TypeFlag};
use tickwire_core::protocol::invoke::InvokePayload;
use tickwire_core::protocol::stream::{Reassembler, StreamChunk};
use tickwire_core::value::{Failure, Value};

use crate::outbound::Outbound;
use crate::registry::{Listener, ListenerRegistry};
use crate::sync::lock;

/// Routes inbound `(event_id, wire)` pairs to the bound listener.
///
/// No registry guard or reassembler lock is held while a listener runs, so
/// listeners may register, remove and send freely.
pub struct Router {
    registry: Arc<ListenerRegistry>,
    codec: Arc<dyn PayloadCodec>,
    outbound: Arc<Outbound>,
    streams: Mutex<Reassembler>,
}

impl Router {
    pub fn new(
        registry: Arc<ListenerRegistry>,
        codec: Arc<dyn PayloadCodec>,
        outbound: Arc<Outbound>,
    ) -> Self {
        Self {
            registry,
            codec,
            outbound,
            streams: Mutex::new(Reassembler::new()),
        }
    }

    /// Partial inbound streams.
    pub fn pending_streams(&self) -> usize {
        lock(&self.streams).pending()
    }

    pub fn dispatch(&self, event_id: &str, wire: &str) -> Result<()> {
        let Some(listener) = self.registry.get(event_id) else {
            tracing::trace!(event = %event_id, "no listener, message dropped");
            self.drop_orphaned_stream(wire);
            return Ok(());
        };
        let env = envelope::decode(wire)?;

        match env.flag {
            TypeFlag::Send => self.deliver(event_id, listener.as_ref(), env.payload),
            TypeFlag::Invoke => self.answer(event_id, listener.as_ref(), env.payload),
            TypeFlag::SendStream | TypeFlag::InvokeStream => {
                let chunk = StreamChunk::parse(env.payload)?;
                tracing::trace!(
                    event = %event_id,
                    stream = %chunk.stream_id,
                    last = chunk.is_last,
                    "fragment received"
                );
                let full = {
                    let mut streams = lock(&self.streams);
                    streams.reassemble(chunk)
                };
                let Some(full) = full else {
                    return Ok(());
                };
                if env.flag == TypeFlag::InvokeStream {
                    self.answer(event_id, listener.as_ref(), &full)
                } else {
                    self.deliver(event_id, listener.as_ref(), &full)
                }
            }
        }
    }

    /// A stream whose listener went away mid-transfer is freed when its
    /// terminal fragment shows up. Anything unparsable is ignored here.
    fn drop_orphaned_stream(&self, wire: &str) {
        let Ok(env) = envelope::decode(wire) else {
            return;
        };
        if !env.flag.is_stream() {
            return;
        }
        if let Ok(chunk) = StreamChunk::parse(env.payload) {
            if chunk.is_last && lock(&self.streams).discard(&chunk.stream_id) {
                tracing::debug!(stream = %chunk.stream_id, "orphaned stream discarded");
            }
        }
    }

    fn deliver(&self, event_id: &str, listener: &dyn Listener, payload: &str) -> Result<()> {
        let value = self.codec.decode(payload)?;
        let returned = call_listener(event_id, listener, value)?;
        if let Value::Failure(f) = returned {
            tracing::warn!(event = %event_id, failure = %f, "listener returned a failure for a one-way send");
        }
        Ok(())
    }

    fn answer(&self, event_id: &str, listener: &dyn Listener, payload: &str) -> Result<()> {
        let request = InvokePayload::parse(payload)?;
        let outcome = self
            .codec
            .decode(request.inner)
            .and_then(|value| call_listener(event_id, listener, value));

        let response = match &outcome {
            Ok(value) => value.clone(),
            Err(e) => Value::Failure(Failure::new(e.remote_message())),
        };
        let sent = self.outbound.respond(request.response_listener_id, &response);

        match outcome {
            Ok(_) => sent,
            Err(e) => {
                if let Err(send_err) = sent {
                    tracing::warn!(
                        event = %event_id,
                        response_listener = %request.response_listener_id,
                        error = %send_err,
                        "failed to send failure response"
                    );
                }
                Err(e)
            }
        }
    }
}

fn call_listener(event_id: &str, listener: &dyn Listener, value: Value) -> Result<Value> {
    match listener.call(value) {
        Ok(v) => Ok(v),
        Err(IpcError::Failure(f)) => Ok(Value::Failure(f)),
        Err(e @ IpcError::Handler { .. }) => Err(e),
        Err(e) => Err(IpcError::Handler {
            event: event_id.to_owned(),
            message: e.to_string(),
        }),
    }
}
