//! Request/response over one-way messages.
//!
//! Each invoke gets a fresh response listener id. The far side answers by
//! sending to that id; whichever of response and timeout lands first
//! resolves the call, the other finds the pending state already taken.

mod handle;
mod pending;

pub use handle::InvokeHandle;

use std::sync::Arc;

use tokio::sync::oneshot;

use tickwire_core::codec::PayloadCodec;
use tickwire_core::error::Result;
use tickwire_core::limits::{char_len, MAX_MESSAGE_LENGTH};
use tickwire_core::protocol::envelope::TypeFlag;
use tickwire_core::protocol::invoke;
use tickwire_core::value::Value;

use crate::ids::IdAllocator;
use crate::outbound::{check_event, OnFinish, Outbound};
use crate::registry::ListenerRegistry;
use crate::scheduler::TickScheduler;

use pending::{PendingInvoke, ResponseListener};

/// Target and behavior of one invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOptions {
    pub event: String,
    /// Skip the event id and payload length checks.
    pub force: bool,
    /// Reject with `IpcError::Failure` instead of resolving to
    /// `Value::Failure`.
    pub throw_failures: bool,
    /// Overrides the endpoint default.
    pub timeout_ticks: Option<u32>,
}

impl InvokeOptions {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            force: false,
            throw_failures: false,
            timeout_ticks: None,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn throw_failures(mut self, throw: bool) -> Self {
        self.throw_failures = throw;
        self
    }

    pub fn timeout_ticks(mut self, ticks: u32) -> Self {
        self.timeout_ticks = Some(ticks);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Single,
    Stream,
    Auto,
}

pub struct Correlator {
    registry: Arc<ListenerRegistry>,
    scheduler: Arc<TickScheduler>,
    outbound: Arc<Outbound>,
    codec: Arc<dyn PayloadCodec>,
    ids: Arc<IdAllocator>,
    default_timeout_ticks: u32,
}

impl Correlator {
    pub fn new(
        registry: Arc<ListenerRegistry>,
        scheduler: Arc<TickScheduler>,
        outbound: Arc<Outbound>,
        codec: Arc<dyn PayloadCodec>,
        ids: Arc<IdAllocator>,
        default_timeout_ticks: u32,
    ) -> Self {
        Self {
            registry,
            scheduler,
            outbound,
            codec,
            ids,
            default_timeout_ticks,
        }
    }

    pub fn default_timeout_ticks(&self) -> u32 {
        self.default_timeout_ticks
    }

    pub fn invoke(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.start(opts, payload, Mode::Single)
    }

    /// Streams the request; the timeout starts once the last fragment is out.
    pub fn invoke_stream(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.start(opts, payload, Mode::Stream)
    }

    pub fn invoke_auto(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.start(opts, payload, Mode::Auto)
    }

    fn start(&self, opts: &InvokeOptions, payload: &Value, mode: Mode) -> Result<InvokeHandle> {
        check_event(&opts.event, opts.force)?;
        let inner = self.codec.encode(payload)?;

        let rlid = self.ids.next_response_listener_id();
        let framed = invoke::join(&rlid, &inner)?;
        let streamed = match mode {
            Mode::Single => false,
            Mode::Stream => true,
            Mode::Auto => char_len(&framed) > MAX_MESSAGE_LENGTH,
        };
        let timeout_ticks = opts.timeout_ticks.unwrap_or(self.default_timeout_ticks);

        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(PendingInvoke::new(
            opts.event.clone(),
            rlid.clone(),
            tx,
            Arc::downgrade(&self.registry),
            Arc::downgrade(&self.scheduler),
        ));
        self.registry.register(
            rlid.as_str(),
            Arc::new(ResponseListener::new(
                Arc::clone(&pending),
                opts.throw_failures,
            )),
        )?;
        tracing::debug!(
            event = %opts.event,
            response_listener = %rlid,
            streamed,
            timeout_ticks,
            "invoke started"
        );

        let sent = if streamed {
            let armed = Arc::clone(&pending);
            let on_finish: OnFinish = Box::new(move |res| match res {
                Ok(()) => armed.arm_timeout(timeout_ticks),
                Err(e) => {
                    armed.resolve(Err(e));
                }
            });
            self.outbound
                .start_stream(TypeFlag::Invoke, &opts.event, &framed, on_finish)
                .map(drop)
        } else {
            pending.arm_timeout(timeout_ticks);
            self.outbound
                .send_encoded(TypeFlag::Invoke, &opts.event, &framed, opts.force)
        };

        if let Err(e) = sent {
            // tear down listener and timer; the error goes back synchronously
            pending.resolve(Err(e.clone()));
            return Err(e);
        }
        Ok(InvokeHandle::new(opts.event.clone(), rx))
    }
}
