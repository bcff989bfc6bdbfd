//! One protocol endpoint.
//!
//! An `Ipc` owns its listener registry, reassembly buffers and id counters.
//! Any number of endpoints can share one channel and scheduler; they are
//! told apart by namespace.

use std::sync::Arc;

use tickwire_core::codec::{JsonCodec, PayloadCodec};
use tickwire_core::error::Result;
use tickwire_core::value::Value;

use crate::channel::Channel;
use crate::config::TickwireConfig;
use crate::dispatch::Router;
use crate::ids::IdAllocator;
use crate::invoke::{Correlator, InvokeHandle, InvokeOptions};
use crate::outbound::{Outbound, SendHandle, SendOptions};
use crate::registry::{Listener, ListenerRegistry};
use crate::scheduler::TickScheduler;

#[derive(Clone)]
pub struct Ipc {
    inner: Arc<IpcInner>,
}

struct IpcInner {
    ids: Arc<IdAllocator>,
    registry: Arc<ListenerRegistry>,
    outbound: Arc<Outbound>,
    router: Router,
    correlator: Correlator,
}

impl Ipc {
    /// Endpoint with the JSON codec.
    ///
    /// The caller must keep `namespace` unique among endpoints sharing a
    /// channel; generated stream and response listener ids are only unique
    /// within one namespace. [`LoopbackHost::attach`](crate::host::LoopbackHost::attach)
    /// enforces this.
    pub fn new(
        namespace: &str,
        default_timeout_ticks: u32,
        channel: Arc<dyn Channel>,
        scheduler: Arc<TickScheduler>,
    ) -> Result<Self> {
        Self::with_codec(
            namespace,
            default_timeout_ticks,
            channel,
            scheduler,
            Arc::new(JsonCodec),
        )
    }

    pub fn from_config(
        cfg: &TickwireConfig,
        channel: Arc<dyn Channel>,
        scheduler: Arc<TickScheduler>,
    ) -> Result<Self> {
        Self::new(&cfg.namespace, cfg.invoke.timeout_ticks, channel, scheduler)
    }

    pub fn with_codec(
        namespace: &str,
        default_timeout_ticks: u32,
        channel: Arc<dyn Channel>,
        scheduler: Arc<TickScheduler>,
        codec: Arc<dyn PayloadCodec>,
    ) -> Result<Self> {
        let ids = Arc::new(IdAllocator::new(namespace)?);
        let registry = Arc::new(ListenerRegistry::new());
        let outbound = Arc::new(Outbound::new(
            channel,
            Arc::clone(&scheduler),
            Arc::clone(&codec),
            Arc::clone(&ids),
        ));
        let router = Router::new(
            Arc::clone(&registry),
            Arc::clone(&codec),
            Arc::clone(&outbound),
        );
        let correlator = Correlator::new(
            Arc::clone(&registry),
            scheduler,
            Arc::clone(&outbound),
            codec,
            Arc::clone(&ids),
            default_timeout_ticks,
        );

        tracing::debug!(namespace = %namespace, default_timeout_ticks, "ipc endpoint created");
        Ok(Self {
            inner: Arc::new(IpcInner {
                ids,
                registry,
                outbound,
                router,
                correlator,
            }),
        })
    }

    pub fn namespace(&self) -> &str {
        self.inner.ids.namespace()
    }

    pub fn default_timeout_ticks(&self) -> u32 {
        self.inner.correlator.default_timeout_ticks()
    }

    pub fn register_listener<L>(&self, event_id: impl Into<String>, listener: L) -> Result<()>
    where
        L: Listener + 'static,
    {
        self.inner.registry.register(event_id, Arc::new(listener))
    }

    /// Returns whether a listener was bound.
    pub fn remove_listener(&self, event_id: &str) -> bool {
        self.inner.registry.remove(event_id)
    }

    pub fn has_listener(&self, event_id: &str) -> bool {
        self.inner.registry.contains(event_id)
    }

    pub fn send(&self, opts: &SendOptions, payload: &Value) -> Result<()> {
        self.inner.outbound.send(opts, payload)
    }

    pub fn send_stream(&self, opts: &SendOptions, payload: &Value) -> Result<SendHandle> {
        self.inner.outbound.send_stream(opts, payload)
    }

    pub fn send_auto(&self, opts: &SendOptions, payload: &Value) -> Result<SendHandle> {
        self.inner.outbound.send_auto(opts, payload)
    }

    pub fn invoke(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.inner.correlator.invoke(opts, payload)
    }

    pub fn invoke_stream(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.inner.correlator.invoke_stream(opts, payload)
    }

    pub fn invoke_auto(&self, opts: &InvokeOptions, payload: &Value) -> Result<InvokeHandle> {
        self.inner.correlator.invoke_auto(opts, payload)
    }

    /// Inbound entry point for a message seen on the channel.
    pub fn receive(&self, event_id: &str, wire: &str) -> Result<()> {
        self.inner.router.dispatch(event_id, wire)
    }

    /// Inbound streams that started but have not finished.
    pub fn pending_streams(&self) -> usize {
        self.inner.router.pending_streams()
    }
}
