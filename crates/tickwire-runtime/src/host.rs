//! In-process host: one bus, one scheduler, many endpoints.
//!
//! Every endpoint sees every message on the bus, the way scripts sharing one
//! event channel do. Endpoints without a listener for an event simply drop it.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickwire_core::error::{IpcError, Result};

use crate::channel::{Channel, LoopbackBus};
use crate::config::{HostSection, TickwireConfig};
use crate::ipc::Ipc;
use crate::scheduler::TickScheduler;
use crate::sync::lock;

pub struct LoopbackHost {
    bus: Arc<LoopbackBus>,
    scheduler: Arc<TickScheduler>,
    endpoints: Mutex<Vec<Ipc>>,
    tick_every: Duration,
}

impl LoopbackHost {
    pub fn new(latency_ticks: u64) -> Self {
        Self::from_section(&HostSection {
            latency_ticks,
            ..HostSection::default()
        })
    }

    pub fn from_section(host: &HostSection) -> Self {
        Self {
            bus: Arc::new(LoopbackBus::new(host.latency_ticks)),
            scheduler: Arc::new(TickScheduler::new()),
            endpoints: Mutex::new(Vec::new()),
            tick_every: Duration::from_millis(host.tick_interval_ms),
        }
    }

    pub fn bus(&self) -> &Arc<LoopbackBus> {
        &self.bus
    }

    pub fn scheduler(&self) -> &Arc<TickScheduler> {
        &self.scheduler
    }

    /// Tick period used by [`LoopbackHost::run`].
    pub fn tick_every(&self) -> Duration {
        self.tick_every
    }

    /// Create and attach an endpoint. Namespaces are unique per host: two
    /// endpoints sharing one would hand out the same stream and response
    /// listener ids.
    pub fn attach(&self, namespace: &str, default_timeout_ticks: u32) -> Result<Ipc> {
        let mut endpoints = lock(&self.endpoints);
        if endpoints.iter().any(|e| e.namespace() == namespace) {
            return Err(IpcError::Validation(format!(
                "namespace '{namespace}' is already attached to this host"
            )));
        }
        let ipc = Ipc::new(
            namespace,
            default_timeout_ticks,
            Arc::clone(&self.bus) as Arc<dyn Channel>,
            Arc::clone(&self.scheduler),
        )?;
        endpoints.push(ipc.clone());
        Ok(ipc)
    }

    pub fn attach_config(&self, cfg: &TickwireConfig) -> Result<Ipc> {
        self.attach(&cfg.namespace, cfg.invoke.timeout_ticks)
    }

    /// Advance the scheduler, then deliver due messages to every endpoint.
    /// Returns the dispatch errors raised this tick.
    pub fn tick(&self) -> Vec<IpcError> {
        self.scheduler.tick();

        let deliveries = self.bus.advance();
        if deliveries.is_empty() {
            return Vec::new();
        }
        let endpoints = lock(&self.endpoints).clone();
        let mut errors = Vec::new();
        for d in &deliveries {
            for ipc in &endpoints {
                if let Err(e) = ipc.receive(&d.event_id, &d.message) {
                    tracing::error!(
                        namespace = %ipc.namespace(),
                        event = %d.event_id,
                        kind = e.kind().as_str(),
                        error = %e,
                        "dispatch failed"
                    );
                    errors.push(e);
                }
            }
        }
        errors
    }

    pub fn run_ticks(&self, n: usize) -> Vec<IpcError> {
        let mut errors = Vec::new();
        for _ in 0..n {
            errors.extend(self.tick());
        }
        errors
    }

    /// Tick every `tick_every` until `fut` completes.
    pub async fn drive<F: Future>(&self, tick_every: Duration, fut: F) -> F::Output {
        tokio::pin!(fut);
        let mut ticker = tokio::time::interval(tick_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first interval tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                out = &mut fut => return out,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// [`LoopbackHost::drive`] at the configured tick period.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        self.drive(self.tick_every, fut).await
    }
}
