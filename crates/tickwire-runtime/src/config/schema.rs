use serde::Deserialize;
use tickwire_core::error::{IpcError, Result};
use tickwire_core::limits::DEFAULT_INVOKE_TIMEOUT_TICKS;

use crate::ids::validate_namespace;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TickwireConfig {
    pub version: u32,

    pub namespace: String,

    #[serde(default)]
    pub invoke: InvokeSection,

    #[serde(default)]
    pub host: HostSection,
}

impl TickwireConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(IpcError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        validate_namespace(&self.namespace)
            .map_err(|e| IpcError::Config(format!("namespace: {e}")))?;

        self.invoke.validate()?;
        self.host.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvokeSection {
    #[serde(default = "default_timeout_ticks")]
    pub timeout_ticks: u32,
}

impl Default for InvokeSection {
    fn default() -> Self {
        Self {
            timeout_ticks: default_timeout_ticks(),
        }
    }
}

impl InvokeSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=72000).contains(&self.timeout_ticks) {
            return Err(IpcError::Config(
                "invoke.timeout_ticks must be between 1 and 72000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_latency_ticks")]
    pub latency_ticks: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            latency_ticks: default_latency_ticks(),
        }
    }
}

impl HostSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.tick_interval_ms) {
            return Err(IpcError::Config(
                "host.tick_interval_ms must be between 1 and 1000".into(),
            ));
        }
        if !(1..=100).contains(&self.latency_ticks) {
            return Err(IpcError::Config(
                "host.latency_ticks must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_ticks() -> u32 {
    DEFAULT_INVOKE_TIMEOUT_TICKS
}
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_latency_ticks() -> u64 {
    1
}
