//! Endpoint/host config loader (strict parsing).

pub mod schema;

use std::fs;

use tickwire_core::error::{IpcError, Result};

pub use schema::{HostSection, InvokeSection, TickwireConfig};

pub fn load_from_file(path: &str) -> Result<TickwireConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| IpcError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<TickwireConfig> {
    let cfg: TickwireConfig = serde_yaml::from_str(s)
        .map_err(|e| IpcError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
