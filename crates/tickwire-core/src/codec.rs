//! Pluggable payload serialization.
//!
//! The router and sender only ever see `String` payloads; a [`PayloadCodec`]
//! turns [`Value`]s into those strings and back. [`JsonCodec`] is the default.

use crate::error::{IpcError, Result};
use crate::value::Value;

/// Converts payload values to and from their wire string.
///
/// Implementations must round-trip every `Value`, including `Value::Failure`.
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<String>;
    fn decode(&self, raw: &str) -> Result<Value>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| IpcError::Codec(format!("json encode failed: {e}")))
    }

    fn decode(&self, raw: &str) -> Result<Value> {
        serde_json::from_str(raw).map_err(|e| IpcError::Codec(format!("invalid payload json: {e}")))
    }
}
