//! Namespace validation and per-endpoint id generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::limits::{char_len, MAX_NAMESPACE_LENGTH, RESPONSE_LISTENER_INFIX};

/// Namespaces prefix every generated id, so they may not contain whitespace
/// (ids are space-delimited on the wire) or `:` (reserved for the response
/// listener infix).
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(IpcError::Validation("namespace must not be empty".into()));
    }
    if char_len(namespace) > MAX_NAMESPACE_LENGTH {
        return Err(IpcError::Validation(format!(
            "namespace can't be longer than {MAX_NAMESPACE_LENGTH} characters"
        )));
    }
    if namespace.chars().any(|c| c.is_whitespace() || c == ':') {
        return Err(IpcError::Validation(format!(
            "namespace '{namespace}' must not contain whitespace or ':'"
        )));
    }
    Ok(())
}

/// Monotonic stream and response-listener ids for one endpoint.
pub struct IdAllocator {
    namespace: Arc<str>,
    streams: AtomicU64,
    invokes: AtomicU64,
}

impl IdAllocator {
    pub fn new(namespace: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        Ok(Self {
            namespace: Arc::from(namespace),
            streams: AtomicU64::new(0),
            invokes: AtomicU64::new(0),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `<namespace>.<counter>`
    pub fn next_stream_id(&self) -> String {
        let n = self.streams.fetch_add(1, Ordering::Relaxed);
        format!("{}.{n}", self.namespace)
    }

    /// `<namespace>:__rl<counter>`
    pub fn next_response_listener_id(&self) -> String {
        let n = self.invokes.fetch_add(1, Ordering::Relaxed);
        format!("{}{RESPONSE_LISTENER_INFIX}{n}", self.namespace)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tickwire_core::limits::{MAX_RESPONSE_LISTENER_ID_LENGTH, MAX_STREAM_ID_LENGTH};

    #[test]
    fn ids_are_sequential_and_distinct_per_kind() {
        let ids = IdAllocator::new("demo").unwrap();
        assert_eq!(ids.next_stream_id(), "demo.0");
        assert_eq!(ids.next_stream_id(), "demo.1");
        assert_eq!(ids.next_response_listener_id(), "demo:__rl0");
        assert_eq!(ids.next_response_listener_id(), "demo:__rl1");
    }

    #[test]
    fn namespace_rules() {
        assert!(validate_namespace("ok_ns-1").is_ok());
        for bad in ["", "has space", "a:b", "tab\there"] {
            let err = validate_namespace(bad).unwrap_err();
            assert_eq!(err.kind().as_str(), "VALIDATION", "{bad:?}");
        }
        let long = "n".repeat(MAX_NAMESPACE_LENGTH + 1);
        assert!(validate_namespace(&long).is_err());
        assert!(validate_namespace(&long[1..]).is_ok());
    }

    #[test]
    fn longest_ids_fit_their_limits() {
        let ns = "n".repeat(MAX_NAMESPACE_LENGTH);
        let ids = IdAllocator::new(&ns).unwrap();
        ids.streams.store(u64::MAX, Ordering::Relaxed);
        ids.invokes.store(u64::MAX, Ordering::Relaxed);
        assert_eq!(char_len(&ids.next_stream_id()), MAX_STREAM_ID_LENGTH);
        assert_eq!(
            char_len(&ids.next_response_listener_id()),
            MAX_RESPONSE_LISTENER_ID_LENGTH
        );
    }
}
