//! Event id -> listener table.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::limits::{char_len, MAX_EVENT_ID_LENGTH};
use tickwire_core::value::Value;

/// Handles one event.
///
/// The returned value is the response to an invoke and is ignored for plain
/// sends. Returning `Err(IpcError::Failure(..))` is the same as returning
/// `Ok(Value::Failure(..))`; any other error is reported back to the invoker
/// as a `Failure` and surfaces locally as `IpcError::Handler`.
pub trait Listener: Send + Sync {
    fn call(&self, payload: Value) -> Result<Value>;
}

impl<F> Listener for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn call(&self, payload: Value) -> Result<Value> {
        self(payload)
    }
}

/// Event id rules shared by registration and sending.
pub fn validate_event_id(event_id: &str) -> Result<()> {
    if event_id.is_empty() {
        return Err(IpcError::Validation("event id must not be empty".into()));
    }
    if char_len(event_id) > MAX_EVENT_ID_LENGTH {
        return Err(IpcError::Validation(format!(
            "event id can't be longer than {MAX_EVENT_ID_LENGTH} characters"
        )));
    }
    if event_id.chars().any(char::is_whitespace) {
        return Err(IpcError::Validation(format!(
            "event id '{event_id}' must not contain whitespace"
        )));
    }
    Ok(())
}

/// At most one listener per event id.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<String, Arc<dyn Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, event_id: impl Into<String>, listener: Arc<dyn Listener>) -> Result<()> {
        let event_id = event_id.into();
        validate_event_id(&event_id)?;
        match self.listeners.entry(event_id) {
            Entry::Occupied(e) => Err(IpcError::DuplicateRegistration(e.key().clone())),
            Entry::Vacant(e) => {
                tracing::debug!(event = %e.key(), "listener registered");
                e.insert(listener);
                Ok(())
            }
        }
    }

    /// Returns whether a listener was bound.
    pub fn remove(&self, event_id: &str) -> bool {
        let removed = self.listeners.remove(event_id);
        if removed.is_some() {
            tracing::debug!(event = %event_id, "listener removed");
        }
        removed.is_some()
    }

    /// Snapshot the listener so it can be called without holding the shard.
    pub fn get(&self, event_id: &str) -> Option<Arc<dyn Listener>> {
        self.listeners.get(event_id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.listeners.contains_key(event_id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn echo() -> Arc<dyn Listener> {
        Arc::new(|v: Value| -> Result<Value> { Ok(v) })
    }

    #[test]
    fn duplicate_is_rejected_until_removed() {
        let reg = ListenerRegistry::new();
        reg.register("a:b", echo()).unwrap();

        let err = reg.register("a:b", echo()).unwrap_err();
        assert_eq!(err, IpcError::DuplicateRegistration("a:b".into()));

        assert!(reg.remove("a:b"));
        assert!(!reg.remove("a:b"));
        reg.register("a:b", echo()).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn event_id_limits() {
        let reg = ListenerRegistry::new();
        let max = "e".repeat(MAX_EVENT_ID_LENGTH);
        reg.register(max.clone(), echo()).unwrap();
        assert!(reg.contains(&max));

        let err = reg.register(format!("{max}e"), echo()).unwrap_err();
        assert_eq!(err.kind().as_str(), "VALIDATION");
        assert!(reg.register("", echo()).is_err());
        assert!(reg.register("a b", echo()).is_err());
    }

    #[test]
    fn snapshot_outlives_removal() {
        let reg = ListenerRegistry::new();
        reg.register("x", echo()).unwrap();
        let snap = reg.get("x").unwrap();
        reg.remove("x");
        assert_eq!(snap.call(Value::from(7)).unwrap(), Value::from(7));
        assert!(reg.get("x").is_none());
        assert!(reg.is_empty());
    }
}
