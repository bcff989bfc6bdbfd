//! Invoke payload framing: `<response_listener_id> <inner>`.

use crate::error::{IpcError, Result};

/// Split invoke payload. `inner` is everything after the first space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokePayload<'a> {
    pub response_listener_id: &'a str,
    pub inner: &'a str,
}

impl<'a> InvokePayload<'a> {
    pub fn parse(payload: &'a str) -> Result<Self> {
        let (response_listener_id, inner) = payload
            .split_once(' ')
            .ok_or_else(|| IpcError::Protocol("invoke payload missing response listener id".into()))?;
        if response_listener_id.is_empty() {
            return Err(IpcError::Protocol("invoke payload has empty response listener id".into()));
        }
        Ok(Self {
            response_listener_id,
            inner,
        })
    }
}

/// Prefix `inner` with the response listener id.
pub fn join(response_listener_id: &str, inner: &str) -> Result<String> {
    if response_listener_id.is_empty() || response_listener_id.chars().any(char::is_whitespace) {
        return Err(IpcError::Validation(format!(
            "invalid response listener id: {response_listener_id:?}"
        )));
    }
    let mut out = String::with_capacity(response_listener_id.len() + 1 + inner.len());
    out.push_str(response_listener_id);
    out.push(' ');
    out.push_str(inner);
    Ok(out)
}
