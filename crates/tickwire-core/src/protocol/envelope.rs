//! Envelope: one type-flag character followed by the payload.
//!
//! Wire format: `<flag><payload>`, flag in `'0'..='3'`. The payload is taken
//! verbatim; nothing is escaped.

use std::fmt;

use crate::error::{IpcError, Result};

/// How the router interprets a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlag {
    /// One-way, single message.
    Send,
    /// One-way, one fragment of a stream.
    SendStream,
    /// Two-way, single message.
    Invoke,
    /// Two-way, one fragment of a stream.
    InvokeStream,
}

impl TypeFlag {
    pub fn as_char(self) -> char {
        match self {
            TypeFlag::Send => '0',
            TypeFlag::SendStream => '1',
            TypeFlag::Invoke => '2',
            TypeFlag::InvokeStream => '3',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(TypeFlag::Send),
            '1' => Some(TypeFlag::SendStream),
            '2' => Some(TypeFlag::Invoke),
            '3' => Some(TypeFlag::InvokeStream),
            _ => None,
        }
    }

    pub fn is_stream(self) -> bool {
        matches!(self, TypeFlag::SendStream | TypeFlag::InvokeStream)
    }

    pub fn is_invoke(self) -> bool {
        matches!(self, TypeFlag::Invoke | TypeFlag::InvokeStream)
    }

    /// Streaming counterpart of a single-message flag (identity for stream flags).
    pub fn streamed(self) -> Self {
        match self {
            TypeFlag::Send | TypeFlag::SendStream => TypeFlag::SendStream,
            TypeFlag::Invoke | TypeFlag::InvokeStream => TypeFlag::InvokeStream,
        }
    }
}

impl fmt::Display for TypeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeFlag::Send => "send",
            TypeFlag::SendStream => "send_stream",
            TypeFlag::Invoke => "invoke",
            TypeFlag::InvokeStream => "invoke_stream",
        };
        f.write_str(name)
    }
}

/// Decoded envelope, borrowing the payload from the wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub flag: TypeFlag,
    pub payload: &'a str,
}

/// Encode an envelope.
pub fn encode(flag: TypeFlag, payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 1);
    out.push(flag.as_char());
    out.push_str(payload);
    out
}

/// Decode an envelope. An empty string or unknown flag is a protocol error.
pub fn decode(wire: &str) -> Result<Envelope<'_>> {
    let mut chars = wire.chars();
    let first = chars
        .next()
        .ok_or_else(|| IpcError::Protocol("empty envelope".into()))?;
    let flag = TypeFlag::from_char(first)
        .ok_or_else(|| IpcError::Protocol(format!("unknown type flag: {first:?}")))?;
    Ok(Envelope {
        flag,
        payload: chars.as_str(),
    })
}
