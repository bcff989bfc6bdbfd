//! Shared error type across tickwire crates.

use thiserror::Error;

use crate::value::Failure;

/// Stable error kinds (for logs, tests and callers that branch on category).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A namespace, event id or payload exceeded a configured limit.
    Validation,
    /// A listener is already bound to the event id.
    DuplicateRegistration,
    /// An invoke received no response in time.
    Timeout,
    /// The remote handler explicitly returned a `Failure`.
    ApplicationFailure,
    /// A local listener returned an error.
    Handler,
    /// Malformed wire data.
    Protocol,
    /// Payload (de)serialization failed.
    Codec,
    /// The channel refused the message.
    Transport,
    /// The pending operation was dropped or cancelled.
    Cancelled,
    /// Invalid configuration.
    Config,
}

impl ErrorKind {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ApplicationFailure => "APPLICATION_FAILURE",
            ErrorKind::Handler => "HANDLER",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Codec => "CODEC",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, IpcError>;

/// Unified error type used by core and runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IpcError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("can't register listener for event '{0}': a listener for this event has already been registered")]
    DuplicateRegistration(String),
    #[error("invoke '{event}' timed out: did not receive a response")]
    Timeout { event: String },
    #[error("failure: {0}")]
    Failure(Failure),
    #[error("listener for '{event}' failed: {message}")]
    Handler { event: String, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("config error: {0}")]
    Config(String),
}

impl IpcError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IpcError::Validation(_) => ErrorKind::Validation,
            IpcError::DuplicateRegistration(_) => ErrorKind::DuplicateRegistration,
            IpcError::Timeout { .. } => ErrorKind::Timeout,
            IpcError::Failure(_) => ErrorKind::ApplicationFailure,
            IpcError::Handler { .. } => ErrorKind::Handler,
            IpcError::Protocol(_) => ErrorKind::Protocol,
            IpcError::Codec(_) => ErrorKind::Codec,
            IpcError::Transport(_) => ErrorKind::Transport,
            IpcError::Cancelled => ErrorKind::Cancelled,
            IpcError::Config(_) => ErrorKind::Config,
        }
    }

    /// Message carried back to a remote invoker when a local listener errors.
    ///
    /// Application failures keep their own message so the far side sees
    /// `"boom"` rather than `"failure: boom"`.
    pub fn remote_message(&self) -> String {
        match self {
            IpcError::Failure(f) => f.message().to_owned(),
            IpcError::Handler { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<Failure> for IpcError {
    fn from(f: Failure) -> Self {
        IpcError::Failure(f)
    }
}
