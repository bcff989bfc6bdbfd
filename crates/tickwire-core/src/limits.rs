//! Wire limits, all derived from the channel's hard length cap.
//!
//! Every length in tickwire is counted in characters (Unicode scalar values),
//! never bytes.

/// Max serialized envelope payload length (excluding the type flag).
pub const MAX_MESSAGE_LENGTH: usize = 2048;

/// Max namespace length.
pub const MAX_NAMESPACE_LENGTH: usize = 48;

/// Max event id length.
pub const MAX_EVENT_ID_LENGTH: usize = 96;

/// Decimal digits of the largest `u64` counter.
const MAX_COUNTER_DIGITS: usize = 20;

/// Longest stream id: `<namespace>.<counter>`.
pub const MAX_STREAM_ID_LENGTH: usize = MAX_NAMESPACE_LENGTH + 1 + MAX_COUNTER_DIGITS;

/// Response listener id infix: `<namespace>:__rl<counter>`.
pub const RESPONSE_LISTENER_INFIX: &str = ":__rl";

/// Longest response listener id.
pub const MAX_RESPONSE_LISTENER_ID_LENGTH: usize =
    MAX_NAMESPACE_LENGTH + RESPONSE_LISTENER_INFIX.len() + MAX_COUNTER_DIGITS;

/// Per-fragment overhead: stream id, continuation flag and two separators.
pub const STREAM_MESSAGE_PADDING: usize = MAX_STREAM_ID_LENGTH + 3;

/// Content characters carried by one stream fragment.
pub const MAX_FRAGMENT_LENGTH: usize = MAX_MESSAGE_LENGTH - STREAM_MESSAGE_PADDING;

/// Ticks an invoke waits for its response unless configured otherwise.
pub const DEFAULT_INVOKE_TIMEOUT_TICKS: u32 = 20;

const _: () = assert!(MAX_RESPONSE_LISTENER_ID_LENGTH <= MAX_EVENT_ID_LENGTH);
const _: () = assert!(STREAM_MESSAGE_PADDING < MAX_MESSAGE_LENGTH);

/// Character length as the channel counts it.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
