//! Stream fragments for payloads larger than one message.
//!
//! Fragment wire payload: `<stream_id> <f|t> <content>`, `t` on the last
//! fragment only. `content` is everything after the second space.
//!
//! Transport precondition: fragments of one stream arrive in send order.
//! Nothing here resequences; reordered fragments reassemble into garbage.

use std::collections::HashMap;

use crate::error::{IpcError, Result};
use crate::limits::MAX_STREAM_ID_LENGTH;

/// One fragment of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub stream_id: String,
    pub is_last: bool,
    pub content: String,
}

impl StreamChunk {
    /// Fragment wire payload (without the envelope flag).
    pub fn to_wire(&self) -> String {
        let mut out = String::with_capacity(self.stream_id.len() + 3 + self.content.len());
        out.push_str(&self.stream_id);
        out.push(' ');
        out.push(if self.is_last { 't' } else { 'f' });
        out.push(' ');
        out.push_str(&self.content);
        out
    }

    pub fn parse(payload: &str) -> Result<Self> {
        let (stream_id, rest) = payload
            .split_once(' ')
            .ok_or_else(|| IpcError::Protocol("stream fragment missing stream id".into()))?;
        let (flag, content) = rest
            .split_once(' ')
            .ok_or_else(|| IpcError::Protocol("stream fragment missing continuation flag".into()))?;
        let is_last = match flag {
            "t" => true,
            "f" => false,
            other => {
                return Err(IpcError::Protocol(format!(
                    "invalid continuation flag: {other:?}"
                )))
            }
        };
        if stream_id.is_empty() {
            return Err(IpcError::Protocol("stream fragment has empty stream id".into()));
        }
        Ok(Self {
            stream_id: stream_id.to_owned(),
            is_last,
            content: content.to_owned(),
        })
    }
}

/// Reject ids that would break the space-separated fragment format.
pub fn validate_stream_id(stream_id: &str) -> Result<()> {
    if stream_id.is_empty() {
        return Err(IpcError::Protocol("stream id must not be empty".into()));
    }
    if stream_id.chars().any(char::is_whitespace) {
        return Err(IpcError::Protocol(format!(
            "stream id must not contain whitespace: {stream_id:?}"
        )));
    }
    if stream_id.chars().count() > MAX_STREAM_ID_LENGTH {
        return Err(IpcError::Protocol(format!(
            "stream id longer than {MAX_STREAM_ID_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Slice `payload` into fragments of `max_fragment` characters.
///
/// The last fragment holds the remainder. An empty payload still produces one
/// (empty) terminal fragment so the receiver always sees the end of stream.
pub fn chunk(payload: &str, stream_id: &str, max_fragment: usize) -> Result<Vec<StreamChunk>> {
    validate_stream_id(stream_id)?;
    if max_fragment == 0 {
        return Err(IpcError::Validation("fragment size must be at least 1".into()));
    }

    let mut out = Vec::new();
    let mut rest = payload;
    loop {
        match rest.char_indices().nth(max_fragment).map(|(i, _)| i) {
            Some(split) => {
                let (head, tail) = rest.split_at(split);
                out.push(StreamChunk {
                    stream_id: stream_id.to_owned(),
                    is_last: false,
                    content: head.to_owned(),
                });
                rest = tail;
            }
            None => {
                out.push(StreamChunk {
                    stream_id: stream_id.to_owned(),
                    is_last: true,
                    content: rest.to_owned(),
                });
                return Ok(out);
            }
        }
    }
}

/// Partial stream buffers keyed by stream id.
///
/// An entry exists only between a stream's first fragment and its terminal
/// fragment.
#[derive(Debug, Default)]
pub struct Reassembler {
    pending: HashMap<String, String>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment. Returns the full payload once the terminal fragment
    /// arrives.
    pub fn reassemble(&mut self, chunk: StreamChunk) -> Option<String> {
        let StreamChunk {
            stream_id,
            is_last,
            content,
        } = chunk;

        if is_last {
            let mut full = self.pending.remove(&stream_id).unwrap_or_default();
            full.push_str(&content);
            return Some(full);
        }

        self.pending.entry(stream_id).or_default().push_str(&content);
        None
    }

    /// Number of streams that have started but not finished.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop a partial stream. Returns whether it existed.
    pub fn discard(&mut self, stream_id: &str) -> bool {
        self.pending.remove(stream_id).is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reassemble_all(chunks: Vec<StreamChunk>) -> String {
        let mut r = Reassembler::new();
        let mut out = None;
        for c in chunks {
            assert!(out.is_none(), "fragment after terminal fragment");
            out = r.reassemble(c);
        }
        assert_eq!(r.pending(), 0);
        out.unwrap()
    }

    #[test]
    fn short_payload_is_one_terminal_fragment() {
        let chunks = chunk("hello", "ns.0", 5).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_last);
        assert_eq!(chunks[0].content, "hello");
    }

    #[test]
    fn empty_payload_still_terminates() {
        let chunks = chunk("", "ns.0", 8).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_last);
        assert_eq!(chunks[0].content, "");
        assert_eq!(reassemble_all(chunks), "");
    }

    #[test]
    fn greedy_split_with_remainder() {
        let chunks = chunk("abcdefghij", "ns.1", 4).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["abcd", "efgh", "ij"]);
        assert_eq!(
            chunks.iter().map(|c| c.is_last).collect::<Vec<_>>(),
            [false, false, true]
        );
    }

    #[test]
    fn exact_multiple_has_full_last_fragment() {
        let chunks = chunk("abcdefgh", "ns.1", 4).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "efgh");
    }

    #[test]
    fn splits_on_char_boundaries() {
        let s = "héllo wörld ✓✓✓";
        let chunks = chunk(s, "ns.2", 3).unwrap();
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 3));
        assert_eq!(reassemble_all(chunks), s);
    }

    #[test]
    fn reassembles_many_sizes() {
        let s: String = (0..200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for size in [1, 2, 7, 199, 200, 201] {
            assert_eq!(reassemble_all(chunk(&s, "ns.3", size).unwrap()), s);
        }
    }

    #[test]
    fn interleaved_streams_are_independent() {
        let mut a = chunk("aaaaaa", "x.0", 2).unwrap().into_iter();
        let mut b = chunk("bbbb", "y.0", 2).unwrap().into_iter();
        let mut r = Reassembler::new();

        assert_eq!(r.reassemble(a.next().unwrap()), None);
        assert_eq!(r.reassemble(b.next().unwrap()), None);
        assert_eq!(r.reassemble(a.next().unwrap()), None);
        assert_eq!(r.pending(), 2);
        assert_eq!(r.reassemble(b.next().unwrap()).as_deref(), Some("bbbb"));
        assert_eq!(r.reassemble(a.next().unwrap()).as_deref(), Some("aaaaaa"));
        assert_eq!(r.pending(), 0);
        assert!(!r.discard("x.0"));
    }

    #[test]
    fn wire_roundtrip_keeps_spaces_in_content() {
        let c = StreamChunk {
            stream_id: "ns.9".into(),
            is_last: false,
            content: " a  b ".into(),
        };
        assert_eq!(c.to_wire(), "ns.9 f  a  b ");
        assert_eq!(StreamChunk::parse(&c.to_wire()).unwrap(), c);
    }

    #[test]
    fn rejects_whitespace_in_stream_id() {
        let err = chunk("x", "bad id", 4).unwrap_err();
        assert_eq!(err.kind().as_str(), "PROTOCOL");
    }

    #[test]
    fn rejects_zero_fragment_size() {
        assert!(chunk("x", "ns.0", 0).is_err());
    }
}
