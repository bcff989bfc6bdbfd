//! In-process bus with per-message delivery latency.

use std::collections::VecDeque;
use std::sync::Mutex;

use tickwire_core::error::{IpcError, Result};
use tickwire_core::limits::{char_len, MAX_EVENT_ID_LENGTH, MAX_MESSAGE_LENGTH};

use super::Channel;
use crate::sync::lock;

/// Longest `event_id + message` the bus accepts. The extra character is the
/// envelope type flag.
pub const HOST_MESSAGE_CAP: usize = MAX_EVENT_ID_LENGTH + 1 + MAX_MESSAGE_LENGTH;

/// A message that reached its delivery tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event_id: String,
    pub message: String,
}

struct Queued {
    due: u64,
    delivery: Delivery,
}

#[derive(Default)]
struct BusState {
    now: u64,
    queue: VecDeque<Queued>,
    transmitted: u64,
}

/// Messages come out in send order, `latency_ticks` advances after they
/// went in.
pub struct LoopbackBus {
    latency_ticks: u64,
    state: Mutex<BusState>,
}

impl LoopbackBus {
    pub fn new(latency_ticks: u64) -> Self {
        Self {
            latency_ticks: latency_ticks.max(1),
            state: Mutex::new(BusState::default()),
        }
    }

    /// Move the bus clock forward one tick and return what is now due.
    pub fn advance(&self) -> Vec<Delivery> {
        let mut state = lock(&self.state);
        state.now += 1;
        let now = state.now;
        let mut due = Vec::new();
        while state.queue.front().is_some_and(|q| q.due <= now) {
            if let Some(q) = state.queue.pop_front() {
                due.push(q.delivery);
            }
        }
        due
    }

    /// Messages sent but not yet delivered.
    pub fn in_flight(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Messages accepted since creation.
    pub fn transmitted(&self) -> u64 {
        lock(&self.state).transmitted
    }
}

impl Channel for LoopbackBus {
    fn transmit(&self, event_id: &str, message: &str) -> Result<()> {
        let len = char_len(event_id) + char_len(message);
        if len > HOST_MESSAGE_CAP {
            return Err(IpcError::Transport(format!(
                "message for '{event_id}' is {len} characters, host limit is {HOST_MESSAGE_CAP}"
            )));
        }
        let mut state = lock(&self.state);
        let due = state.now + self.latency_ticks;
        state.queue.push_back(Queued {
            due,
            delivery: Delivery {
                event_id: event_id.to_owned(),
                message: message.to_owned(),
            },
        });
        state.transmitted += 1;
        Ok(())
    }
}
