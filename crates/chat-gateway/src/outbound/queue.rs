//! Outbound queue
//!
//! Holds whitelisted frames submitted while no socket is open. Entries are
//! boxed by a time-to-live and the queue is bounded; both kinds of drop are
//! logged, neither is ever transmitted.

use crate::protocol::GatewayMessage;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct QueuedMessage {
    message: GatewayMessage,
    enqueued_at: Instant,
}

#[derive(Debug, Clone)]
pub struct OutboundQueue {
    ttl: Duration,
    capacity: usize,
    entries: VecDeque<QueuedMessage>,
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_QUEUE_CAPACITY)
    }
}

impl OutboundQueue {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Append a frame; returns the frame evicted to make room, if any
    pub fn push(&mut self, message: GatewayMessage, now: Instant) -> Option<GatewayMessage> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front().map(|e| e.message)
        } else {
            None
        };
        if let Some(dropped) = &evicted {
            tracing::warn!(op = dropped.op, capacity = self.capacity, "Outbound queue full, dropped oldest frame");
        }

        self.entries.push_back(QueuedMessage {
            message,
            enqueued_at: now,
        });
        evicted
    }

    /// Take every frame still within its TTL, oldest first
    pub fn drain_ready(&mut self, now: Instant) -> Vec<GatewayMessage> {
        let ttl = self.ttl;
        self.entries
            .drain(..)
            .filter_map(|entry| {
                let age = now.saturating_duration_since(entry.enqueued_at);
                if age > ttl {
                    tracing::warn!(
                        op = entry.message.op,
                        age_ms = age.as_millis() as u64,
                        "Dropped expired queued frame"
                    );
                    None
                } else {
                    Some(entry.message)
                }
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
