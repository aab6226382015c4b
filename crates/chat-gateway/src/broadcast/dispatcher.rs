//! Event dispatcher
//!
//! Registry of `event name -> listeners`. Events arrive on an ordered channel
//! from the session manager and are delivered by a single task, so listeners
//! see them in the order the gateway sequenced them.

use crate::events::GatewayEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Subscriber callback
pub type Listener = Arc<dyn Fn(&GatewayEvent) + Send + Sync>;

/// Registry key that matches every event
pub const WILDCARD: &str = "*";

/// Handle returned by [`EventDispatcher::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Registered {
    id: u64,
    listener: Listener,
}

/// Event dispatcher that routes gateway events to registered listeners
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Vec<Registered>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event name
    ///
    /// Names are matched verbatim against the dispatch `t` field.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(Registered {
                id,
                listener: Arc::new(listener),
            });
        ListenerId(id)
    }

    /// Register a listener for every event
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.on(WILDCARD, listener)
    }

    /// Remove a listener; returns false if it was not registered
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        for list in listeners.values_mut() {
            if let Some(pos) = list.iter().position(|r| r.id == id.0) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of listeners registered under exactly this name
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Invoke every listener for `event`, in registration order
    ///
    /// Runs on a snapshot taken before the first call, so listeners may
    /// register or remove listeners without affecting this delivery.
    /// Returns the number of listeners invoked.
    pub fn publish(&self, event: &GatewayEvent) -> usize {
        let snapshot = {
            let listeners = self.listeners.read();
            let mut snapshot: Vec<Registered> = listeners
                .get(event.name())
                .into_iter()
                .chain(listeners.get(WILDCARD))
                .flatten()
                .cloned()
                .collect();
            snapshot.sort_by_key(|r| r.id);
            snapshot
        };

        for registered in &snapshot {
            (registered.listener)(event);
        }
        snapshot.len()
    }

    /// Deliver events from `rx` until every sender is gone
    pub async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<GatewayEvent>) {
        while let Some(event) = rx.recv().await {
            let delivered = self.publish(&event);
            tracing::trace!(event = event.name(), delivered, "Event delivered");
        }
        tracing::debug!("Event delivery loop ended");
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        f.debug_struct("EventDispatcher")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
