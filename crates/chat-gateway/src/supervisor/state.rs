//! Shared session manager state
//!
//! One coarse lock guards everything that changes over a connection's life.
//! It is never held across an `.await`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::broadcast::EventDispatcher;
use crate::config::GatewayConfig;
use crate::connection::{Connection, SessionState, Transport};
use crate::events::GatewayEvent;
use crate::outbound::{OutboundQueue, RateLimiter};
use crate::protocol::{GatewayMessage, PresenceUpdatePayload};
use crate::scheduler::{Scheduler, TaskHandle};

/// Where the session manager is in the identify/resume state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    /// Socket requested, not yet open
    Connecting,
    /// Socket open, waiting for Hello
    AwaitingHandshake,
    Identifying,
    Ready,
    Resuming,
    Resumed,
    /// Socket lost; a resume or reconnect is pending
    Reconnecting,
    /// Explicitly closed or terminated
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Mutable state behind [`GatewayShared::state`]
#[derive(Debug, Default)]
pub(crate) struct GatewayState {
    pub phase: Phase,

    /// Incremented on every connection attempt
    pub generation: u64,
    pub connection: Option<Connection>,
    pub session: SessionState,

    pub limiter: RateLimiter,
    /// Frames held while disconnected
    pub queue: OutboundQueue,
    /// Frames waiting for rate-limit capacity, in submission order
    pub backlog: VecDeque<GatewayMessage>,
    pub drain_task: Option<TaskHandle>,

    pub heartbeat: Option<TaskHandle>,
    pub identify_retry: Option<TaskHandle>,
    pub reconnect_task: Option<TaskHandle>,

    /// Reconnects since the last READY or RESUMED
    pub attempts: u32,

    /// Endpoint from REST bootstrap, used for fresh connections
    pub gateway_url: Option<String>,
    /// Presence for the next Identify
    pub presence: Option<PresenceUpdatePayload>,

    pub started: bool,
    pub closed: bool,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config.rate_limit, config.rate_window),
            queue: OutboundQueue::new(config.queue_ttl, config.queue_capacity),
            presence: config.presence.clone(),
            ..Self::default()
        }
    }

    /// Socket exists and the transport reported it open
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_open)
    }
}

/// Everything the supervisor, handlers and scheduled tasks share
pub(crate) struct GatewayShared {
    pub config: GatewayConfig,
    pub transport: Arc<dyn Transport>,
    pub scheduler: Scheduler,
    pub events: Arc<EventDispatcher>,
    /// Ordered channel into the delivery task
    pub event_tx: mpsc::UnboundedSender<GatewayEvent>,
    pub event_rx: Mutex<Option<mpsc::UnboundedReceiver<GatewayEvent>>>,
    pub state: Mutex<GatewayState>,
}

impl GatewayShared {
    pub fn new(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = GatewayState::new(&config);
        Self {
            config,
            transport,
            scheduler: Scheduler::new(),
            events: Arc::new(EventDispatcher::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
            state: Mutex::new(state),
        }
    }

    /// Hand an event to the delivery task
    pub fn publish(&self, event: GatewayEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("Event delivery loop gone, event dropped");
        }
    }
}

/// What a scheduled task or socket pump carries back into the state
///
/// Holds only a weak reference, so pending tasks never keep a dropped
/// gateway alive.
#[derive(Clone)]
pub(crate) struct TaskContext {
    /// Connection generation the task was created for; `None` for tasks
    /// that outlive a single connection
    generation: Option<u64>,
    shared: Weak<GatewayShared>,
}

impl TaskContext {
    pub fn new(shared: &Arc<GatewayShared>, generation: Option<u64>) -> Self {
        Self {
            generation,
            shared: Arc::downgrade(shared),
        }
    }

    /// Run `f` under the state lock if the task is still current
    ///
    /// Returns `None` without calling `f` when the gateway is gone, closed,
    /// or has moved on to another connection.
    pub fn with_state<R>(&self, f: impl FnOnce(&Arc<GatewayShared>, &mut GatewayState) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut state = shared.state.lock();
        if state.closed {
            return None;
        }
        if let Some(generation) = self.generation {
            if generation != state.generation {
                tracing::trace!(
                    generation,
                    current = state.generation,
                    "Stale task ignored"
                );
                return None;
            }
        }
        Some(f(&shared, &mut state))
    }
}
