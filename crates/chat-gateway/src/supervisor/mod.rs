//! Connection supervisor
//!
//! [`Gateway`] owns the socket, the session state and every timer. It is the
//! only thing that writes to the socket.

pub(crate) mod handler;
pub(crate) mod outbound;
pub(crate) mod state;


pub use state::Phase;

use std::sync::Arc;
use std::time::Duration;

use chat_rest::SessionStartLimit;

use crate::broadcast::{EventDispatcher, ListenerId};
use crate::config::GatewayConfig;
use crate::connection::{Transport, WebSocketTransport};
use crate::error::{GatewayError, GatewayResult};
use crate::events::GatewayEvent;
use crate::handlers::{HeartbeatHandler, PresenceHandler};
use crate::protocol::{GatewayMessage, PresenceUpdatePayload};
use state::GatewayShared;

/// Gateway session manager
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Gateway {
    shared: Arc<GatewayShared>,
}

impl Gateway {
    /// Session manager over real WebSockets
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_transport(config, Arc::new(WebSocketTransport))
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            shared: Arc::new(GatewayShared::new(config, transport)),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.shared.config
    }

    /// Subscriber registry
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.shared.events
    }

    /// Subscribe to one event name (`READY`, `MESSAGE_CREATE`, ...)
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.shared.events.on(event, listener)
    }

    /// Subscribe to every event
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.shared.events.on_any(listener)
    }

    /// Session-start quota as reported by `GET /gateway/bot`
    pub fn set_session_start_limit(&self, limit: SessionStartLimit) {
        self.shared.state.lock().session.set_start_limit(limit);
    }

    /// Connect to `url` and keep the session alive from then on
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, url: &str) -> GatewayResult<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(GatewayError::Closed);
        }
        if state.started {
            return Err(GatewayError::AlreadyStarted);
        }
        state.started = true;
        state.gateway_url = Some(url.to_string());

        if let Some(rx) = self.shared.event_rx.lock().take() {
            // Not a scheduled task: the terminal event must still be
            // delivered after every timer is cancelled.
            tokio::spawn(Arc::clone(&self.shared.events).run(rx));
        }

        handler::connect(&self.shared, &mut state, url);
        Ok(())
    }

    /// Send a frame through the rate limiter
    ///
    /// Without an open socket, queueable frames (Identify) are held briefly
    /// and everything else is discarded.
    pub fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(GatewayError::Closed);
        }
        outbound::submit(&self.shared, &mut state, message);
        Ok(())
    }

    /// Update the bot's presence
    pub fn update_presence(&self, presence: PresenceUpdatePayload) -> GatewayResult<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(GatewayError::Closed);
        }
        PresenceHandler::update(&self.shared, &mut state, presence);
        Ok(())
    }

    /// Shut down: close the socket and cancel every pending task
    ///
    /// Events from the socket after this call are ignored. Idempotent.
    pub fn close(&self, code: u16, reason: &str) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.phase = Phase::Closed;

        HeartbeatHandler::stop(&mut state);
        if let Some(connection) = state.connection.take() {
            connection.close(code, reason);
        }
        state.backlog.clear();
        state.queue.clear();
        state.drain_task = None;
        state.identify_retry = None;
        state.reconnect_task = None;

        self.shared.scheduler.cancel_all();
        tracing::info!(code, reason = %reason, "Gateway closed");
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Last dispatch sequence number
    pub fn sequence(&self) -> Option<u64> {
        self.shared.state.lock().session.sequence()
    }

    pub fn session_id(&self) -> Option<String> {
        self.shared.state.lock().session.session_id().map(str::to_string)
    }

    pub fn session_start_limit(&self) -> Option<SessionStartLimit> {
        self.shared.state.lock().session.start_limit()
    }

    /// Connection attempts so far
    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// Frames waiting in the outbound queue or the rate-limit backlog
    pub fn queued(&self) -> usize {
        let state = self.shared.state.lock();
        state.queue.len() + state.backlog.len()
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        self.shared
            .state
            .lock()
            .connection
            .as_ref()
            .and_then(|c| c.latency())
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.lock().attempts
    }

    /// Timers and socket pumps still running
    pub fn pending_tasks(&self) -> usize {
        self.shared.scheduler.pending()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Gateway")
            .field("phase", &state.phase)
            .field("generation", &state.generation)
            .field("sequence", &state.session.sequence())
            .field("attempts", &state.attempts)
            .finish()
    }
}
