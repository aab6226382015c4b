//! The active socket
//!
//! One `Connection` exists per connection attempt. It owns the command side
//! of the transport and the per-socket heartbeat bookkeeping.

use super::transport::SocketCommand;
use crate::scheduler::TaskHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A single gateway socket
pub struct Connection {
    /// Generation this socket was opened for
    generation: u64,

    /// Endpoint including the query string
    url: String,

    /// Channel to the transport task
    commands: mpsc::UnboundedSender<SocketCommand>,

    /// Task feeding this socket's events into the supervisor
    pump: TaskHandle,

    /// Transport reported the socket open
    open: bool,

    /// An Identify has been sent (or flushed) on this socket
    identified: bool,

    /// Whether the server ACKed the last heartbeat
    heartbeat_acked: bool,

    /// When the last heartbeat was sent
    last_heartbeat: Option<Instant>,

    /// Round trip of the last ACKed heartbeat
    latency: Option<Duration>,
}

impl Connection {
    pub fn new(
        generation: u64,
        url: String,
        commands: mpsc::UnboundedSender<SocketCommand>,
        pump: TaskHandle,
    ) -> Self {
        Self {
            generation,
            url,
            commands,
            pump,
            open: false,
            identified: false,
            heartbeat_acked: true,
            last_heartbeat: None,
            latency: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mark_open(&mut self) {
        self.open = true;
    }

    pub fn is_identified(&self) -> bool {
        self.identified
    }

    pub fn mark_identified(&mut self) {
        self.identified = true;
    }

    /// Queue a text frame for the transport
    ///
    /// Returns false if the transport task is gone.
    pub fn send_text(&self, text: String) -> bool {
        self.commands.send(SocketCommand::Send(text)).is_ok()
    }

    /// Ask the transport to close the socket and stop pumping its events
    pub fn close(self, code: u16, reason: &str) {
        self.pump.cancel();
        let _ = self.commands.send(SocketCommand::Close {
            code,
            reason: reason.to_string(),
        });
    }

    /// Record a heartbeat going out
    pub fn heartbeat_sent(&mut self, now: Instant) {
        self.heartbeat_acked = false;
        self.last_heartbeat = Some(now);
    }

    /// Record a heartbeat ACK; returns the measured round trip
    pub fn heartbeat_acked(&mut self, now: Instant) -> Option<Duration> {
        self.heartbeat_acked = true;
        self.latency = self.last_heartbeat.map(|sent| now.duration_since(sent));
        self.latency
    }

    pub fn is_heartbeat_acked(&self) -> bool {
        self.heartbeat_acked
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("generation", &self.generation)
            .field("url", &self.url)
            .field("open", &self.open)
            .field("identified", &self.identified)
            .field("heartbeat_acked", &self.heartbeat_acked)
            .finish()
    }
}
