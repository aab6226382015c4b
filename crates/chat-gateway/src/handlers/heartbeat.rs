//! Heartbeat handler (op 1 / op 11)

use crate::protocol::GatewayMessage;
use crate::supervisor::outbound;
use crate::supervisor::state::{GatewayShared, GatewayState, TaskContext};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use super::ResumeHandler;

/// Keeps the connection alive on the server's interval
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Start beating every `interval`, the first beat after a random
    /// fraction of it
    pub(crate) fn start(shared: &Arc<GatewayShared>, state: &mut GatewayState, interval: Duration) {
        Self::stop(state);

        let interval = interval.max(Duration::from_millis(1));
        let interval_ms = interval.as_millis() as u64;
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=interval_ms));
        tracing::debug!(
            generation = state.generation,
            interval_ms,
            first_beat_ms = jitter.as_millis() as u64,
            "Starting heartbeat"
        );

        let ctx = TaskContext::new(shared, Some(state.generation));
        let handle = shared.scheduler.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + jitter, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if ctx.with_state(Self::tick).is_none() {
                    break;
                }
            }
        });
        state.heartbeat = Some(handle);
    }

    /// Cancel the timer; idempotent
    pub(crate) fn stop(state: &mut GatewayState) {
        if let Some(handle) = state.heartbeat.take() {
            handle.cancel();
        }
    }

    fn tick(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        let Some(connection) = state.connection.as_ref().filter(|c| c.is_open()) else {
            tracing::warn!(generation = state.generation, "Socket not open, heartbeat skipped");
            return;
        };

        if shared.config.zombie_detection && !connection.is_heartbeat_acked() {
            tracing::warn!(
                generation = state.generation,
                "Heartbeat not acknowledged, connection is a zombie"
            );
            ResumeHandler::resume(shared, state);
            return;
        }

        Self::send(shared, state);
    }

    /// Send a heartbeat now, carrying the last sequence number
    pub(crate) fn send(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        let Some(connection) = state.connection.as_mut().filter(|c| c.is_open()) else {
            tracing::warn!(generation = state.generation, "Socket not open, heartbeat skipped");
            return;
        };
        connection.heartbeat_sent(Instant::now());

        let seq = state.session.sequence();
        tracing::trace!(generation = state.generation, seq = ?seq, "Heartbeat");
        outbound::submit(shared, state, GatewayMessage::heartbeat(seq));
    }

    /// Server acknowledged the last heartbeat
    pub(crate) fn acked(state: &mut GatewayState) {
        if let Some(connection) = state.connection.as_mut() {
            if let Some(latency) = connection.heartbeat_acked(Instant::now()) {
                tracing::trace!(latency_ms = latency.as_millis() as u64, "Heartbeat acknowledged");
            }
        }
    }
}
