//! The single path every outbound frame takes
//!
//! Heartbeats go straight to the socket. Everything else passes the rate
//! limiter; frames over the limit wait in a FIFO backlog drained by one
//! scheduled task. Identify and Resume jump to the front of that backlog.
//! With no open socket, queueable frames are held in the outbound queue and
//! the rest are discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::state::{GatewayShared, GatewayState, TaskContext};
use crate::protocol::{GatewayMessage, OpCode};

/// Submit a frame for sending
pub(crate) fn submit(shared: &Arc<GatewayShared>, state: &mut GatewayState, message: GatewayMessage) {
    if !state.is_connected() {
        hold_or_discard(state, message);
        return;
    }

    if message.opcode() == Some(OpCode::Heartbeat) {
        transmit(state, &message);
        return;
    }

    let handshake = message.opcode().is_some_and(OpCode::is_handshake);

    // Earlier frames are still waiting; keep FIFO order.
    if !state.backlog.is_empty() && !handshake {
        state.backlog.push_back(message);
        return;
    }

    match state.limiter.try_acquire(Instant::now()) {
        Ok(()) => transmit(state, &message),
        Err(wait) => {
            tracing::debug!(
                op = message.op,
                delay_ms = wait.as_millis() as u64,
                "Rate limited, delaying frame"
            );
            if handshake {
                state.backlog.push_front(message);
            } else {
                state.backlog.push_back(message);
            }
            schedule_drain(shared, state, wait);
        }
    }
}

/// Empty the backlog when its socket goes away
///
/// Delayed frames belong to the old socket. Queueable ones move to the
/// outbound queue, the rest are discarded.
pub(crate) fn release_backlog(state: &mut GatewayState) {
    if let Some(task) = state.drain_task.take() {
        task.cancel();
    }
    if !state.backlog.is_empty() {
        tracing::debug!(frames = state.backlog.len(), "Releasing rate-limit backlog");
    }
    while let Some(message) = state.backlog.pop_front() {
        hold_or_discard(state, message);
    }
}

/// Frames submitted while disconnected
fn hold_or_discard(state: &mut GatewayState, message: GatewayMessage) {
    if message.opcode().is_some_and(OpCode::is_queueable) {
        tracing::debug!(op = message.op, "No open socket, frame queued");
        state.queue.push(message, Instant::now());
    } else {
        tracing::debug!(op = message.op, "No open socket, frame discarded");
    }
}

fn schedule_drain(shared: &Arc<GatewayShared>, state: &mut GatewayState, wait: Duration) {
    if state.drain_task.is_some() {
        return;
    }

    // Not tied to a generation: delayed frames outlive the socket they were
    // submitted on.
    let ctx = TaskContext::new(shared, None);
    state.drain_task = Some(shared.scheduler.schedule(wait, async move {
        ctx.with_state(|shared, state| {
            state.drain_task = None;
            drain_backlog(shared, state);
        });
    }));
}

/// Send as much of the backlog as the limiter allows
fn drain_backlog(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
    while let Some(message) = state.backlog.pop_front() {
        if !state.is_connected() {
            hold_or_discard(state, message);
            continue;
        }

        match state.limiter.try_acquire(Instant::now()) {
            Ok(()) => transmit(state, &message),
            Err(wait) => {
                state.backlog.push_front(message);
                schedule_drain(shared, state, wait);
                return;
            }
        }
    }
}

/// Write a frame to the active socket
fn transmit(state: &GatewayState, message: &GatewayMessage) {
    let Some(connection) = state.connection.as_ref() else {
        tracing::debug!(op = message.op, "No socket, frame dropped");
        return;
    };

    match message.to_json() {
        Ok(text) => {
            if connection.send_text(text) {
                tracing::trace!(
                    generation = connection.generation(),
                    op = message.op,
                    "Frame sent"
                );
            } else {
                tracing::warn!(op = message.op, "Socket task gone, frame dropped");
            }
        }
        Err(e) => tracing::warn!(op = message.op, error = %e, "Failed to encode frame"),
    }
}

/// Move queued frames onto a freshly opened socket
///
/// Returns true if an Identify was among them.
pub(crate) fn flush_queue(shared: &Arc<GatewayShared>, state: &mut GatewayState) -> bool {
    let ready = state.queue.drain_ready(Instant::now());
    let mut identified = false;

    for message in ready {
        if message.opcode() == Some(OpCode::Identify) {
            identified = true;
        }
        submit(shared, state, message);
    }
    identified
}
