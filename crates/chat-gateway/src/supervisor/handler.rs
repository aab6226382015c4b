//! Socket lifecycle
//!
//! Opens sockets and turns their events into state transitions.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::outbound;
use super::state::{GatewayShared, GatewayState, Phase, TaskContext};
use crate::connection::{Connection, SocketEvent};
use crate::handlers::{HeartbeatHandler, MessageDispatcher, ReconnectHandler};
use crate::protocol::{CloseClassification, GatewayMessage};

/// Open a new socket to `url`, replacing any current one
pub(crate) fn connect(shared: &Arc<GatewayShared>, state: &mut GatewayState, url: &str) {
    state.generation += 1;
    let generation = state.generation;

    HeartbeatHandler::stop(state);
    if let Some(retry) = state.identify_retry.take() {
        retry.cancel();
    }
    state.reconnect_task = None;
    if let Some(previous) = state.connection.take() {
        previous.close(4900, "Reconnecting");
    }
    outbound::release_backlog(state);
    state.limiter.reset();

    let endpoint = shared.config.endpoint(url);
    tracing::info!(generation, url = %endpoint, "Connecting to gateway");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let commands = shared.transport.open(&endpoint, events_tx);

    let ctx = TaskContext::new(shared, Some(generation));
    let pump = shared.scheduler.spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let current = ctx
                .with_state(|shared, state| handle_socket_event(shared, state, generation, event))
                .unwrap_or(false);
            if !current {
                break;
            }
        }
        tracing::trace!(generation, "Socket pump finished");
    });

    state.connection = Some(Connection::new(generation, endpoint, commands, pump));
    state.phase = Phase::Connecting;
}

/// Apply one socket event; returns false once the socket is no longer current
fn handle_socket_event(
    shared: &Arc<GatewayShared>,
    state: &mut GatewayState,
    generation: u64,
    event: SocketEvent,
) -> bool {
    let current = state
        .connection
        .as_ref()
        .is_some_and(|c| c.generation() == generation);
    if !current {
        tracing::trace!(generation, "Event from retired socket ignored");
        return false;
    }

    match event {
        SocketEvent::Opened => on_open(shared, state),
        SocketEvent::Frame(text) => match GatewayMessage::from_json(&text) {
            Ok(message) => MessageDispatcher::dispatch(shared, state, message),
            Err(e) => {
                tracing::warn!(generation, error = %e, "Discarding malformed frame");
            }
        },
        SocketEvent::Error(error) => {
            tracing::warn!(generation, error = %error, "Socket error");
        }
        SocketEvent::Closed { code, reason } => {
            on_close(shared, state, code, &reason);
            return false;
        }
    }
    true
}

fn on_open(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
    let Some(connection) = state.connection.as_mut() else {
        return;
    };
    connection.mark_open();
    tracing::info!(generation = connection.generation(), "Gateway socket open");

    state.phase = Phase::AwaitingHandshake;
    if outbound::flush_queue(shared, state) {
        if let Some(connection) = state.connection.as_mut() {
            connection.mark_identified();
        }
        state.phase = Phase::Identifying;
    }
}

fn on_close(shared: &Arc<GatewayShared>, state: &mut GatewayState, code: u16, reason: &str) {
    state.connection = None;
    HeartbeatHandler::stop(state);
    if let Some(retry) = state.identify_retry.take() {
        retry.cancel();
    }
    outbound::release_backlog(state);

    let classification = CloseClassification::of(code);
    tracing::info!(
        generation = state.generation,
        code,
        name = classification.name,
        reason = %reason,
        "Gateway socket closed"
    );

    state.phase = Phase::Reconnecting;
    ReconnectHandler::on_close(shared, state, classification, reason);
}
