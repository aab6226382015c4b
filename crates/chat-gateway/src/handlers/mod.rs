//! Op code handlers
//!
//! Routes inbound frames by op code. Every handler runs under the state
//! lock, synchronously, from the socket pump or a scheduled task.

mod heartbeat;
mod identify;
mod presence;
mod reconnect;
mod resume;

pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;
pub use presence::PresenceHandler;
pub use reconnect::{ReconnectHandler, ReconnectPolicy};
pub use resume::ResumeHandler;

use crate::events::{DispatchEvent, GatewayEvent, GatewayEventType, ReadyEvent};
use crate::protocol::{GatewayMessage, OpCode};
use crate::supervisor::state::{GatewayShared, GatewayState, Phase};
use std::sync::Arc;
use std::time::Duration;

/// Dispatch incoming server frames to the appropriate handler
pub struct MessageDispatcher;

impl MessageDispatcher {
    pub(crate) fn dispatch(shared: &Arc<GatewayShared>, state: &mut GatewayState, message: GatewayMessage) {
        let Some(op) = message.opcode() else {
            tracing::warn!(op = message.op, "Ignoring unknown op code");
            return;
        };

        match op {
            OpCode::Hello => match message.as_hello() {
                Some(hello) => Self::on_hello(shared, state, hello.heartbeat_interval),
                None => tracing::warn!("Malformed Hello payload"),
            },
            OpCode::Dispatch => Self::on_dispatch(shared, state, message),
            OpCode::Heartbeat => HeartbeatHandler::send(shared, state),
            OpCode::HeartbeatAck => HeartbeatHandler::acked(state),
            OpCode::Reconnect => {
                tracing::info!(generation = state.generation, "Server requested reconnect");
                ResumeHandler::resume(shared, state);
            }
            OpCode::InvalidSession => {
                Self::on_invalid_session(shared, state, message.invalid_session_resumable());
            }
            _ => tracing::debug!(op = %op, "Ignoring client-only op code"),
        }
    }

    /// Start heartbeating, then resume or identify
    fn on_hello(shared: &Arc<GatewayShared>, state: &mut GatewayState, interval_ms: u64) {
        tracing::debug!(generation = state.generation, interval_ms, "Hello received");
        HeartbeatHandler::start(shared, state, Duration::from_millis(interval_ms));

        if let Some(target) = state.session.resume_target() {
            ResumeHandler::send_resume(shared, state, &target);
        } else if state.connection.as_ref().is_some_and(|c| c.is_identified()) {
            tracing::debug!("Identify already flushed on this socket");
        } else {
            IdentifyHandler::identify(shared, state);
        }
    }

    /// Record the sequence and forward to subscribers under one lock hold
    fn on_dispatch(shared: &Arc<GatewayShared>, state: &mut GatewayState, message: GatewayMessage) {
        state.session.record_sequence(message.s);
        let name = message.t.unwrap_or_default();

        match GatewayEventType::from_str(&name) {
            Some(GatewayEventType::Ready) => match serde_json::from_value::<ReadyEvent>(message.d.clone()) {
                Ok(ready) => {
                    state.session.capture_ready(&ready);
                    state.attempts = 0;
                    state.phase = Phase::Ready;
                    tracing::info!(
                        session_id = %ready.session_id,
                        user = %ready.user.username,
                        "Session ready"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "Malformed READY payload"),
            },
            Some(GatewayEventType::Resumed) => {
                state.attempts = 0;
                state.phase = Phase::Resumed;
                tracing::info!(seq = ?state.session.sequence(), "Session resumed");
            }
            _ => {}
        }

        shared.publish(GatewayEvent::Dispatch(DispatchEvent {
            name,
            sequence: message.s,
            data: message.d,
        }));
    }

    fn on_invalid_session(shared: &Arc<GatewayShared>, state: &mut GatewayState, resumable: bool) {
        tracing::warn!(resumable, "Session invalidated by server");
        if resumable {
            ResumeHandler::resume(shared, state);
        } else {
            state.session.invalidate();
            IdentifyHandler::identify_later(shared, state);
        }
    }
}
