//! Resume handler (op 6)

use crate::connection::ResumeTarget;
use crate::protocol::{CloseCode, GatewayMessage, ResumePayload};
use crate::supervisor::handler::connect;
use crate::supervisor::outbound;
use crate::supervisor::state::{GatewayShared, GatewayState, Phase};
use std::sync::Arc;

use super::ReconnectHandler;

/// Reason sent with the close frame when we drop a socket to resume
pub const RESUME_CLOSE_REASON: &str = "Resume initialized.";

/// Picks a session back up on a new socket
pub struct ResumeHandler;

impl ResumeHandler {
    /// Drop the current socket and resume on the resume URL
    ///
    /// Without a complete resume target this becomes a fresh reconnect.
    pub(crate) fn resume(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        let Some(target) = state.session.resume_target() else {
            tracing::info!("No session to resume, reconnecting fresh");
            if let Some(connection) = state.connection.take() {
                connection.close(CloseCode::ReconnectEvent.as_u16(), RESUME_CLOSE_REASON);
            }
            state.phase = Phase::Reconnecting;
            ReconnectHandler::schedule_fresh(shared, state);
            return;
        };

        if let Some(connection) = state.connection.take() {
            connection.close(CloseCode::ReconnectEvent.as_u16(), RESUME_CLOSE_REASON);
        }
        tracing::info!(
            session_id = %target.session_id,
            seq = target.sequence,
            "Resuming session"
        );
        state.phase = Phase::Reconnecting;
        connect(shared, state, &target.url);
    }

    /// Send Resume on the current socket
    pub(crate) fn send_resume(shared: &Arc<GatewayShared>, state: &mut GatewayState, target: &ResumeTarget) {
        state.phase = Phase::Resuming;
        let payload = ResumePayload {
            token: shared.config.token.clone(),
            session_id: target.session_id.clone(),
            seq: target.sequence,
        };
        outbound::submit(shared, state, GatewayMessage::resume(&payload));
    }
}
