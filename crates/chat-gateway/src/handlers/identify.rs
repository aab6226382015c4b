//! Identify handler (op 2)

use crate::protocol::{GatewayMessage, IdentifyPayload};
use crate::supervisor::outbound;
use crate::supervisor::state::{GatewayShared, GatewayState, Phase, TaskContext};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Starts new sessions, respecting the session-start quota
pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Send Identify, or defer it until the session-start quota resets
    pub(crate) fn identify(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        if let Some(wait) = state.session.start_limit_wait() {
            if state.identify_retry.is_some() {
                return;
            }
            tracing::warn!(
                delay_ms = wait.as_millis() as u64,
                "Session start limit reached, deferring identify"
            );
            let ctx = TaskContext::new(shared, Some(state.generation));
            state.identify_retry = Some(shared.scheduler.schedule(wait, async move {
                ctx.with_state(|shared, state| {
                    state.identify_retry = None;
                    state.session.replenish_start_limit();
                    Self::identify(shared, state);
                });
            }));
            return;
        }

        state.session.consume_start();
        let payload = IdentifyPayload {
            token: shared.config.token.clone(),
            intents: shared.config.intents,
            properties: shared.config.properties.clone(),
            presence: state.presence.clone(),
        };

        if let Some(connection) = state.connection.as_mut().filter(|c| c.is_open()) {
            connection.mark_identified();
        }
        state.phase = Phase::Identifying;
        tracing::info!(
            generation = state.generation,
            intents = %shared.config.intents,
            remaining = ?state.session.start_limit().map(|l| l.remaining),
            "Identifying"
        );
        outbound::submit(shared, state, GatewayMessage::identify(&payload));
    }

    /// Identify again on the same socket after a short random pause
    pub(crate) fn identify_later(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        let (min, max) = shared.config.invalid_session_delay;
        let (min, max) = (min.as_millis() as u64, max.max(min).as_millis() as u64);
        let delay_ms = rand::thread_rng().gen_range(min..=max);
        tracing::debug!(delay_ms, "Re-identifying after invalid session");

        if let Some(retry) = state.identify_retry.take() {
            retry.cancel();
        }
        let ctx = TaskContext::new(shared, Some(state.generation));
        state.identify_retry = Some(shared.scheduler.schedule(Duration::from_millis(delay_ms), async move {
            ctx.with_state(|shared, state| {
                state.identify_retry = None;
                Self::identify(shared, state);
            });
        }));
    }
}
