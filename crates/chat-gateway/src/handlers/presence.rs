//! Presence Update handler (op 3)

use crate::protocol::{GatewayMessage, PresenceUpdatePayload};
use crate::supervisor::outbound;
use crate::supervisor::state::{GatewayShared, GatewayState};
use std::sync::Arc;

/// Publishes the bot's presence
pub struct PresenceHandler;

impl PresenceHandler {
    /// Send a presence update and keep it for the next Identify
    ///
    /// Presence updates are not queueable; sent while disconnected, only the
    /// stored copy survives.
    pub(crate) fn update(shared: &Arc<GatewayShared>, state: &mut GatewayState, presence: PresenceUpdatePayload) {
        tracing::debug!(status = ?presence.status, "Updating presence");
        let message = GatewayMessage::presence_update(&presence);
        state.presence = Some(presence);
        outbound::submit(shared, state, message);
    }
}
