//! Events published to subscribers

use serde_json::Value;

use crate::error::TerminalError;

/// Name under which [`GatewayEvent::Terminated`] is published
pub const TERMINATED_EVENT: &str = "GATEWAY_TERMINATED";

/// Something subscribers can observe
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A dispatch (op 0) frame, forwarded verbatim
    Dispatch(DispatchEvent),
    /// The session manager gave up; no further connection attempts follow
    Terminated(TerminalError),
}

impl GatewayEvent {
    /// Registry key this event is published under
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Dispatch(dispatch) => &dispatch.name,
            Self::Terminated(_) => TERMINATED_EVENT,
        }
    }

    #[must_use]
    pub fn as_dispatch(&self) -> Option<&DispatchEvent> {
        match self {
            Self::Dispatch(dispatch) => Some(dispatch),
            Self::Terminated(_) => None,
        }
    }
}

/// A dispatched event: `t`, `s` and `d` of the frame
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
    pub name: String,
    pub sequence: Option<u64>,
    pub data: Value,
}
