//! Gateway events
//!
//! What subscribers receive, plus the few dispatch payloads the session
//! manager decodes for its own bookkeeping.

mod event_types;
mod gateway_event;
mod payloads;

pub use event_types::GatewayEventType;
pub use gateway_event::{DispatchEvent, GatewayEvent, TERMINATED_EVENT};
pub use payloads::{CurrentUser, ReadyEvent};
