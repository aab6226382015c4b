//! Gateway protocol definitions
//!
//! Op codes, frame format, payloads, intents and close codes.

mod close_codes;
mod intents;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::{CloseClassification, CloseCode};
pub use intents::{Intents, InvalidIntent};
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    Activity, ActivityType, HelloPayload, IdentifyPayload, IdentifyProperties, PresenceStatus,
    PresenceUpdatePayload, ResumePayload,
};
