//! # chat-gateway
//!
//! Gateway session manager for a bot client: keeps one WebSocket session
//! alive across network failures, resuming when the protocol allows, and
//! fans the ordered event stream out to subscribers.

pub mod broadcast;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod handlers;
pub mod outbound;
pub mod protocol;
pub mod scheduler;
pub mod supervisor;

pub use broadcast::{EventDispatcher, ListenerId};
pub use client::Client;
pub use config::GatewayConfig;
pub use connection::{SocketCommand, SocketEvent, Transport, WebSocketTransport};
pub use error::{GatewayError, GatewayResult, TerminalError};
pub use events::{DispatchEvent, GatewayEvent, GatewayEventType, TERMINATED_EVENT};
pub use protocol::{GatewayMessage, Intents, OpCode, PresenceUpdatePayload};
pub use supervisor::{Gateway, Phase};
