//! # chat-rest
//!
//! Thin REST client. The gateway only needs it to resolve the connection
//! endpoint and the session-start quota before the first connect.

pub mod client;
pub mod error;
pub mod models;

pub use client::RestClient;
pub use error::{RestError, RestResult};
pub use models::{GatewayBotInfo, GatewayInfo, SessionStartLimit};
