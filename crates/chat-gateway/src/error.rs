//! Gateway error types

use thiserror::Error;

use crate::protocol::InvalidIntent;

/// Why the session manager stopped for good
///
/// Published to subscribers as `GatewayEvent::Terminated`; never returned
/// from a socket callback or timer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminalError {
    /// Closed with a code retrying cannot fix (bad token, invalid intents, ...)
    #[error("Gateway closed with fatal code {code} ({name}): {reason}")]
    FatalClose {
        code: u16,
        name: &'static str,
        reason: String,
    },

    #[error("Gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

/// Errors returned by the public gateway and client API
///
/// Terminal conditions are not here: they arrive as
/// `GatewayEvent::Terminated`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Resolving the endpoint over REST failed
    #[error("Gateway bootstrap failed: {0}")]
    Bootstrap(#[from] chat_rest::RestError),

    #[error(transparent)]
    InvalidIntents(#[from] InvalidIntent),

    #[error("Gateway already started")]
    AlreadyStarted,

    /// The gateway was explicitly closed or terminated
    #[error("Gateway is closed")]
    Closed,
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
