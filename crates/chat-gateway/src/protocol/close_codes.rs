//! WebSocket close codes
//!
//! Classification table for every close code the client may observe: the
//! standard RFC 6455 range, the gateway's 4000 range and one library code.

use serde::{Deserialize, Serialize};

/// Known close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    NormalClosure = 1000,
    GoingAway = 1001,
    ProtocolError = 1002,
    UnsupportedData = 1003,
    Reserved = 1004,
    NoStatusReceived = 1005,
    AbnormalClosure = 1006,
    InvalidFramePayload = 1007,
    PolicyViolation = 1008,
    MessageTooBig = 1009,
    MandatoryExtension = 1010,
    InternalServerError = 1011,
    ServiceRestart = 1012,
    TryAgainLater = 1013,
    BadGateway = 1014,
    TlsHandshakeFailure = 1015,

    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    InvalidSequence = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    DisallowedIntents = 4014,

    /// Sent by this client when it drops a socket in order to resume
    ReconnectEvent = 4900,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        let code = match value {
            1000 => Self::NormalClosure,
            1001 => Self::GoingAway,
            1002 => Self::ProtocolError,
            1003 => Self::UnsupportedData,
            1004 => Self::Reserved,
            1005 => Self::NoStatusReceived,
            1006 => Self::AbnormalClosure,
            1007 => Self::InvalidFramePayload,
            1008 => Self::PolicyViolation,
            1009 => Self::MessageTooBig,
            1010 => Self::MandatoryExtension,
            1011 => Self::InternalServerError,
            1012 => Self::ServiceRestart,
            1013 => Self::TryAgainLater,
            1014 => Self::BadGateway,
            1015 => Self::TlsHandshakeFailure,
            4000 => Self::UnknownError,
            4001 => Self::UnknownOpcode,
            4002 => Self::DecodeError,
            4003 => Self::NotAuthenticated,
            4004 => Self::AuthenticationFailed,
            4005 => Self::AlreadyAuthenticated,
            4007 => Self::InvalidSequence,
            4008 => Self::RateLimited,
            4009 => Self::SessionTimedOut,
            4010 => Self::InvalidShard,
            4011 => Self::ShardingRequired,
            4012 => Self::InvalidApiVersion,
            4013 => Self::InvalidIntents,
            4014 => Self::DisallowedIntents,
            4900 => Self::ReconnectEvent,
            _ => return None,
        };
        Some(code)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether the session may be resumed after this close
    ///
    /// A `false` here does not stop reconnecting; it means the next
    /// connection starts a fresh session.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::InternalServerError
                | Self::ServiceRestart
                | Self::TryAgainLater
                | Self::UnknownError
                | Self::UnknownOpcode
                | Self::DecodeError
                | Self::NotAuthenticated
                | Self::AlreadyAuthenticated
                | Self::InvalidSequence
                | Self::RateLimited
                | Self::SessionTimedOut
                | Self::ReconnectEvent
        )
    }

    /// Whether retrying can never succeed without a configuration change
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NormalClosure => "Normal Closure",
            Self::GoingAway => "Going Away",
            Self::ProtocolError => "Protocol Error",
            Self::UnsupportedData => "Unsupported Data",
            Self::Reserved => "Reserved (no status)",
            Self::NoStatusReceived => "No Status Received",
            Self::AbnormalClosure => "Abnormal Closure",
            Self::InvalidFramePayload => "Invalid Frame Payload Data",
            Self::PolicyViolation => "Policy Violation",
            Self::MessageTooBig => "Message Too Big",
            Self::MandatoryExtension => "Mandatory Extension",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceRestart => "Service Restart",
            Self::TryAgainLater => "Try Again Later",
            Self::BadGateway => "Bad Gateway",
            Self::TlsHandshakeFailure => "TLS Handshake Failure",
            Self::UnknownError => "Unknown Error",
            Self::UnknownOpcode => "Unknown Opcode",
            Self::DecodeError => "Decode Error",
            Self::NotAuthenticated => "Not Authenticated",
            Self::AuthenticationFailed => "Authentication Failed",
            Self::AlreadyAuthenticated => "Already Authenticated",
            Self::InvalidSequence => "Invalid Seq",
            Self::RateLimited => "Rate Limited",
            Self::SessionTimedOut => "Session Timed Out",
            Self::InvalidShard => "Invalid Shard",
            Self::ShardingRequired => "Sharding Required",
            Self::InvalidApiVersion => "Invalid API Version",
            Self::InvalidIntents => "Invalid Intent(s)",
            Self::DisallowedIntents => "Disallowed Intent(s)",
            Self::ReconnectEvent => "Reconnect Event",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

/// Result of looking a raw close code up in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseClassification {
    pub code: u16,
    pub name: &'static str,
    /// Session may be resumed
    pub reconnect: bool,
    /// No further connection attempts
    pub fatal: bool,
}

impl CloseClassification {
    /// Classify a raw close code
    ///
    /// Codes missing from the table get a fresh (non-resuming) reconnect.
    #[must_use]
    pub fn of(code: u16) -> Self {
        match CloseCode::from_u16(code) {
            Some(known) => Self {
                code,
                name: known.name(),
                reconnect: known.should_reconnect(),
                fatal: known.is_fatal(),
            },
            None => Self {
                code,
                name: "Unknown",
                reconnect: false,
                fatal: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_from_u16() {
        assert_eq!(CloseCode::from_u16(1006), Some(CloseCode::AbnormalClosure));
        assert_eq!(CloseCode::from_u16(4004), Some(CloseCode::AuthenticationFailed));
        assert_eq!(CloseCode::from_u16(4900), Some(CloseCode::ReconnectEvent));
        assert_eq!(CloseCode::from_u16(4006), None);
        assert_eq!(CloseCode::from_u16(1016), None);
    }

    #[test]
    fn test_resumable_codes() {
        for code in [1011, 1012, 1013, 4000, 4001, 4002, 4003, 4005, 4007, 4008, 4009, 4900] {
            let class = CloseClassification::of(code);
            assert!(class.reconnect, "{code} should be resumable");
            assert!(!class.fatal, "{code} should not be fatal");
        }
    }

    #[test]
    fn test_fresh_session_codes() {
        for code in [1000, 1001, 1002, 1003, 1004, 1005, 1006, 1007, 1008, 1009, 1010, 1014, 1015] {
            let class = CloseClassification::of(code);
            assert!(!class.reconnect, "{code} should not be resumable");
            assert!(!class.fatal, "{code} should not be fatal");
        }
    }

    #[test]
    fn test_fatal_codes() {
        for code in [4004, 4010, 4011, 4012, 4013, 4014] {
            let class = CloseClassification::of(code);
            assert!(class.fatal, "{code} should be fatal");
            assert!(!class.reconnect);
        }
    }

    #[test]
    fn test_unknown_code() {
        let class = CloseClassification::of(3999);
        assert_eq!(class.name, "Unknown");
        assert!(!class.reconnect);
        assert!(!class.fatal);
    }

    #[test]
    fn test_close_code_display() {
        assert_eq!(CloseCode::ReconnectEvent.to_string(), "Reconnect Event (4900)");
    }
}
