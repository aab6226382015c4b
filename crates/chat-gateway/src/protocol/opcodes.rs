//! Gateway operation codes

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
///
/// The op code says what kind of frame travels over the socket. Some codes
/// only ever come from the server, others are only sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// An event was dispatched (receive)
    Dispatch = 0,
    /// Keep-alive (send), or a request for an immediate one (receive)
    Heartbeat = 1,
    /// Start a new session (send)
    Identify = 2,
    /// Update the client's presence (send)
    PresenceUpdate = 3,
    /// Join, leave or move between voice channels (send)
    VoiceStateUpdate = 4,
    /// Resume a previous session (send)
    Resume = 6,
    /// Server asks the client to reconnect and resume (receive)
    Reconnect = 7,
    /// Request offline members of a large guild (send)
    RequestGuildMembers = 8,
    /// Session was invalidated; `d` says whether it is resumable (receive)
    InvalidSession = 9,
    /// First frame on a new socket, carries the heartbeat interval (receive)
    Hello = 10,
    /// Heartbeat acknowledged (receive)
    HeartbeatAck = 11,
}

impl OpCode {
    /// Create an `OpCode` from a raw integer value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestGuildMembers),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this op code can be sent by the client
    #[must_use]
    pub const fn is_client_op(self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::Identify
                | Self::PresenceUpdate
                | Self::VoiceStateUpdate
                | Self::Resume
                | Self::RequestGuildMembers
        )
    }

    /// Check if this op code can be sent by the server
    #[must_use]
    pub const fn is_server_op(self) -> bool {
        matches!(
            self,
            Self::Dispatch
                | Self::Heartbeat
                | Self::Reconnect
                | Self::InvalidSession
                | Self::Hello
                | Self::HeartbeatAck
        )
    }

    /// Whether a frame with this op code may wait in the outbound queue
    /// while no connection is open.
    ///
    /// Only Identify qualifies. Presence, voice and member requests describe
    /// transient state and are discarded instead.
    #[must_use]
    pub const fn is_queueable(self) -> bool {
        matches!(self, Self::Identify)
    }

    /// Identify and Resume open a session and must be the first frame a
    /// socket sees, so they go ahead of anything waiting on the rate limit.
    #[must_use]
    pub const fn is_handshake(self) -> bool {
        matches!(self, Self::Identify | Self::Resume)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::PresenceUpdate => "PresenceUpdate",
            Self::VoiceStateUpdate => "VoiceStateUpdate",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::RequestGuildMembers => "RequestGuildMembers",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| serde::de::Error::custom(format!("invalid op code: {value}")))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Dispatch));
        assert_eq!(OpCode::from_u8(4), Some(OpCode::VoiceStateUpdate));
        assert_eq!(OpCode::from_u8(6), Some(OpCode::Resume));
        assert_eq!(OpCode::from_u8(7), Some(OpCode::Reconnect));
        assert_eq!(OpCode::from_u8(9), Some(OpCode::InvalidSession));
        assert_eq!(OpCode::from_u8(11), Some(OpCode::HeartbeatAck));
        assert_eq!(OpCode::from_u8(5), None);
        assert_eq!(OpCode::from_u8(12), None);
    }

    #[test]
    fn test_opcode_as_u8() {
        assert_eq!(OpCode::Identify.as_u8(), 2);
        assert_eq!(OpCode::Resume.as_u8(), 6);
        assert_eq!(OpCode::Hello.as_u8(), 10);
    }

    #[test]
    fn test_direction() {
        assert!(OpCode::Resume.is_client_op());
        assert!(OpCode::RequestGuildMembers.is_client_op());
        assert!(!OpCode::Hello.is_client_op());

        assert!(OpCode::InvalidSession.is_server_op());
        assert!(!OpCode::Identify.is_server_op());

        // Heartbeat flows both ways
        assert!(OpCode::Heartbeat.is_client_op());
        assert!(OpCode::Heartbeat.is_server_op());
    }

    #[test]
    fn test_only_identify_is_queueable() {
        assert!(OpCode::Identify.is_queueable());
        assert!(!OpCode::PresenceUpdate.is_queueable());
        assert!(!OpCode::Resume.is_queueable());
        assert!(!OpCode::Heartbeat.is_queueable());
    }

    #[test]
    fn test_handshake_ops() {
        assert!(OpCode::Identify.is_handshake());
        assert!(OpCode::Resume.is_handshake());
        assert!(!OpCode::PresenceUpdate.is_handshake());
        assert!(!OpCode::Heartbeat.is_handshake());
    }

    #[test]
    fn test_opcode_serialization() {
        assert_eq!(serde_json::to_string(&OpCode::Hello).unwrap(), "10");
        let op: OpCode = serde_json::from_str("9").unwrap();
        assert_eq!(op, OpCode::InvalidSession);
        assert!(serde_json::from_str::<OpCode>("5").is_err());
    }

    #[test]
    fn test_opcode_display() {
        assert_eq!(OpCode::Reconnect.to_string(), "Reconnect (7)");
    }
}
