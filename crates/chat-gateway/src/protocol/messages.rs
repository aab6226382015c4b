//! Gateway frame format
//!
//! Every frame in either direction is a JSON object `{op, d, s, t}`.

use super::{HelloPayload, IdentifyPayload, OpCode, PresenceUpdatePayload, ResumePayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway frame
///
/// `op` stays a raw integer so frames with op codes this client does not
/// know still parse and can be logged and skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,

    /// Event data payload; `null` when absent
    #[serde(default)]
    pub d: Value,

    /// Sequence number (dispatch only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event name (dispatch only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayMessage {
    /// Frame with the given op code and payload
    #[must_use]
    pub fn new(op: OpCode, d: Value) -> Self {
        Self {
            op: op.as_u8(),
            d,
            s: None,
            t: None,
        }
    }

    fn with_payload<T: Serialize>(op: OpCode, payload: &T) -> Self {
        Self::new(op, serde_json::to_value(payload).unwrap_or_default())
    }

    // === Client frames ===

    /// Heartbeat (op=1) carrying the last sequence number, or null
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::new(
            OpCode::Heartbeat,
            last_sequence.map_or(Value::Null, |s| Value::Number(s.into())),
        )
    }

    /// Identify (op=2)
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::with_payload(OpCode::Identify, payload)
    }

    /// Presence Update (op=3)
    #[must_use]
    pub fn presence_update(payload: &PresenceUpdatePayload) -> Self {
        Self::with_payload(OpCode::PresenceUpdate, payload)
    }

    /// Resume (op=6)
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self::with_payload(OpCode::Resume, payload)
    }

    // === Server frames (built by tests and mock servers) ===

    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self::with_payload(OpCode::Hello, &HelloPayload { heartbeat_interval })
    }

    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch.as_u8(),
            d: data,
            s: Some(sequence),
            t: Some(event_type.into()),
        }
    }

    #[must_use]
    pub fn invalid_session(resumable: bool) -> Self {
        Self::new(OpCode::InvalidSession, Value::Bool(resumable))
    }

    // === Parsing ===

    /// Known op code, if any
    #[must_use]
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }

    /// Try to parse as a Hello payload (op=10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.opcode() != Some(OpCode::Hello) {
            return None;
        }
        serde_json::from_value(self.d.clone()).ok()
    }

    /// `d` of an Invalid Session frame (op=9): whether the session is resumable
    ///
    /// Anything other than `true` counts as not resumable.
    #[must_use]
    pub fn invalid_session_resumable(&self) -> bool {
        self.d.as_bool().unwrap_or(false)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opcode() {
            Some(op) => write!(f, "GatewayMessage(op={op}")?,
            None => write!(f, "GatewayMessage(op=Unknown ({})", self.op)?,
        }
        if let Some(t) = &self.t {
            write!(f, ", t={t}")?;
        }
        if let Some(s) = self.s {
            write!(f, ", s={s}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{IdentifyProperties, Intents};
    use serde_json::json;

    #[test]
    fn test_heartbeat_frames() {
        assert_eq!(GatewayMessage::heartbeat(None).to_json().unwrap(), r#"{"op":1,"d":null}"#);
        assert_eq!(GatewayMessage::heartbeat(Some(41)).to_json().unwrap(), r#"{"op":1,"d":41}"#);
    }

    #[test]
    fn test_identify_frame() {
        let msg = GatewayMessage::identify(&IdentifyPayload {
            token: "abc".to_string(),
            intents: Intents::GUILDS,
            properties: IdentifyProperties::for_client("chat-bot"),
            presence: None,
        });

        assert_eq!(msg.opcode(), Some(OpCode::Identify));
        assert_eq!(msg.d["token"], "abc");
        assert_eq!(msg.d["intents"], 1);
    }

    #[test]
    fn test_resume_frame() {
        let msg = GatewayMessage::resume(&ResumePayload {
            token: "abc".to_string(),
            session_id: "s1".to_string(),
            seq: 7,
        });

        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"op": 6, "d": {"token": "abc", "session_id": "s1", "seq": 7}})
        );
    }

    #[test]
    fn test_parse_dispatch() {
        let msg = GatewayMessage::from_json(
            r#"{"op":0,"d":{"content":"hi"},"s":42,"t":"MESSAGE_CREATE"}"#,
        )
        .unwrap();

        assert_eq!(msg.opcode(), Some(OpCode::Dispatch));
        assert_eq!(msg.s, Some(42));
        assert_eq!(msg.t.as_deref(), Some("MESSAGE_CREATE"));
        assert_eq!(msg.d["content"], "hi");
    }

    #[test]
    fn test_parse_null_fields() {
        let msg = GatewayMessage::from_json(r#"{"op":11,"d":null,"s":null,"t":null}"#).unwrap();
        assert_eq!(msg.opcode(), Some(OpCode::HeartbeatAck));
        assert!(msg.s.is_none());
        assert!(msg.t.is_none());

        let msg = GatewayMessage::from_json(r#"{"op":7}"#).unwrap();
        assert_eq!(msg.opcode(), Some(OpCode::Reconnect));
        assert!(msg.d.is_null());
    }

    #[test]
    fn test_unknown_opcode_still_parses() {
        let msg = GatewayMessage::from_json(r#"{"op":42,"d":{}}"#).unwrap();
        assert_eq!(msg.opcode(), None);
        assert!(msg.to_string().contains("Unknown (42)"));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(GatewayMessage::from_json("not json").is_err());
        assert!(GatewayMessage::from_json(r#"{"d":{}}"#).is_err());
        assert!(GatewayMessage::from_json(r#"{"op":"ten"}"#).is_err());
    }

    #[test]
    fn test_hello() {
        let msg = GatewayMessage::hello(41_250);
        assert_eq!(msg.as_hello().unwrap().heartbeat_interval, 41_250);
        assert!(GatewayMessage::heartbeat(None).as_hello().is_none());
    }

    #[test]
    fn test_invalid_session_flag() {
        assert!(GatewayMessage::invalid_session(true).invalid_session_resumable());
        assert!(!GatewayMessage::invalid_session(false).invalid_session_resumable());
        assert!(!GatewayMessage::new(OpCode::InvalidSession, Value::Null).invalid_session_resumable());
    }

    #[test]
    fn test_message_display() {
        let dispatch = GatewayMessage::dispatch("READY", 1, json!({}));
        assert_eq!(dispatch.to_string(), "GatewayMessage(op=Dispatch (0), t=READY, s=1)");
    }
}
