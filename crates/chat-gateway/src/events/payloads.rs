//! Dispatch payloads the session manager itself reads
//!
//! Everything else in `d` is forwarded to subscribers untouched.

use serde::{Deserialize, Serialize};

/// READY payload, sent after a successful Identify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    pub v: u8,

    pub user: CurrentUser,

    /// Session ID for resuming
    pub session_id: String,

    /// URL to use when resuming this session
    pub resume_gateway_url: String,

    /// `[shard_id, num_shards]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<[u32; 2]>,
}

/// The bot user in READY
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}
