//! Response bodies of the gateway discovery endpoints

use serde::{Deserialize, Serialize};

/// `GET /gateway`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub url: String,
}

/// `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayBotInfo {
    /// WebSocket URL to connect to (without query string)
    pub url: String,
    /// Recommended shard count
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

/// Session-start quota reported by the API
///
/// Every identify consumes one unit of `remaining`; the quota resets
/// `reset_after` milliseconds from the time of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    /// Milliseconds until `remaining` resets to `total`
    pub reset_after: u64,
    pub max_concurrency: u32,
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_bot_deserialize() {
        let json = r#"{
            "url": "wss://gateway.discord.gg",
            "shards": 1,
            "session_start_limit": {
                "total": 1000,
                "remaining": 998,
                "reset_after": 86400000,
                "max_concurrency": 1
            }
        }"#;

        let info: GatewayBotInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.url, "wss://gateway.discord.gg");
        assert_eq!(info.shards, 1);
        assert_eq!(info.session_start_limit.remaining, 998);
        assert_eq!(info.session_start_limit.reset_after, 86_400_000);
    }

    #[test]
    fn test_error_body_partial() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"message": "401: Unauthorized"}"#).unwrap();
        assert_eq!(body.code, None);
        assert_eq!(body.message.as_deref(), Some("401: Unauthorized"));
    }
}
