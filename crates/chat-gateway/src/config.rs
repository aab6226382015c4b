//! Session manager configuration

use std::time::Duration;

use chat_common::ClientConfig;

use crate::outbound::{DEFAULT_CAPACITY, DEFAULT_QUEUE_CAPACITY, DEFAULT_TTL, DEFAULT_WINDOW};
use crate::protocol::{Activity, IdentifyProperties, Intents, InvalidIntent, PresenceUpdatePayload};

/// Gateway protocol version
pub const DEFAULT_API_VERSION: u8 = 10;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_millis(30_000);

/// Everything the session manager needs besides the endpoint
#[derive(Clone)]
pub struct GatewayConfig {
    pub token: String,
    pub intents: Intents,
    /// `v` query parameter
    pub version: u8,
    /// `encoding` query parameter; only `json` is understood
    pub encoding: String,
    pub properties: IdentifyProperties,
    /// Presence sent with Identify
    pub presence: Option<PresenceUpdatePayload>,

    pub max_reconnect_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,

    pub queue_ttl: Duration,
    pub queue_capacity: usize,
    pub rate_limit: usize,
    pub rate_window: Duration,

    /// Treat an unacknowledged heartbeat as a dead connection
    pub zombie_detection: bool,

    /// Bounds of the random wait before re-identifying after op 9
    pub invalid_session_delay: (Duration, Duration),
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            version: DEFAULT_API_VERSION,
            encoding: "json".to_string(),
            properties: IdentifyProperties::for_client("chat-bot"),
            presence: Some(default_presence()),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: DEFAULT_BACKOFF_CAP,
            queue_ttl: DEFAULT_TTL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            rate_limit: DEFAULT_CAPACITY,
            rate_window: DEFAULT_WINDOW,
            zombie_detection: false,
            invalid_session_delay: (Duration::from_secs(1), Duration::from_secs(5)),
        }
    }

    /// Build from the environment-derived client configuration
    pub fn from_client_config(config: &ClientConfig) -> Result<Self, InvalidIntent> {
        let intents = Intents::from_names(&config.gateway.intents)?;
        let gateway = &config.gateway;

        Ok(Self {
            version: config.api.version,
            encoding: gateway.encoding.clone(),
            properties: IdentifyProperties::for_client(config.bot.identify_name.clone()),
            max_reconnect_attempts: gateway.max_reconnect_attempts,
            backoff_base: Duration::from_millis(gateway.backoff_base_ms),
            backoff_cap: Duration::from_millis(gateway.backoff_cap_ms),
            queue_ttl: Duration::from_millis(gateway.queue_ttl_ms),
            zombie_detection: gateway.zombie_detection,
            ..Self::new(config.bot.token.clone(), intents)
        })
    }

    pub fn with_presence(mut self, presence: Option<PresenceUpdatePayload>) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    pub fn with_queue(mut self, ttl: Duration, capacity: usize) -> Self {
        self.queue_ttl = ttl;
        self.queue_capacity = capacity;
        self
    }

    pub fn with_rate_limit(mut self, limit: usize, window: Duration) -> Self {
        self.rate_limit = limit;
        self.rate_window = window;
        self
    }

    pub fn with_zombie_detection(mut self, enabled: bool) -> Self {
        self.zombie_detection = enabled;
        self
    }

    pub fn with_invalid_session_delay(mut self, min: Duration, max: Duration) -> Self {
        self.invalid_session_delay = (min, max.max(min));
        self
    }

    /// Socket URL for a gateway `url` with the version and encoding query
    pub fn endpoint(&self, url: &str) -> String {
        let base = url.trim_end_matches('/');
        format!("{base}?v={}&encoding={}", self.version, self.encoding)
    }
}

/// Presence advertised with Identify unless configured otherwise
fn default_presence() -> PresenceUpdatePayload {
    PresenceUpdatePayload::online()
        .with_activity(Activity::custom("Botting", "Doing BOT things"))
        .since_now()
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &"[REDACTED]")
            .field("intents", &self.intents)
            .field("version", &self.version)
            .field("encoding", &self.encoding)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("backoff_base", &self.backoff_base)
            .field("backoff_cap", &self.backoff_cap)
            .field("zombie_detection", &self.zombie_detection)
            .finish()
    }
}
