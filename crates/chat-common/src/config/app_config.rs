//! Application configuration structs
//!
//! Loads the bot client configuration from environment variables (and an optional `.env` file).

use serde::Deserialize;
use std::env;
use std::fmt;

/// Main client configuration
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub api: ApiConfig,
    pub gateway: GatewaySettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Bot identity
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    /// Bot token, sent as `Authorization: Bot <token>` and in Identify/Resume
    pub token: String,
    /// Name reported in the identify `browser`/`device` properties
    #[serde(default = "default_identify_name")]
    pub identify_name: String,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("identify_name", &self.identify_name)
            .finish()
    }
}

/// REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub version: u8,
}

impl ApiConfig {
    /// Versioned API root, e.g. `https://discord.com/api/v10`
    #[must_use]
    pub fn versioned_url(&self) -> String {
        format!("{}/v{}", self.base_url.trim_end_matches('/'), self.version)
    }
}

/// Gateway session tuning
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Intent flag names (e.g. `GUILDS`) or a single decimal bitmask
    #[serde(default = "default_intents")]
    pub intents: Vec<String>,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    #[serde(default = "default_queue_ttl_ms")]
    pub queue_ttl_ms: u64,
    #[serde(default)]
    pub zombie_detection: bool,
}

// Default value functions
fn default_app_name() -> String {
    "chat-bot".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_identify_name() -> String {
    "chat-bot".to_string()
}

fn default_api_base_url() -> String {
    "https://discord.com/api".to_string()
}

fn default_api_version() -> u8 {
    10
}

fn default_encoding() -> String {
    "json".to_string()
}

fn default_intents() -> Vec<String> {
    vec!["GUILDS".to_string()]
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_cap_ms() -> u64 {
    30_000
}

fn default_queue_ttl_ms() -> u64 {
    5000
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `BOT_TOKEN` is missing or a numeric variable does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("BOT_TOKEN"))?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            bot: BotConfig {
                token,
                identify_name: lookup("BOT_IDENTIFY_NAME").unwrap_or_else(default_identify_name),
            },
            api: ApiConfig {
                base_url: lookup("API_BASE_URL").unwrap_or_else(default_api_base_url),
                version: parse_or(&lookup, "API_VERSION", default_api_version())?,
            },
            gateway: GatewaySettings {
                encoding: lookup("GATEWAY_ENCODING").unwrap_or_else(default_encoding),
                intents: lookup("GATEWAY_INTENTS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(default_intents),
                max_reconnect_attempts: parse_or(
                    &lookup,
                    "GATEWAY_MAX_RECONNECT_ATTEMPTS",
                    default_max_reconnect_attempts(),
                )?,
                backoff_base_ms: parse_or(&lookup, "GATEWAY_BACKOFF_BASE_MS", default_backoff_base_ms())?,
                backoff_cap_ms: parse_or(&lookup, "GATEWAY_BACKOFF_CAP_MS", default_backoff_cap_ms())?,
                queue_ttl_ms: parse_or(&lookup, "GATEWAY_QUEUE_TTL_MS", default_queue_ttl_ms())?,
                zombie_detection: parse_or(&lookup, "GATEWAY_ZOMBIE_DETECTION", false)?,
            },
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app", &self.app)
            .field("bot", &self.bot)
            .field("api", &self.api)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
