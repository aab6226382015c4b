//! # chat-common
//!
//! Shared utilities for the bot client: environment configuration and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    ApiConfig, AppSettings, BotConfig, ClientConfig, ConfigError, Environment, GatewaySettings,
};
pub use telemetry::{
    init_tracing, try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};
