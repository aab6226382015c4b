//! Configuration structs

mod app_config;

pub use app_config::{
    ApiConfig, AppSettings, BotConfig, ClientConfig, ConfigError, Environment, GatewaySettings,
};
