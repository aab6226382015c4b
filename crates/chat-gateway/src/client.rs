//! Bot client
//!
//! Pairs the REST client with the gateway session manager: resolves the
//! endpoint and session-start quota over REST, then starts the gateway.

use std::sync::Arc;

use chat_common::ClientConfig;
use chat_rest::{GatewayBotInfo, RestClient};

use crate::broadcast::ListenerId;
use crate::config::GatewayConfig;
use crate::connection::Transport;
use crate::error::GatewayResult;
use crate::events::{GatewayEvent, GatewayEventType};
use crate::protocol::PresenceUpdatePayload;
use crate::supervisor::Gateway;

/// A bot connection: REST plus gateway
#[derive(Debug, Clone)]
pub struct Client {
    rest: RestClient,
    gateway: Gateway,
}

impl Client {
    pub fn new(config: &ClientConfig) -> GatewayResult<Self> {
        let rest = RestClient::from_config(config)?;
        let gateway = Gateway::new(GatewayConfig::from_client_config(config)?);
        Ok(Self::from_parts(rest, gateway))
    }

    /// Client whose gateway opens sockets through `transport`
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> GatewayResult<Self> {
        let rest = RestClient::from_config(config)?;
        let gateway = Gateway::with_transport(GatewayConfig::from_client_config(config)?, transport);
        Ok(Self::from_parts(rest, gateway))
    }

    pub fn from_parts(rest: RestClient, gateway: Gateway) -> Self {
        Self { rest, gateway }
    }

    /// Resolve the endpoint and start the gateway
    pub async fn start(&self) -> GatewayResult<GatewayBotInfo> {
        let info = self.rest.get_gateway_bot().await?;
        tracing::info!(
            url = %info.url,
            shards = info.shards,
            remaining = info.session_start_limit.remaining,
            reset_after_ms = info.session_start_limit.reset_after,
            "Gateway endpoint resolved"
        );

        self.gateway.set_session_start_limit(info.session_start_limit);
        self.gateway.start(&info.url)?;
        Ok(info)
    }

    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.gateway.on(event, listener)
    }

    /// Subscribe to a known dispatch event
    pub fn on_event<F>(&self, event: GatewayEventType, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.gateway.on(event, listener)
    }

    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.gateway.on_any(listener)
    }

    pub fn send_presence(&self, presence: PresenceUpdatePayload) -> GatewayResult<()> {
        self.gateway.update_presence(presence)
    }

    pub fn close(&self, code: u16, reason: &str) {
        self.gateway.close(code, reason);
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }
}
