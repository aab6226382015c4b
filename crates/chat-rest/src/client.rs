//! HTTP client for the bot REST API

use std::time::Duration;

use chat_common::ClientConfig;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{RestError, RestResult};
use crate::models::{ApiErrorBody, GatewayBotInfo, GatewayInfo};

const USER_AGENT: &str = concat!(
    "chat-bot (",
    env!("CARGO_PKG_NAME"),
    ", ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated REST client
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    version: u8,
    token: String,
}

impl RestClient {
    /// Create a client for `base_url` (e.g. `https://discord.com/api`)
    pub fn new(base_url: impl Into<String>, version: u8, token: impl Into<String>) -> RestResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version,
            token: token.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> RestResult<Self> {
        Self::new(&config.api.base_url, config.api.version, &config.bot.token)
    }

    /// Full URL for an API path such as `/gateway/bot`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v{}{}", self.base_url, self.version, path)
    }

    /// Send a request and decode the JSON response
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        tracing::debug!(%method, %url, "REST request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            tracing::warn!(
                %method,
                path,
                status = status.as_u16(),
                code = ?body.code,
                "REST request failed"
            );
            return Err(RestError::Api {
                status: status.as_u16(),
                message: body
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string()),
                code: body.code,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null)
                .map_err(|e| RestError::InvalidResponse(e.to_string()));
        }

        Ok(response.json().await?)
    }

    /// `GET /gateway/bot`: connection URL plus the session-start quota
    pub async fn get_gateway_bot(&self) -> RestResult<GatewayBotInfo> {
        let info: GatewayBotInfo = self.request(Method::GET, "/gateway/bot", None::<&()>).await?;
        tracing::info!(
            url = %info.url,
            shards = info.shards,
            remaining = info.session_start_limit.remaining,
            "Resolved gateway endpoint"
        );
        Ok(info)
    }

    /// `GET /gateway`: unauthenticated variant without the quota
    pub async fn get_gateway(&self) -> RestResult<GatewayInfo> {
        self.request(Method::GET, "/gateway", None::<&()>).await
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
