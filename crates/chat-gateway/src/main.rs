//! Bot entry point
//!
//! Run with:
//! ```bash
//! BOT_TOKEN=... cargo run -p chat-gateway --bin chat-bot
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use chat_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use chat_gateway::{Client, GatewayEvent, GatewayEventType, TERMINATED_EVENT};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Bot stopped");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("Failed to load configuration")?;

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        api = %config.api.versioned_url(),
        "Starting bot"
    );

    let client = Client::new(&config)?;

    let (terminated_tx, mut terminated_rx) = mpsc::unbounded_channel();
    client.on(TERMINATED_EVENT, move |event| {
        if let GatewayEvent::Terminated(reason) = event {
            let _ = terminated_tx.send(reason.clone());
        }
    });
    client.on_event(GatewayEventType::Ready, |event| {
        if let Some(ready) = event.as_dispatch() {
            info!(user = %ready.data["user"]["username"], "Bot is ready");
        }
    });
    client.on_any(|event| debug!(event = event.name(), "Event received"));

    client.start().await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            client.close(1000, "Shutting down");
            Ok(())
        }
        reason = terminated_rx.recv() => match reason {
            Some(reason) => Err(reason.into()),
            None => Ok(()),
        }
    }
}
