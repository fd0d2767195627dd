use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use waf_alert_bot::config::Settings;
use waf_alert_bot::context::AppContext;
use waf_alert_bot::logging::{init_logging, RedactionPatterns};
use waf_alert_bot::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Redaction must be ready before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting WAF alert bot...");

    let settings = init_settings();
    let bind_addr = settings.bind_addr.clone();
    let webhook_url = settings.webhook_url.clone();

    let bot = Bot::new(settings.telegram_token.clone());
    let ctx = match AppContext::new(settings, bot.clone()).await {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Failed to initialize backends: {}", e);
            std::process::exit(1);
        }
    };
    info!("Backends initialized.");

    // Only point Telegram at us once the handlers can serve it
    if let Some(url) = webhook_url {
        register_webhook(&bot, &url).await;
    }

    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await?;
    info!("Webhook server listening on {}", bind_addr);

    axum::serve(listener, server::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete.");
    Ok(())
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn register_webhook(bot: &Bot, url: &str) {
    let parsed = match reqwest::Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            warn!("Invalid WEBHOOK_URL {url}: {e}; not registering webhook");
            return;
        }
    };
    match bot.set_webhook(parsed).await {
        Ok(_) => info!("Webhook registered at {}", url),
        Err(e) => warn!("Failed to register webhook: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Ctrl-C received, shutting down...");
}
