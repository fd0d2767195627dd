//! Inbound webhook endpoint
//!
//! Telegram posts each update here. The update is handled to completion before
//! the fixed acknowledgment is returned, whatever the outcome.

use crate::bot::handlers::handle_update;
use crate::context::AppContext;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use teloxide::types::Update;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Body returned for every webhook call.
pub const ACK_BODY: &str = r#"{"status": "ok"}"#;

/// Build the HTTP router serving the webhook at the configured path.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let path = normalize_path(&ctx.settings.webhook_path);
    Router::new()
        .route("/healthz", get(healthz))
        .route(&path, post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn webhook(State(ctx): State<Arc<AppContext>>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => handle_update(&ctx, update).await,
        Err(e) => warn!("Discarding malformed update: {}", e),
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        ACK_BODY,
    )
}
