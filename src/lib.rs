#![deny(missing_docs)]
//! Telegram webhook bot reporting recent AWS WAF and Cloudflare firewall events.
//!
//! Normalizes sampled WAF requests and blocked firewall events into one
//! message format and delivers them to the chat that picked the rule.

/// Security event backends (AWS WAF, Cloudflare).
pub mod backends;
/// Telegram command handling and message delivery.
pub mod bot;
/// Configuration management.
pub mod config;
/// Application context shared by handlers.
pub mod context;
/// Backend record normalization and rendering.
pub mod events;
/// Logging setup with secret redaction.
pub mod logging;
/// Rule identifiers and backend routing.
pub mod rules;
/// Inbound webhook HTTP server.
pub mod server;
