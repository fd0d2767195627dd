//! Event fetch and delivery
//!
//! Queries the backend owning a rule, normalizes the records and sends one
//! message per event. The first failure ends the batch.

use crate::backends::TimeWindow;
use crate::bot::messaging::ChatSender;
use crate::context::AppContext;
use crate::events::SecurityEvent;
use crate::rules::Backend;
use std::fmt::Display;
use teloxide::types::ChatId;
use tracing::{error, info};

/// Appended to every delivery failure log line.
pub const RATE_LIMIT_WARNING: &str =
    "(The bot will not be able to send more than 20 messages per minute to the same group.)";

/// Outcome of one batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Messages delivered before the batch ended
    pub sent: usize,
    /// Error that ended the batch early, if any
    pub failure: Option<String>,
}

impl DeliveryReport {
    fn failed(sent: usize, err: impl Display) -> Self {
        error!("[ERROR] {err} {RATE_LIMIT_WARNING}");
        Self {
            sent,
            failure: Some(err.to_string()),
        }
    }
}

/// Send each event as its own HTML message, stopping at the first send error.
pub async fn deliver_events<I>(sender: &dyn ChatSender, chat_id: ChatId, events: I) -> DeliveryReport
where
    I: IntoIterator<Item = SecurityEvent>,
{
    let mut sent = 0;
    for event in events {
        if let Err(e) = sender.send_html(chat_id, event.to_html()).await {
            return DeliveryReport::failed(sent, e);
        }
        sent += 1;
    }
    DeliveryReport { sent, failure: None }
}

/// Fetch and deliver the latest events for `rule` from `backend`.
pub async fn send_backend_events(
    ctx: &AppContext,
    chat_id: ChatId,
    backend: Backend,
    rule: &str,
) -> DeliveryReport {
    let window = TimeWindow::last_hours();
    let sender = ctx.sender.as_ref();

    let report = match backend {
        Backend::Waf => match ctx.waf.sampled_requests(rule, window).await {
            Ok(records) => {
                deliver_events(sender, chat_id, records.iter().map(SecurityEvent::from).collect::<Vec<_>>()).await
            }
            Err(e) => DeliveryReport::failed(0, e),
        },
        Backend::FirewallLog => match ctx.firewall.blocked_events(window).await {
            Ok(entries) => {
                deliver_events(sender, chat_id, entries.iter().map(SecurityEvent::from).collect::<Vec<_>>()).await
            }
            Err(e) => DeliveryReport::failed(0, e),
        },
    };

    info!(
        rule,
        backend = ?backend,
        sent = report.sent,
        failed = report.failure.is_some(),
        "Event batch finished"
    );
    report
}
