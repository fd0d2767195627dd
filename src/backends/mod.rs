//! Security event backends
//!
//! Clients for the AWS WAF sampler and the Cloudflare firewall event log,
//! behind traits so the bot handlers can be exercised without network access.

/// Cloudflare GraphQL firewall event client
pub mod cloudflare;
/// AWS WAF sampled request client
pub mod waf;

use crate::config::LOOKBACK_HOURS;
use crate::events::{FirewallLogEntry, WafSampledRequest};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use thiserror::Error;

pub use cloudflare::CloudflareClient;
pub use waf::WafClient;

/// Errors that can occur while querying a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error returned by the AWS WAF API
    #[error("WAF error: {0}")]
    Waf(String),
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success status from the Cloudflare API
    #[error("API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },
    /// Errors reported in the GraphQL response
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Closed UTC interval both backends are queried over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Inclusive end
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The trailing look-back window ending at `now`, truncated to whole seconds.
    #[must_use]
    pub fn trailing(now: DateTime<Utc>) -> Self {
        let end = now.trunc_subsecs(0);
        Self {
            start: end - Duration::hours(LOOKBACK_HOURS),
            end,
        }
    }

    /// The trailing look-back window ending now.
    #[must_use]
    pub fn last_hours() -> Self {
        Self::trailing(Utc::now())
    }

    /// Start as ISO 8601 with a `Z` suffix, e.g. `2022-09-13T07:35:00Z`.
    #[must_use]
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// End as ISO 8601 with a `Z` suffix.
    #[must_use]
    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Source of WAF sampled requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WafSampler: Send + Sync {
    /// Sampled requests that matched `rule_metric_name` within `window`.
    async fn sampled_requests(
        &self,
        rule_metric_name: &str,
        window: TimeWindow,
    ) -> Result<Vec<WafSampledRequest>, BackendError>;
}

/// Source of blocked firewall events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FirewallLog: Send + Sync {
    /// Most recent blocked events within `window`, newest first.
    async fn blocked_events(&self, window: TimeWindow)
        -> Result<Vec<FirewallLogEntry>, BackendError>;
}
