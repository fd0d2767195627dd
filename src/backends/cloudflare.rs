use super::{BackendError, FirewallLog, TimeWindow};
use crate::config::{Settings, MAX_EVENTS};
use crate::events::FirewallLogEntry;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const FIREWALL_EVENTS_QUERY: &str = r"query ListFirewallEvents($zoneTag: string, $filter: FirewallEventsAdaptiveFilter_InputObject) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      firewallEventsAdaptive(
        filter: $filter
        limit: {limit}
        orderBy: [datetime_DESC]
      ) {
        action
        clientCountryName
        clientIP
        clientRequestHTTPMethodName
        clientRequestHTTPProtocol
        clientRequestHTTPHost
        clientRequestPath
        datetime
        userAgent
      }
    }
  }
}";

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Viewer>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    viewer: Zones,
}

#[derive(Debug, Deserialize)]
struct Zones {
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Zone {
    #[serde(default)]
    firewall_events_adaptive: Vec<FirewallLogEntry>,
}

/// Cloudflare GraphQL analytics client for one zone
pub struct CloudflareClient {
    http: HttpClient,
    endpoint: String,
    token: String,
    zone_tag: String,
}

impl CloudflareClient {
    /// Create a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self, BackendError> {
        let http = HttpClient::builder()
            .timeout(settings.http_timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.cloudflare_graphql_url.clone(),
            token: settings.cloudflare_token.clone(),
            zone_tag: settings.cloudflare_zone_tag.clone(),
        })
    }

    fn request_body(&self, window: TimeWindow) -> Value {
        json!({
            "query": FIREWALL_EVENTS_QUERY.replace("{limit}", &MAX_EVENTS.to_string()),
            "variables": {
                "zoneTag": self.zone_tag,
                "filter": {
                    "datetime_geq": window.start_rfc3339(),
                    "datetime_leq": window.end_rfc3339(),
                    "action": "block"
                }
            }
        })
    }
}

#[async_trait]
impl FirewallLog for CloudflareClient {
    async fn blocked_events(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<FirewallLogEntry>, BackendError> {
        debug!(
            zone = %self.zone_tag,
            start = %window.start_rfc3339(),
            end = %window.end_rfc3339(),
            "Querying Cloudflare firewall events"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&self.request_body(window))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
                body.push_str("... (truncated)");
            }
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GraphQlResponse = response.json().await?;
        parse_events(parsed)
    }
}

fn parse_events(response: GraphQlResponse) -> Result<Vec<FirewallLogEntry>, BackendError> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(BackendError::GraphQl(messages.join("; ")));
    }

    response
        .data
        .ok_or_else(|| BackendError::Malformed("missing data".into()))?
        .viewer
        .zones
        .into_iter()
        .next()
        .map(|zone| zone.firewall_events_adaptive)
        .ok_or_else(|| BackendError::Malformed("no zone in response".into()))
}
