//! Security event normalization
//!
//! Both backends return their own record shapes. They are mapped into
//! [`SecurityEvent`] here and rendered with one shared message template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A request sampled by AWS WAF for a rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WafSampledRequest {
    /// Request URI (path and query)
    pub uri: String,
    /// Client IP address
    pub client_ip: String,
    /// Two-letter country code
    pub country: String,
    /// HTTP method
    pub method: String,
    /// HTTP version, e.g. `HTTP/2.0`
    pub http_version: String,
    /// Request headers as (name, value) pairs in wire order
    pub headers: Vec<(String, String)>,
    /// Time the request was received
    pub timestamp: DateTime<Utc>,
}

/// An entry from the Cloudflare `firewallEventsAdaptive` dataset
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FirewallLogEntry {
    /// Firewall action, always `block` given the query filter
    #[serde(deserialize_with = "null_as_empty")]
    pub action: String,
    /// Client country name
    #[serde(deserialize_with = "null_as_empty")]
    pub client_country_name: String,
    /// Client IP address
    #[serde(rename = "clientIP", deserialize_with = "null_as_empty")]
    pub client_ip: String,
    /// HTTP method
    #[serde(rename = "clientRequestHTTPMethodName", deserialize_with = "null_as_empty")]
    pub client_request_http_method_name: String,
    /// HTTP protocol, e.g. `HTTP/1.1`
    #[serde(rename = "clientRequestHTTPProtocol", deserialize_with = "null_as_empty")]
    pub client_request_http_protocol: String,
    /// Requested host
    #[serde(rename = "clientRequestHTTPHost", deserialize_with = "null_as_empty")]
    pub client_request_http_host: String,
    /// Requested path
    #[serde(deserialize_with = "null_as_empty")]
    pub client_request_path: String,
    /// Event time as reported by Cloudflare
    #[serde(deserialize_with = "null_as_empty")]
    pub datetime: String,
    /// Client user agent
    #[serde(deserialize_with = "null_as_empty")]
    pub user_agent: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend-independent view of one security event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityEvent {
    /// Full request URL, `https://` + host + path
    pub url: String,
    /// Client IP address
    pub client_ip: String,
    /// Client country (code or name, as the backend reports it)
    pub country: String,
    /// HTTP method
    pub method: String,
    /// HTTP version
    pub http_version: String,
    /// Client user agent, empty when unknown
    pub user_agent: String,
    /// Human-readable UTC time
    pub time: String,
}

impl WafSampledRequest {
    /// Last value of the header with exactly this name, if any.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<&WafSampledRequest> for SecurityEvent {
    fn from(req: &WafSampledRequest) -> Self {
        let host = req.header("host").unwrap_or_default();
        Self {
            url: format!("https://{host}{}", req.uri),
            client_ip: req.client_ip.clone(),
            country: req.country.clone(),
            method: req.method.clone(),
            http_version: req.http_version.clone(),
            user_agent: req.header("user-agent").unwrap_or_default().to_string(),
            time: req.timestamp.format("%Y-%m-%d %H:%M:%S UTC+0").to_string(),
        }
    }
}

impl From<&FirewallLogEntry> for SecurityEvent {
    fn from(entry: &FirewallLogEntry) -> Self {
        Self {
            url: format!(
                "https://{}{}",
                entry.client_request_http_host, entry.client_request_path
            ),
            client_ip: entry.client_ip.clone(),
            country: entry.client_country_name.clone(),
            method: entry.client_request_http_method_name.clone(),
            http_version: entry.client_request_http_protocol.clone(),
            user_agent: entry.user_agent.clone(),
            time: entry.datetime.clone(),
        }
    }
}

impl SecurityEvent {
    /// Render the event as a Telegram HTML message.
    ///
    /// Field values are escaped; only the template's own tags are markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        let esc = |s: &str| html_escape::encode_text(s).into_owned();
        format!(
            "\n\u{1F4D6} <b>Sampled request</b>\n\
             <b>URL:</b>  {}\n\
             <b>Client IP:</b>  {}\n\
             <b>Country:</b>  {}\n\
             <b>Method:</b>  {}\n\
             <b>HTTPVersion:</b>  {}\n\
             <b>user-agent:</b>  {}\n\
             <b>Time:</b>  {}\n",
            esc(&self.url),
            esc(&self.client_ip),
            esc(&self.country),
            esc(&self.method),
            esc(&self.http_version),
            esc(&self.user_agent),
            esc(&self.time),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sampled(uri: &str, headers: &[(&str, &str)]) -> WafSampledRequest {
        WafSampledRequest {
            uri: uri.to_string(),
            client_ip: "203.0.113.7".to_string(),
            country: "DE".to_string(),
            method: "POST".to_string(),
            http_version: "HTTP/2.0".to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
            timestamp: Utc
                .with_ymd_and_hms(2022, 9, 13, 7, 5, 9)
                .single()
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_waf_mapping() {
        let req = sampled(
            "/login",
            &[("host", "example.com"), ("user-agent", "curl/8.0")],
        );
        let event = SecurityEvent::from(&req);
        assert_eq!(event.url, "https://example.com/login");
        assert_eq!(event.client_ip, "203.0.113.7");
        assert_eq!(event.country, "DE");
        assert_eq!(event.method, "POST");
        assert_eq!(event.http_version, "HTTP/2.0");
        assert_eq!(event.user_agent, "curl/8.0");
        assert_eq!(event.time, "2022-09-13 07:05:09 UTC+0");
    }

    #[test]
    fn test_waf_last_header_wins() {
        let req = sampled(
            "/",
            &[
                ("host", "first.example"),
                ("host", "second.example"),
                ("user-agent", "a"),
                ("user-agent", "b"),
            ],
        );
        let event = SecurityEvent::from(&req);
        assert_eq!(event.url, "https://second.example/");
        assert_eq!(event.user_agent, "b");
    }

    #[test]
    fn test_waf_header_names_are_case_sensitive() {
        let req = sampled("/x", &[("Host", "example.com"), ("User-Agent", "curl")]);
        let event = SecurityEvent::from(&req);
        assert_eq!(event.url, "https:///x");
        assert_eq!(event.user_agent, "");
    }

    #[test]
    fn test_waf_missing_headers_do_not_leak_between_records() {
        let with = sampled("/a", &[("host", "a.example"), ("user-agent", "ua")]);
        let without = sampled("/b", &[]);

        let first = SecurityEvent::from(&with);
        let second = SecurityEvent::from(&without);

        assert_eq!(first.url, "https://a.example/a");
        assert_eq!(second.url, "https:///b");
        assert_eq!(second.user_agent, "");
    }

    #[test]
    fn test_firewall_mapping() -> Result<(), serde_json::Error> {
        let entry: FirewallLogEntry = serde_json::from_str(
            r#"{
                "action": "block",
                "clientCountryName": "US",
                "clientIP": "198.51.100.1",
                "clientRequestHTTPMethodName": "GET",
                "clientRequestHTTPProtocol": "HTTP/1.1",
                "clientRequestHTTPHost": "a.b.com",
                "clientRequestPath": "/x",
                "datetime": "2022-09-13T07:35:00Z",
                "userAgent": "Mozilla/5.0"
            }"#,
        )?;
        let event = SecurityEvent::from(&entry);
        assert_eq!(event.url, "https://a.b.com/x");
        assert_eq!(event.client_ip, "198.51.100.1");
        assert_eq!(event.country, "US");
        assert_eq!(event.method, "GET");
        assert_eq!(event.http_version, "HTTP/1.1");
        assert_eq!(event.user_agent, "Mozilla/5.0");
        assert_eq!(event.time, "2022-09-13T07:35:00Z");
        Ok(())
    }

    #[test]
    fn test_firewall_missing_fields_default_to_empty() -> Result<(), serde_json::Error> {
        let entry: FirewallLogEntry = serde_json::from_str(r#"{"clientRequestPath": "/x"}"#)?;
        let event = SecurityEvent::from(&entry);
        assert_eq!(event.url, "https:///x");
        assert_eq!(event.user_agent, "");
        Ok(())
    }

    #[test]
    fn test_firewall_null_fields_default_to_empty() -> Result<(), serde_json::Error> {
        let entries: Vec<FirewallLogEntry> = serde_json::from_str(
            r#"[
                {"clientRequestHTTPHost": "a.b.com", "clientRequestPath": "/x", "userAgent": null},
                {"clientRequestHTTPHost": "c.d.com", "clientRequestPath": "/y", "userAgent": "curl"}
            ]"#,
        )?;
        assert_eq!(entries.len(), 2);
        assert_eq!(SecurityEvent::from(&entries[0]).user_agent, "");
        assert_eq!(entries[1].user_agent, "curl");
        Ok(())
    }

    #[test]
    fn test_render_template() {
        let event = SecurityEvent {
            url: "https://a.b.com/x".to_string(),
            client_ip: "1.2.3.4".to_string(),
            country: "US".to_string(),
            method: "GET".to_string(),
            http_version: "HTTP/1.1".to_string(),
            user_agent: "curl".to_string(),
            time: "2022-09-13T07:35:00Z".to_string(),
        };
        let expected = "\n\u{1F4D6} <b>Sampled request</b>\n\
                        <b>URL:</b>  https://a.b.com/x\n\
                        <b>Client IP:</b>  1.2.3.4\n\
                        <b>Country:</b>  US\n\
                        <b>Method:</b>  GET\n\
                        <b>HTTPVersion:</b>  HTTP/1.1\n\
                        <b>user-agent:</b>  curl\n\
                        <b>Time:</b>  2022-09-13T07:35:00Z\n";
        assert_eq!(event.to_html(), expected);
    }

    #[test]
    fn test_render_escapes_values() {
        let req = sampled(
            "/search?q=<script>&a=1",
            &[("host", "example.com"), ("user-agent", "<evil>")],
        );
        let html = SecurityEvent::from(&req).to_html();
        assert!(html.contains("https://example.com/search?q=&lt;script&gt;&amp;a=1"));
        assert!(html.contains("<b>user-agent:</b>  &lt;evil&gt;"));
    }
}
