use super::{BackendError, TimeWindow, WafSampler};
use crate::config::{Settings, MAX_EVENTS};
use crate::events::WafSampledRequest;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_wafv2::error::DisplayErrorContext;
use aws_sdk_wafv2::primitives::DateTime as AwsDateTime;
use aws_sdk_wafv2::types::{HttpRequest, SampledHttpRequest, Scope, TimeWindow as AwsTimeWindow};
use aws_sdk_wafv2::Client;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use tracing::debug;

/// AWS WAF client scoped to one CloudFront web ACL
pub struct WafClient {
    client: Client,
    web_acl_arn: String,
}

impl WafClient {
    /// Build the client from static credentials in `settings`.
    pub async fn new(settings: &Settings) -> Self {
        let credentials = Credentials::new(
            &settings.aws_access_key_id,
            &settings.aws_secret_access_key,
            None,
            None,
            "waf-alert-bot",
        );

        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(settings.http_timeout())
            .build();

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.aws_region.clone()))
            .timeout_config(timeouts)
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            web_acl_arn: settings.waf_web_acl_arn.clone(),
        }
    }
}

#[async_trait]
impl WafSampler for WafClient {
    async fn sampled_requests(
        &self,
        rule_metric_name: &str,
        window: TimeWindow,
    ) -> Result<Vec<WafSampledRequest>, BackendError> {
        let time_window = AwsTimeWindow::builder()
            .start_time(AwsDateTime::from_secs(window.start.timestamp()))
            .end_time(AwsDateTime::from_secs(window.end.timestamp()))
            .build()
            .map_err(|e| BackendError::Waf(e.to_string()))?;

        debug!(
            rule = rule_metric_name,
            start = %window.start_rfc3339(),
            end = %window.end_rfc3339(),
            "Requesting WAF sampled requests"
        );

        let output = self
            .client
            .get_sampled_requests()
            .web_acl_arn(&self.web_acl_arn)
            .rule_metric_name(rule_metric_name)
            .scope(Scope::Cloudfront)
            .time_window(time_window)
            .max_items(i64::from(MAX_EVENTS))
            .send()
            .await
            .map_err(|e| BackendError::Waf(DisplayErrorContext(&e).to_string()))?;

        Ok(output.sampled_requests().iter().map(convert).collect())
    }
}

fn convert(sample: &SampledHttpRequest) -> WafSampledRequest {
    convert_parts(sample.request(), sample.timestamp())
}

fn field(request: Option<&HttpRequest>, get: fn(&HttpRequest) -> Option<&str>) -> String {
    request.and_then(get).unwrap_or_default().to_string()
}

fn convert_parts(request: Option<&HttpRequest>, timestamp: Option<&AwsDateTime>) -> WafSampledRequest {
    let headers = request
        .map(|r| {
            r.headers()
                .iter()
                .map(|h| {
                    (
                        h.name().unwrap_or_default().to_string(),
                        h.value().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let timestamp = timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()))
        .unwrap_or_default();

    WafSampledRequest {
        uri: field(request, HttpRequest::uri),
        client_ip: field(request, HttpRequest::client_ip),
        country: field(request, HttpRequest::country),
        method: field(request, HttpRequest::method),
        http_version: field(request, HttpRequest::http_version),
        headers,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_wafv2::types::HttpHeader;

    fn header(name: &str, value: &str) -> HttpHeader {
        HttpHeader::builder().name(name).value(value).build()
    }

    #[test]
    fn test_convert_sdk_record() {
        let request = HttpRequest::builder()
            .client_ip("203.0.113.9")
            .country("FR")
            .uri("/login")
            .method("GET")
            .http_version("HTTP/1.1")
            .headers(header("host", "example.com"))
            .headers(header("user-agent", "curl/8.0"))
            .build();
        let timestamp = AwsDateTime::from_secs(1_663_054_509);

        let converted = convert_parts(Some(&request), Some(&timestamp));
        assert_eq!(converted.uri, "/login");
        assert_eq!(converted.client_ip, "203.0.113.9");
        assert_eq!(converted.country, "FR");
        assert_eq!(converted.method, "GET");
        assert_eq!(converted.http_version, "HTTP/1.1");
        assert_eq!(
            converted.headers,
            vec![
                ("host".to_string(), "example.com".to_string()),
                ("user-agent".to_string(), "curl/8.0".to_string()),
            ]
        );
        assert_eq!(converted.timestamp.timestamp(), 1_663_054_509);
    }

    #[test]
    fn test_convert_sparse_record() {
        assert_eq!(convert_parts(None, None), WafSampledRequest::default());
    }
}
