//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the fixed query constants shared by both backends.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// How far back both backends are queried.
pub const LOOKBACK_HOURS: i64 = 3;
/// Maximum number of events fetched (and sent) per selected rule.
pub const MAX_EVENTS: i32 = 8;
/// Default GraphQL endpoint of the Cloudflare analytics API.
pub const CLOUDFLARE_GRAPHQL_URL: &str = "https://api.cloudflare.com/client/v4/graphql/";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// AWS access key ID used for the WAF sampler
    pub aws_access_key_id: String,
    /// AWS secret access key used for the WAF sampler
    pub aws_secret_access_key: String,
    /// AWS region; CloudFront-scoped web ACLs live in `us-east-1`
    #[serde(default = "default_aws_region")]
    pub aws_region: String,
    /// ARN of the CloudFront web ACL whose rules are sampled
    pub waf_web_acl_arn: String,

    /// Cloudflare API token with analytics read access
    pub cloudflare_token: String,
    /// Cloudflare zone tag (zone ID)
    pub cloudflare_zone_tag: String,
    /// GraphQL endpoint, overridable for testing
    #[serde(default = "default_cloudflare_graphql_url")]
    pub cloudflare_graphql_url: String,

    /// Address the webhook server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Path Telegram posts updates to
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Public webhook URL registered with Telegram at startup, if set
    pub webhook_url: Option<String>,
    /// Bot username, used to reject commands addressed to other bots
    #[serde(default)]
    pub bot_username: String,

    /// Comma-separated list of allowed user IDs; everyone is served when unset
    #[serde(rename = "allowed_users")]
    pub allowed_users_str: Option<String>,

    /// Timeout for outbound backend HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_cloudflare_graphql_url() -> String {
    CLOUDFLARE_GRAPHQL_URL.to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    30
}

/// Builds the layered configuration source.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Load settings from files and the environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use waf_alert_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required value is missing or blank.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(build_config()?)
    }

    /// Deserialize and validate settings from an already built `Config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required value is missing or blank.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("telegram_token", &self.telegram_token),
            ("aws_access_key_id", &self.aws_access_key_id),
            ("aws_secret_access_key", &self.aws_secret_access_key),
            ("waf_web_acl_arn", &self.waf_web_acl_arn),
            ("cloudflare_token", &self.cloudflare_token),
            ("cloudflare_zone_tag", &self.cloudflare_zone_tag),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Returns the set of Telegram IDs allowed to use the bot.
    ///
    /// An empty set means access is not restricted.
    #[must_use]
    pub fn allowed_users(&self) -> HashSet<i64> {
        self.allowed_users_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Timeout applied to outbound backend requests.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        telegram_token: "123456789:dummy".to_string(),
        aws_access_key_id: "AKIDEXAMPLE".to_string(),
        aws_secret_access_key: "secret".to_string(),
        aws_region: default_aws_region(),
        waf_web_acl_arn: "arn:aws:wafv2:us-east-1:123456789012:global/webacl/main/abc".to_string(),
        cloudflare_token: "cf-token".to_string(),
        cloudflare_zone_tag: "zone-1".to_string(),
        cloudflare_graphql_url: default_cloudflare_graphql_url(),
        bind_addr: default_bind_addr(),
        webhook_path: default_webhook_path(),
        webhook_url: None,
        bot_username: String::new(),
        allowed_users_str: None,
        http_timeout_secs: default_http_timeout_secs(),
    }
}
