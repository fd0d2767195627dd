//! Per-process application context handed to every update handler.

use crate::backends::{CloudflareClient, FirewallLog, WafClient, WafSampler};
use crate::bot::messaging::{ChatSender, TelegramSender};
use crate::config::Settings;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};

/// Everything a handler needs: settings, the chat client and both backends
#[derive(Clone)]
pub struct AppContext {
    /// Validated settings
    pub settings: Arc<Settings>,
    /// Outbound chat messages
    pub sender: Arc<dyn ChatSender>,
    /// AWS WAF sampled requests
    pub waf: Arc<dyn WafSampler>,
    /// Cloudflare firewall events
    pub firewall: Arc<dyn FirewallLog>,
    allowed_users: Arc<HashSet<i64>>,
}

impl AppContext {
    /// Build the production context from validated settings.
    ///
    /// A blank `bot_username` is filled in from `getMe`.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend client cannot be constructed.
    pub async fn new(mut settings: Settings, bot: Bot) -> Result<Self> {
        if settings.bot_username.trim().is_empty() {
            match bot.get_me().await {
                Ok(me) => {
                    settings.bot_username = me.user.username.clone().unwrap_or_default();
                    info!("Resolved bot username @{}", settings.bot_username);
                }
                Err(e) => warn!("Failed to resolve bot username: {}", e),
            }
        }
        let waf = WafClient::new(&settings).await;
        let firewall = CloudflareClient::new(&settings)?;
        Ok(Self::from_parts(
            settings,
            Arc::new(TelegramSender::new(bot)),
            Arc::new(waf),
            Arc::new(firewall),
        ))
    }

    /// Assemble a context from already constructed collaborators.
    #[must_use]
    pub fn from_parts(
        settings: Settings,
        sender: Arc<dyn ChatSender>,
        waf: Arc<dyn WafSampler>,
        firewall: Arc<dyn FirewallLog>,
    ) -> Self {
        let allowed_users = Arc::new(settings.allowed_users());
        Self {
            settings: Arc::new(settings),
            sender,
            waf,
            firewall,
            allowed_users,
        }
    }

    /// Whether `user_id` may use the bot. Everyone may when no list is configured.
    #[must_use]
    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

#[cfg(test)]
pub(crate) fn test_context(
    sender: crate::bot::messaging::MockChatSender,
    waf: crate::backends::MockWafSampler,
    firewall: crate::backends::MockFirewallLog,
) -> AppContext {
    AppContext::from_parts(
        crate::config::test_settings(),
        Arc::new(sender),
        Arc::new(waf),
        Arc::new(firewall),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockFirewallLog, MockWafSampler};
    use crate::bot::messaging::MockChatSender;

    #[test]
    fn test_everyone_allowed_without_list() {
        let ctx = test_context(
            MockChatSender::new(),
            MockWafSampler::new(),
            MockFirewallLog::new(),
        );
        assert!(ctx.is_allowed(1));
        assert!(ctx.is_allowed(0));
    }

    #[test]
    fn test_allow_list_restricts_users() {
        let mut settings = crate::config::test_settings();
        settings.allowed_users_str = Some("100, 200".to_string());
        let ctx = AppContext::from_parts(
            settings,
            Arc::new(MockChatSender::new()),
            Arc::new(MockWafSampler::new()),
            Arc::new(MockFirewallLog::new()),
        );
        assert!(ctx.is_allowed(100));
        assert!(!ctx.is_allowed(300));
    }
}
