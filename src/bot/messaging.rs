//! Outbound Telegram messaging.
//!
//! Handlers talk to [`ChatSender`] instead of `Bot` directly so every send
//! can be observed in tests.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, ParseMode};

/// Interface for sending chat messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send plain text.
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()>;
    /// Send text with HTML markup.
    async fn send_html(&self, chat_id: ChatId, text: String) -> Result<()>;
    /// Send text with an inline keyboard attached.
    async fn send_menu(
        &self,
        chat_id: ChatId,
        text: String,
        markup: InlineKeyboardMarkup,
    ) -> Result<()>;
}

/// [`ChatSender`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Wrap a bot instance.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_menu(
        &self,
        chat_id: ChatId,
        text: String,
        markup: InlineKeyboardMarkup,
    ) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .reply_markup(markup)
            .await?;
        Ok(())
    }
}
