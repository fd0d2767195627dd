use crate::bot::alerts::send_backend_events;
use crate::bot::commands::{parse_command, Command};
use crate::bot::menu::{rules_keyboard, RULES_PROMPT};
use crate::context::AppContext;
use crate::rules::Backend;
use anyhow::Result;
use teloxide::types::{CallbackQuery, ChatId, Message, Update, UpdateKind};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

/// Route one inbound update to its handler.
///
/// Errors are logged here; nothing is reported back to the caller.
pub async fn handle_update(ctx: &AppContext, update: Update) {
    match update.kind {
        UpdateKind::Message(msg) => handle_message(ctx, &msg).await,
        UpdateKind::CallbackQuery(q) => {
            if let Err(e) = handle_callback(ctx, &q).await {
                error!("Callback handler error: {}", e);
            }
        }
        _ => debug!(update_id = update.id.0, "Ignoring unsupported update kind"),
    }
}

async fn handle_message(ctx: &AppContext, msg: &Message) {
    let user_id = msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed());
    if !ctx.is_allowed(user_id) {
        info!("⛔️ Ignoring message from unauthorized user {}", user_id);
        return;
    }

    let Some(cmd) = msg
        .text()
        .and_then(|text| parse_command(text, &ctx.settings.bot_username))
    else {
        debug!("Ignoring non-command message in chat {}", msg.chat.id.0);
        return;
    };

    info!("User {} issued {:?} in chat {}", user_id, cmd, msg.chat.id.0);
    if let Err(e) = handle_command(ctx, msg.chat.id, cmd).await {
        error!("Command error: {}", e);
    }
}

/// Execute a parsed command.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_command(ctx: &AppContext, chat_id: ChatId, cmd: Command) -> Result<()> {
    match cmd {
        Command::Rules => {
            ctx.sender
                .send_menu(chat_id, RULES_PROMPT.to_string(), rules_keyboard())
                .await
        }
        Command::Help => {
            ctx.sender
                .send_text(chat_id, Command::descriptions().to_string())
                .await
        }
    }
}

/// Echo the selected rule, then fetch and send its events.
///
/// # Errors
///
/// Returns an error if the echo message cannot be sent. Event delivery
/// failures are logged by the delivery stage and do not surface here.
pub async fn handle_callback(ctx: &AppContext, q: &CallbackQuery) -> Result<()> {
    let user_id = q.from.id.0.cast_signed();
    if !ctx.is_allowed(user_id) {
        info!("⛔️ Ignoring callback from unauthorized user {}", user_id);
        return Ok(());
    }

    let Some(rule) = q.data.as_deref() else {
        debug!("Callback query without data from user {}", user_id);
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map_or_else(|| ChatId::from(q.from.id), |m| m.chat().id);

    handle_rule_selected(ctx, chat_id, rule).await
}

/// Echo `rule` to the chat and deliver events from every backend owning it.
///
/// # Errors
///
/// Returns an error if the echo message cannot be sent.
pub async fn handle_rule_selected(ctx: &AppContext, chat_id: ChatId, rule: &str) -> Result<()> {
    info!("Rule {} selected in chat {}", rule, chat_id.0);
    ctx.sender.send_text(chat_id, format!("--- {rule} ---")).await?;

    for backend in Backend::for_rule(rule) {
        send_backend_events(ctx, chat_id, backend, rule).await;
    }
    Ok(())
}
