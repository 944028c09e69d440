//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::handle_command;
use super::types::{sender_key, HandlerDeps, HandlerError};
use crate::download::pipeline::{handle_quality_callback, handle_url_message, CallbackOutcome};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used for long polling and for the webhook listener.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
                handle_command(&bot, &msg, cmd, &deps).await
            }
        },
    ))
}

/// Any other text message is treated as a URL submission
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default();
                let outcome = handle_url_message(&deps.flow, &bot, msg.chat.id, sender_key(&msg), text).await?;
                log::debug!("URL message from chat {} finished: {:?}", msg.chat.id, outcome);
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            // Answer right away so the client stops showing the spinner
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let Some(data) = q.data.as_deref() else {
                return Ok(());
            };
            let chat = q.message.as_ref().map(|m| m.chat().id).unwrap_or_else(|| q.from.id.into());
            let status = q.message.as_ref().map(|m| m.id());

            let outcome = handle_quality_callback(&deps.flow, &bot, chat, status, q.from.id.0, data).await?;
            if outcome == CallbackOutcome::InProgress {
                log::info!("Ignoring repeated quality selection from user {}", q.from.id);
            }
            Ok(())
        }
    })
}
