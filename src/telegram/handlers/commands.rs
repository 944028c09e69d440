//! Command handler implementations (/start, /help, /cancel)

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{sender_key, HandlerDeps, HandlerError};
use crate::download::pipeline::handle_cancel;
use crate::telegram::bot::{Command, HELP_TEXT, WELCOME_TEXT};

pub(super) async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME_TEXT).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
        }
        Command::Cancel => {
            handle_cancel(&deps.flow, bot, msg.chat.id, sender_key(msg)).await?;
        }
    }
    Ok(())
}
