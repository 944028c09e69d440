//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI

use indoc::indoc;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show this help message")]
    Help,
    #[command(description = "Cancel the current operation")]
    Cancel,
}

pub const WELCOME_TEXT: &str =
    "Welcome to YT-DLP Telegram Bot! Send me a video URL, and I will download it for you.";

pub const HELP_TEXT: &str = indoc! {"
    How to use this bot:

    1. Send a video URL from YouTube, Twitter, Instagram, etc.
    2. Choose the video quality
    3. Wait for the download to complete

    Commands:
    /start - Start the bot
    /help - Show this help message
    /cancel - Cancel the current operation"};

/// Creates a Bot instance from the configured token
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - No token configured or the HTTP client could not be built
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.expose_secret();
    if token.is_empty() {
        anyhow::bail!("TELEGRAM_BOT_TOKEN is not set");
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
///
/// # Arguments
/// * `bot` - Bot instance to configure
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(command_list()).await?;
    Ok(())
}

fn command_list() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("help", "Show this help message"),
        BotCommand::new("cancel", "Cancel the current operation"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_list() {
        let commands = command_list();
        let names: Vec<&str> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["start", "help", "cancel"]);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/cancel", "ytgrab_bot").ok(), Some(Command::Cancel));
        assert_eq!(Command::parse("/help@ytgrab_bot", "ytgrab_bot").ok(), Some(Command::Help));
        assert!(Command::parse("https://youtu.be/abc", "ytgrab_bot").is_err());
    }

    #[test]
    fn test_help_lists_every_command() {
        for command in ["/start", "/help", "/cancel"] {
            assert!(HELP_TEXT.contains(command), "{}", command);
        }
        assert!(HELP_TEXT.starts_with("How to use this bot:\n\n1."));
    }
}
