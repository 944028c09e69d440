use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ytgrab")]
#[command(author, version, about = "Telegram bot that downloads videos and audio with yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Use webhook mode instead of long polling (also enabled by USE_WEBHOOK=true)
        #[arg(long)]
        webhook: bool,
    },

    /// Remove every leftover scratch directory and exit
    Cleanup,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_no_subcommand() {
        let cli = Cli::try_parse_from(["ytgrab"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_run_webhook_flag() {
        let cli = Cli::try_parse_from(["ytgrab", "run", "--webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { webhook: true }));
    }

    #[test]
    fn test_cleanup() {
        let cli = Cli::try_parse_from(["ytgrab", "cleanup"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Cleanup));
    }
}
