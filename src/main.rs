use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use ytgrab::cli::{Cli, Commands};
use ytgrab::core::scratch::purge_all;
use ytgrab::core::session::SessionManager;
use ytgrab::core::{config, init_logger, log_startup_configuration};
use ytgrab::download::ytdlp::{check_and_update_ytdlp, MediaTool, YtDlp};
use ytgrab::download::FlowDeps;
use ytgrab::telegram::{create_bot, setup_bot_commands, transport, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation, HTTP server).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    let cli = Cli::parse_args();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    match cli.command {
        Some(Commands::Run { webhook }) => {
            let webhook = webhook || *config::USE_WEBHOOK;
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::Cleanup) => run_cleanup().await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(*config::USE_WEBHOOK).await
        }
    }
}

/// Run the Telegram bot
async fn run_bot(use_webhook: bool) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration(use_webhook);

    // yt-dlp extractors go stale quickly; refresh on every start
    check_and_update_ytdlp(&config::YTDL_BIN).await;

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let sessions = Arc::new(SessionManager::new());
    let tool: Arc<dyn MediaTool> = Arc::new(YtDlp::default());
    let flow = FlowDeps::new(Arc::clone(&sessions), tool, config::TEMP_ROOT.clone());

    transport::run(bot, HandlerDeps::new(flow), sessions, use_webhook).await
}

/// Remove all scratch directories once
async fn run_cleanup() -> Result<()> {
    let removed = purge_all(&config::TEMP_ROOT).await?;
    log::info!("Cleaned up {} temporary directories in {}", removed, config::TEMP_ROOT.display());
    println!("Cleaned up {} temporary directories", removed);
    Ok(())
}
