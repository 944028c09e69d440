//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the effective configuration

use anyhow::Result;
use secrecy::ExposeSecret;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// Never logs the bot token itself, only whether one was found.
pub fn log_startup_configuration(webhook: bool) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Startup Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.expose_secret().is_empty() {
        log::error!("❌ TELEGRAM_BOT_TOKEN: not set");
    } else {
        log::info!("✅ TELEGRAM_BOT_TOKEN: set");
    }

    log::info!("Transport: {}", if webhook { "webhook" } else { "long polling" });
    log::info!("HTTP port: {}", *config::PORT);
    log::info!("Temp root: {}", config::TEMP_ROOT.display());
    log::info!("yt-dlp binary: {}", *config::YTDL_BIN);

    match config::SERVER_URL.as_deref() {
        Some(url) => log::info!("✅ SERVER_URL: {}", url),
        None if webhook => log::warn!("⚠️  SERVER_URL: not set, webhook URL will be derived from request headers"),
        None => log::info!("SERVER_URL: not set"),
    }

    if *config::AUTO_SETUP_WEBHOOK && config::SERVER_URL.is_none() {
        log::warn!("⚠️  AUTO_SETUP_WEBHOOK is enabled but SERVER_URL is missing, skipping auto setup");
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
