//! Update transport: long polling or webhook, plus the HTTP server.
//!
//! The HTTP server runs in both modes. In webhook mode teloxide's axum
//! listener contributes the `/bot<token>` route and the server shuts down
//! when the listener stops; in polling mode it shuts down after the
//! dispatcher returns.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use teloxide::dispatching::{Dispatcher, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::{webhooks, Polling};
use tokio::sync::oneshot;

use crate::core::config;
use crate::core::scratch::spawn_periodic_sweep;
use crate::core::session::SessionManager;
use crate::core::web_server::{self, setup_webhook, webhook_path, WebState};
use crate::telegram::handlers::{schema, HandlerDeps, HandlerError};

/// Secret token Telegram must echo on webhook calls.
///
/// Derived from the bot token so it stays stable across restarts and a
/// webhook registered earlier keeps working.
pub fn webhook_secret(token: &str) -> String {
    let mut hex = hex::encode(Sha256::digest(format!("ytgrab-webhook:{}", token).as_bytes()));
    hex.truncate(32);
    hex
}

/// Runs the bot until Ctrl-C.
pub async fn run(bot: Bot, deps: HandlerDeps, sessions: Arc<SessionManager>, use_webhook: bool) -> anyhow::Result<()> {
    let port = *config::PORT;
    let secret = webhook_secret(config::BOT_TOKEN.expose_secret());

    let state = WebState {
        bot: bot.clone(),
        sessions,
        temp_root: deps.flow.temp_root.clone(),
        started: Instant::now(),
        port,
        server_url: config::SERVER_URL.clone(),
        webhook_secret: secret.clone(),
    };
    let app = web_server::router(state);

    let sweep = spawn_periodic_sweep(deps.flow.temp_root.clone());
    let handler = schema(deps);

    let result = if use_webhook {
        run_webhook(bot, handler, app, port, secret).await
    } else {
        run_polling(bot, handler, app, port).await
    };

    sweep.abort();
    log::info!("Shutdown complete");
    result
}

async fn run_polling(
    bot: Bot,
    handler: UpdateHandler<HandlerError>,
    app: axum::Router,
    port: u16,
) -> anyhow::Result<()> {
    let (stop_server, server_stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(web_server::serve(app, port, async move {
        let _ = server_stopped.await;
    }));

    log::info!("Starting bot in long polling mode");
    log::info!("📡 Ready to receive updates!");

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .distribution_function(|_| None::<Infallible>)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(listener, LoggingErrorHandler::with_custom_text("An error from the update listener"))
        .await;

    log::info!("Dispatcher shutdown gracefully, stopping HTTP server");
    let _ = stop_server.send(());
    server.await??;
    Ok(())
}

async fn run_webhook(
    bot: Bot,
    handler: UpdateHandler<HandlerError>,
    app: axum::Router,
    port: u16,
    secret: String,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    // Only the path of this URL is used by the listener; registration goes
    // through `setup_webhook` with the public base URL.
    let base = config::SERVER_URL
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", port));
    let url = url::Url::parse(&format!("{}{}", base, webhook_path()))?;

    let options = webhooks::Options::new(addr, url).secret_token(secret.clone());
    let (listener, stop_flag, bot_router) = webhooks::axum_no_setup(options);
    let server = tokio::spawn(web_server::serve(app.merge(bot_router), port, stop_flag));

    log::info!("Bot is configured for webhook mode");

    if *config::AUTO_SETUP_WEBHOOK {
        let bot = bot.clone();
        tokio::spawn(async move {
            log::info!("Attempting automatic webhook setup...");
            tokio::time::sleep(Duration::from_secs(config::network::AUTO_WEBHOOK_DELAY_SECS)).await;

            let Some(server_url) = config::SERVER_URL.as_deref() else {
                log::error!("SERVER_URL environment variable not set. Cannot auto-setup webhook.");
                return;
            };
            let result = setup_webhook(&bot, server_url, &secret).await;
            if result.success {
                log::info!("Automatic webhook setup complete!");
            } else {
                log::error!("Automatic webhook setup failed: {}", result.message);
            }
        });
    }

    Dispatcher::builder(bot, handler)
        .distribution_function(|_| None::<Infallible>)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(listener, LoggingErrorHandler::with_custom_text("An error from the update listener"))
        .await;

    log::info!("Dispatcher shutdown gracefully, waiting for HTTP server");
    server.await??;
    Ok(())
}
