//! HTTP server running next to the bot.
//!
//! Serves the landing page, health and metrics, webhook registration and the
//! maintenance cleanup. In webhook mode the Telegram update route is merged
//! into the same router by [`crate::telegram::transport`].

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use teloxide::prelude::*;
use tokio::net::TcpListener;

use crate::core::config;
use crate::core::metrics;
use crate::core::scratch::purge_all;
use crate::core::session::SessionManager;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub bot: Bot,
    pub sessions: Arc<SessionManager>,
    pub temp_root: PathBuf,
    pub started: Instant,
    pub port: u16,
    /// Configured public base URL, if any
    pub server_url: Option<String>,
    /// Secret Telegram echoes in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSetupResult {
    pub success: bool,
    pub message: String,
}

/// Builds the router with all maintenance routes.
pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/setup-success", get(index_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/setup-webhook", post(setup_webhook_handler))
        .route("/maintenance/cleanup", post(cleanup_handler))
        .with_state(state)
}

/// Binds `0.0.0.0:port` and serves `app` until `shutdown` resolves.
pub async fn serve<F>(app: Router, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;

    log::info!("Starting web server on http://{}", addr);
    log::info!("  /                    - Landing page");
    log::info!("  /health              - Health check (JSON)");
    log::info!("  /metrics             - Prometheus metrics");
    log::info!("  /setup-webhook       - Register the Telegram webhook (POST)");
    log::info!("  /maintenance/cleanup - Remove all scratch directories (POST)");

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

/// Base URL Telegram should reach this server at.
///
/// `SERVER_URL` wins; otherwise the request's `Host` header with
/// `X-Forwarded-Proto` (default `http`); otherwise localhost.
pub fn resolve_server_url(configured: Option<&str>, headers: &HeaderMap, port: u16) -> String {
    if let Some(url) = configured.filter(|url| !url.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    let header_value = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    if let Some(host) = header_value(header::HOST.as_str()) {
        let proto = header_value("x-forwarded-proto").unwrap_or("http");
        return format!("{}://{}", proto, host);
    }

    format!("http://localhost:{}", port)
}

/// Path of the webhook route. Contains the bot token.
pub fn webhook_path() -> String {
    format!("/bot{}", config::BOT_TOKEN.expose_secret())
}

/// Registers `<base_url>/bot<token>` as the bot's webhook.
pub async fn setup_webhook(bot: &Bot, base_url: &str, secret: &str) -> WebhookSetupResult {
    if config::BOT_TOKEN.expose_secret().is_empty() {
        log::error!("TELEGRAM_BOT_TOKEN is not defined");
        return WebhookSetupResult {
            success: false,
            message: "TELEGRAM_BOT_TOKEN is not defined".to_string(),
        };
    }

    let webhook_url = match url::Url::parse(&format!("{}{}", base_url, webhook_path())) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Invalid webhook base URL {}: {}", base_url, e);
            return WebhookSetupResult {
                success: false,
                message: format!("Error setting webhook: {}", e),
            };
        }
    };
    log::info!("Setting webhook to: {}/bot<token>", base_url);

    match bot.set_webhook(webhook_url).secret_token(secret.to_string()).await {
        Ok(_) => {
            log::info!("Webhook set successfully");
            WebhookSetupResult {
                success: true,
                message: "Webhook set successfully".to_string(),
            }
        }
        Err(e) => {
            log::error!("Error setting webhook: {}", e);
            WebhookSetupResult {
                success: false,
                message: format!("Error setting webhook: {}", e),
            }
        }
    }
}

fn hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET / and /setup-success
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
async fn health_handler(State(state): State<WebState>) -> impl IntoResponse {
    let health = json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "hostname": hostname(),
        "tempDir": state.temp_root.display().to_string(),
        "uptime": state.started.elapsed().as_secs_f64(),
        "activeSessions": state.sessions.len(),
    });

    (StatusCode::OK, Json(health))
}

/// GET /metrics
async fn metrics_handler() -> Response {
    match metrics::render() {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e)).into_response()
        }
    }
}

/// POST /setup-webhook
async fn setup_webhook_handler(State(state): State<WebState>, headers: HeaderMap) -> impl IntoResponse {
    let base = resolve_server_url(state.server_url.as_deref(), &headers, state.port);
    let result = setup_webhook(&state.bot, &base, &state.webhook_secret).await;
    Json(result)
}

/// POST /maintenance/cleanup
async fn cleanup_handler(State(state): State<WebState>) -> impl IntoResponse {
    match purge_all(&state.temp_root).await {
        Ok(removed) => {
            log::info!("Maintenance cleanup removed {} directories", removed);
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("Cleaned up {} temporary directories", removed),
                    "removed": removed,
                })),
            )
        }
        Err(e) => {
            log::error!("Maintenance cleanup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": e.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configured_url_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        assert_eq!(
            resolve_server_url(Some("https://bot.example.com/"), &headers, 3000),
            "https://bot.example.com"
        );
    }

    #[test]
    fn test_url_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("bot.example.com"));
        assert_eq!(resolve_server_url(None, &headers, 3000), "http://bot.example.com");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(resolve_server_url(Some(""), &headers, 3000), "https://bot.example.com");
    }

    #[test]
    fn test_url_fallback_to_localhost() {
        assert_eq!(resolve_server_url(None, &HeaderMap::new(), 8080), "http://localhost:8080");
    }
}
