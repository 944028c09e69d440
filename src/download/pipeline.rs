//! Request flows: URL → format listing → quality menu → download → delivery.
//!
//! Each flow owns the scratch directory of the session it started and
//! removes it on every exit path. Session transitions go through
//! [`SessionManager`] with the flow's [`Ticket`]; once the ticket is stale
//! (cancelled or replaced) the flow stops talking to the user and only
//! cleans up after itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use teloxide::types::{ChatId, MessageId};

use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::core::scratch::{create_scratch_dir, discard_scratch_dir};
use crate::core::session::{BeginOutcome, ClaimOutcome, SessionManager, SessionState, Ticket, UserKey};
use crate::core::validation::{classify_platform, extract_url, Platform};
use crate::download::error::{ToolError, ToolErrorKind};
use crate::download::formats::{filter_format_lines, select_format, Quality};
use crate::download::send::{deliver, update_status, DeliveryOutcome};
use crate::download::ytdlp::{locate_output, DownloadRequest, MediaTool};
use crate::download::ytdlp_errors::{download_message, probe_message};
use crate::telegram::client::ChatClient;
use crate::telegram::keyboard::{decode_callback, quality_menu};

pub const INVALID_URL_TEXT: &str = "Please send a valid URL.";
pub const SESSION_EXPIRED_TEXT: &str = "Session expired. Please send the URL again.";
pub const BUSY_TEXT: &str = "Your previous request is still being processed. Send /cancel to abort it.";
pub const CANCELED_TEXT: &str = "Current operation canceled.";
pub const NOTHING_TO_CANCEL_TEXT: &str = "No active operation to cancel.";

/// Shared dependencies of the request flows.
#[derive(Clone)]
pub struct FlowDeps {
    pub sessions: Arc<SessionManager>,
    pub tool: Arc<dyn MediaTool>,
    /// Parent directory of all scratch directories
    pub temp_root: PathBuf,
}

impl FlowDeps {
    pub fn new(sessions: Arc<SessionManager>, tool: Arc<dyn MediaTool>, temp_root: PathBuf) -> Self {
        Self {
            sessions,
            tool,
            temp_root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    /// No URL in the message
    Rejected,
    /// The user already has a request probing or downloading
    Busy(SessionState),
    /// Formats listed, quality menu shown
    MenuShown { format_lines: usize },
    /// Listing failed; the user got an explanation
    Failed(ToolErrorKind),
    /// Session was cancelled while listing; results dropped
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Unknown token or no matching session
    Expired,
    /// A download for this session is already running
    InProgress,
    Delivered(DeliveryOutcome),
    Failed(ToolErrorKind),
    /// Session was cancelled while downloading; output dropped
    Stale,
}

/// Handles a plain text message: validates the URL and lists its formats.
pub async fn handle_url_message(
    deps: &FlowDeps,
    client: &dyn ChatClient,
    chat: ChatId,
    user: UserKey,
    text: &str,
) -> AppResult<UrlOutcome> {
    let Some(url) = extract_url(text) else {
        client.send_text(chat, INVALID_URL_TEXT).await?;
        return Ok(UrlOutcome::Rejected);
    };
    let platform = classify_platform(url);
    log::info!("User {} requested {} ({})", user, url, platform);

    let scratch_dir = match create_scratch_dir(&deps.temp_root, user).await {
        Ok(dir) => dir,
        Err(e) => {
            log::error!("Failed to create temp directory under {}: {}", deps.temp_root.display(), e);
            client.send_text(chat, &probe_message(ToolErrorKind::Permission)).await?;
            return Ok(UrlOutcome::Failed(ToolErrorKind::Permission));
        }
    };
    log::info!("Created temp directory: {}", scratch_dir.display());

    let ticket = match deps.sessions.begin(user, url, platform, scratch_dir.clone()) {
        BeginOutcome::Started { ticket, replaced } => {
            if let Some(old) = replaced {
                log::info!("User {} replaced pending request for {}", user, old.url);
                discard_scratch_dir(&old.scratch_dir).await;
            }
            ticket
        }
        BeginOutcome::Busy(state) => {
            log::info!("User {} is busy ({}), rejecting {}", user, state, url);
            discard_scratch_dir(&scratch_dir).await;
            client.send_text(chat, BUSY_TEXT).await?;
            return Ok(UrlOutcome::Busy(state));
        }
    };

    let status = match client.send_text(chat, "Fetching available formats...").await {
        Ok(id) => id,
        Err(e) => {
            abandon(deps, ticket, &scratch_dir).await;
            return Err(e.into());
        }
    };

    let listing = deps.tool.list_formats(url, platform, &scratch_dir).await;

    match listing {
        Ok(stdout) => {
            let lines = filter_format_lines(&stdout);
            if lines.is_empty() {
                log::warn!("No recognizable format lines for {}, showing the menu anyway", url);
            }
            let count = lines.len();

            if !deps.sessions.commit_probe(ticket, lines) {
                log::info!("Request of user {} was cancelled while listing formats", user);
                metrics::record_probe("stale");
                discard_scratch_dir(&scratch_dir).await;
                return Ok(UrlOutcome::Stale);
            }
            metrics::record_probe("ok");

            let buttons = quality_menu(url, platform);
            if let Err(e) = client
                .edit_text_with_keyboard(chat, status, "Choose video quality:", &buttons)
                .await
            {
                abandon(deps, ticket, &scratch_dir).await;
                return Err(e.into());
            }
            Ok(UrlOutcome::MenuShown { format_lines: count })
        }
        Err(e) => {
            log::error!("Error fetching formats for {}: {} ({})", url, e.kind, e.detail);
            metrics::record_probe("error");
            metrics::record_tool_error("probe", e.subcategory());

            let was_current = deps.sessions.finish(ticket).is_some();
            discard_scratch_dir(&scratch_dir).await;
            if !was_current {
                return Ok(UrlOutcome::Stale);
            }
            client.send_text(chat, &probe_message(e.kind)).await?;
            Ok(UrlOutcome::Failed(e.kind))
        }
    }
}

/// Handles a quality button press.
///
/// `status` is the message carrying the menu; when Telegram does not provide
/// it a fresh status message is sent instead.
pub async fn handle_quality_callback(
    deps: &FlowDeps,
    client: &dyn ChatClient,
    chat: ChatId,
    status: Option<MessageId>,
    user: UserKey,
    data: &str,
) -> AppResult<CallbackOutcome> {
    let Some(callback) = decode_callback(data) else {
        log::warn!("Malformed callback data from user {}: {}", user, data);
        client.send_text(chat, SESSION_EXPIRED_TEXT).await?;
        return Ok(CallbackOutcome::Expired);
    };

    let (ticket, session) = match deps.sessions.claim_for_download(user, &callback.url_ref) {
        ClaimOutcome::Claimed { ticket, session } => (ticket, session),
        ClaimOutcome::InProgress => return Ok(CallbackOutcome::InProgress),
        ClaimOutcome::Expired => {
            client.send_text(chat, SESSION_EXPIRED_TEXT).await?;
            return Ok(CallbackOutcome::Expired);
        }
    };

    let quality = callback.quality();
    let outcome = run_download(
        deps,
        client,
        chat,
        status,
        ticket,
        &session.url,
        session.platform,
        &session.scratch_dir,
        quality,
    )
    .await;

    deps.sessions.finish(ticket);
    discard_scratch_dir(&session.scratch_dir).await;

    let outcome = outcome?;
    let label = match &outcome {
        CallbackOutcome::Delivered(DeliveryOutcome::Sent { .. }) => "sent",
        CallbackOutcome::Delivered(DeliveryOutcome::TooLarge { .. }) => "too_large",
        CallbackOutcome::Delivered(DeliveryOutcome::UploadFailed(_)) => "upload_failed",
        CallbackOutcome::Failed(_) => "error",
        CallbackOutcome::Stale => "stale",
        CallbackOutcome::Expired | CallbackOutcome::InProgress => "ignored",
    };
    metrics::record_download(quality.tag(), label);
    Ok(outcome)
}

async fn run_download(
    deps: &FlowDeps,
    client: &dyn ChatClient,
    chat: ChatId,
    status: Option<MessageId>,
    ticket: Ticket,
    url: &str,
    platform: Platform,
    scratch_dir: &Path,
    quality: Quality,
) -> AppResult<CallbackOutcome> {
    const STARTING: &str = "Starting download... This may take a while.";
    let status = match status {
        Some(id) => {
            update_status(client, chat, id, STARTING).await;
            id
        }
        None => client.send_text(chat, STARTING).await?,
    };

    let request = DownloadRequest {
        url: url.to_string(),
        platform,
        format: select_format(quality, platform),
        workdir: scratch_dir.to_path_buf(),
        stem: format!("video_{}", chrono::Utc::now().timestamp_millis()),
    };

    update_status(client, chat, status, "Downloading... Please wait.").await;

    let located = match deps.tool.download(&request).await {
        Ok(()) => locate_output(&request.workdir, &request.stem).await,
        Err(e) => Err(e),
    };

    if !deps.sessions.is_current(ticket) {
        log::info!("Request of user {} was cancelled during download, dropping output", ticket.user);
        return Ok(CallbackOutcome::Stale);
    }

    let path = match located {
        Ok(path) => path,
        Err(e) => return Ok(report_download_failure(client, chat, status, url, e).await),
    };
    log::info!("Download completed: {}", path.display());

    match deliver(client, chat, status, &path, quality).await {
        Ok(delivered) => Ok(CallbackOutcome::Delivered(delivered)),
        Err(AppError::Tool(e)) => Ok(report_download_failure(client, chat, status, url, e).await),
        Err(e) => Err(e),
    }
}

async fn report_download_failure(
    client: &dyn ChatClient,
    chat: ChatId,
    status: MessageId,
    url: &str,
    e: ToolError,
) -> CallbackOutcome {
    log::error!("Download error for {}: {} ({})", url, e.kind, e.detail);
    metrics::record_tool_error("download", e.subcategory());
    update_status(client, chat, status, &download_message(e.kind)).await;
    CallbackOutcome::Failed(e.kind)
}

/// Handles `/cancel`. Running subprocesses are not interrupted; their flow
/// notices the stale ticket and cleans up when the process exits.
pub async fn handle_cancel(deps: &FlowDeps, client: &dyn ChatClient, chat: ChatId, user: UserKey) -> AppResult<bool> {
    match deps.sessions.cancel(user) {
        Some(session) => {
            log::info!("User {} cancelled request for {} ({})", user, session.url, session.state);
            if session.state == SessionState::AwaitingSelection {
                discard_scratch_dir(&session.scratch_dir).await;
            }
            client.send_text(chat, CANCELED_TEXT).await?;
            Ok(true)
        }
        None => {
            client.send_text(chat, NOTHING_TO_CANCEL_TEXT).await?;
            Ok(false)
        }
    }
}

async fn abandon(deps: &FlowDeps, ticket: Ticket, scratch_dir: &Path) {
    deps.sessions.finish(ticket);
    discard_scratch_dir(scratch_dir).await;
}
