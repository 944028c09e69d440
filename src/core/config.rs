use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Parses a boolean toggle the way the deployment scripts write it.
///
/// Only the literal `true` (any case, surrounding whitespace ignored) enables a toggle.
pub fn parse_toggle(raw: Option<&str>) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Bot token
/// Read from TELEGRAM_BOT_TOKEN, falling back to BOT_TOKEN or TELOXIDE_TOKEN
pub static BOT_TOKEN: Lazy<SecretString> = Lazy::new(|| {
    let raw = non_empty("TELEGRAM_BOT_TOKEN")
        .or_else(|| non_empty("BOT_TOKEN"))
        .or_else(|| non_empty("TELOXIDE_TOKEN"))
        .unwrap_or_default();
    SecretString::from(raw)
});

/// HTTP listen port
/// Read from PORT environment variable
/// Default: 3000
pub static PORT: Lazy<u16> = Lazy::new(|| env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000));

/// Receive updates through `POST /bot<token>` instead of long polling
/// Read from USE_WEBHOOK environment variable
pub static USE_WEBHOOK: Lazy<bool> = Lazy::new(|| parse_toggle(env::var("USE_WEBHOOK").ok().as_deref()));

/// Register the webhook with Telegram right after startup (needs SERVER_URL)
/// Read from AUTO_SETUP_WEBHOOK environment variable
pub static AUTO_SETUP_WEBHOOK: Lazy<bool> =
    Lazy::new(|| parse_toggle(env::var("AUTO_SETUP_WEBHOOK").ok().as_deref()));

/// Public base URL of this server, e.g. `https://bot.example.com`
/// Read from SERVER_URL environment variable
pub static SERVER_URL: Lazy<Option<String>> =
    Lazy::new(|| non_empty("SERVER_URL").map(|url| url.trim_end_matches('/').to_string()));

/// yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| non_empty("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| non_empty("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()));

/// Root under which per-request scratch directories are created (the OS temp dir)
pub static TEMP_ROOT: Lazy<PathBuf> = Lazy::new(env::temp_dir);

/// Scratch directory housekeeping
pub mod scratch {
    use super::Duration;

    /// Every scratch directory name starts with this prefix
    pub const DIR_PREFIX: &str = "ytdlp-";

    /// How often the background sweep runs (1 hour)
    pub const SWEEP_INTERVAL_SECS: u64 = 60 * 60;

    /// Directories older than this are considered abandoned (3 hours)
    pub const MAX_AGE_SECS: u64 = 3 * 60 * 60;

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }

    pub fn max_age() -> Duration {
        Duration::from_secs(MAX_AGE_SECS)
    }
}

/// Subprocess timeouts
pub mod timeouts {
    use super::Duration;

    /// `yt-dlp -F` format listing
    pub const PROBE_SECS: u64 = 90;

    /// Actual download (5 minutes)
    pub const DOWNLOAD_SECS: u64 = 300;

    /// `yt-dlp -U` self update at startup
    pub const TOOL_UPDATE_SECS: u64 = 60;

    /// Simulated extraction of the sample video at startup
    pub const SMOKE_TEST_SECS: u64 = 60;

    pub fn probe() -> Duration {
        Duration::from_secs(PROBE_SECS)
    }

    pub fn download() -> Duration {
        Duration::from_secs(DOWNLOAD_SECS)
    }

    pub fn tool_update() -> Duration {
        Duration::from_secs(TOOL_UPDATE_SECS)
    }

    pub fn smoke_test() -> Duration {
        Duration::from_secs(SMOKE_TEST_SECS)
    }
}

/// yt-dlp invocation flags shared by every call
pub mod ytdlp {
    /// Browser-like identity string sent to the source site
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

    /// Player client forced for YouTube sources
    pub const YOUTUBE_EXTRACTOR_ARGS: &str = "youtube:player_client=web";

    /// Short, long-lived public video used to check extraction works at startup
    pub const SMOKE_TEST_URL: &str = "https://www.youtube.com/watch?v=jNQXAC9IVRw";
}

/// Delivery configuration
pub mod delivery {
    /// Maximum file size the Bot API accepts for uploads (50 MB)
    pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Telegram rejects callback data longer than this many bytes
    pub const MAX_CALLBACK_DATA_BYTES: usize = 64;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls. Uploads of files close to the
    /// 50 MB limit need far more than reqwest's default.
    pub const REQUEST_TIMEOUT_SECS: u64 = 600;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    /// Delay before the automatic webhook registration, so the HTTP listener is up
    pub const AUTO_WEBHOOK_DELAY_SECS: u64 = 3;
}
