//! URL validation and source platform classification
//!
//! The URL check is deliberately permissive: anything that looks like an
//! http(s) URL is handed to yt-dlp, which decides whether it can extract it.
//! Arguments reach yt-dlp as a vector, never through a shell.

use lazy_regex::{lazy_regex, Lazy, Regex};
use url::Url;

use crate::core::config;

/// scheme, optional `www.`, host, arbitrary path/query
pub static URL_PATTERN: Lazy<Regex> = lazy_regex!(
    r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&/=]*)"
);

/// Source classification used to pick format selectors and compatibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Platform {
    /// youtube.com, youtu.be and their subdomains
    #[strum(serialize = "youtube")]
    YouTube,
    #[strum(serialize = "generic")]
    Generic,
}

impl Platform {
    pub fn is_youtube(self) -> bool {
        matches!(self, Platform::YouTube)
    }
}

/// Extracts the first URL-like substring of a chat message.
///
/// Returns `None` when nothing matches or the URL exceeds
/// [`config::validation::MAX_URL_LENGTH`].
pub fn extract_url(text: &str) -> Option<&str> {
    let found = URL_PATTERN.find(text.trim())?.as_str();
    if found.len() > config::validation::MAX_URL_LENGTH {
        return None;
    }
    Some(found)
}

/// Classifies a URL as YouTube or generic.
///
/// Hosts are compared after parsing; if the URL does not parse, a substring
/// check keeps the classification usable for odd but extractable inputs.
pub fn classify_platform(url: &str) -> Platform {
    let host_is_youtube = |host: &str| {
        let host = host.to_ascii_lowercase();
        host == "youtube.com"
            || host.ends_with(".youtube.com")
            || host == "youtu.be"
            || host == "youtube-nocookie.com"
            || host.ends_with(".youtube-nocookie.com")
    };

    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if host_is_youtube(host) => Platform::YouTube,
            _ => Platform::Generic,
        },
        Err(_) if url.contains("youtube.com") || url.contains("youtu.be") => Platform::YouTube,
        Err(_) => Platform::Generic,
    }
}
