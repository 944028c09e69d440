//! Quality menu keyboard and the callback token behind each button.
//!
//! Token layout: `quality:<url-ref>:<tier>`. The URL goes into the token
//! verbatim when the whole token fits Telegram's 64-byte callback limit;
//! longer URLs are referenced by a short SHA-256 prefix instead.

use sha2::{Digest, Sha256};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::core::config;
use crate::core::validation::Platform;
use crate::download::formats::Quality;

pub const CALLBACK_PREFIX: &str = "quality:";

const DIGEST_MARK: char = '#';
const DIGEST_HEX_LEN: usize = 16;

fn url_digest(url: &str) -> String {
    let mut hex = hex::encode(Sha256::digest(url.as_bytes()));
    hex.truncate(DIGEST_HEX_LEN);
    hex
}

/// How a callback token refers to the session URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRef {
    Exact(String),
    Digest(String),
}

impl UrlRef {
    /// Picks the verbatim form when the longest possible token still fits.
    pub fn for_url(url: &str) -> Self {
        let longest_tier = Quality::P1080.tag().len().max(Quality::Audio.tag().len());
        if CALLBACK_PREFIX.len() + url.len() + 1 + longest_tier <= config::validation::MAX_CALLBACK_DATA_BYTES {
            UrlRef::Exact(url.to_string())
        } else {
            UrlRef::Digest(url_digest(url))
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlRef::Exact(exact) => exact == url,
            UrlRef::Digest(digest) => *digest == url_digest(url),
        }
    }

    fn encode(&self) -> String {
        match self {
            UrlRef::Exact(url) => url.clone(),
            UrlRef::Digest(digest) => format!("{}{}", DIGEST_MARK, digest),
        }
    }
}

/// Decoded quality button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityCallback {
    pub url_ref: UrlRef,
    /// Raw tier tag; unknown tags resolve to best at selection time
    pub tier: String,
}

impl QualityCallback {
    pub fn quality(&self) -> Quality {
        Quality::from_tag(&self.tier)
    }
}

pub fn encode_callback(url: &str, quality: Quality) -> String {
    format!("{}{}:{}", CALLBACK_PREFIX, UrlRef::for_url(url).encode(), quality.tag())
}

/// Splits on the last `:` so URLs that contain colons survive.
pub fn decode_callback(data: &str) -> Option<QualityCallback> {
    let rest = data.strip_prefix(CALLBACK_PREFIX)?;
    let (reference, tier) = rest.rsplit_once(':')?;
    if reference.is_empty() || tier.is_empty() {
        return None;
    }

    let url_ref = match reference.strip_prefix(DIGEST_MARK) {
        Some(digest) => UrlRef::Digest(digest.to_string()),
        None => UrlRef::Exact(reference.to_string()),
    };

    Some(QualityCallback {
        url_ref,
        tier: tier.to_string(),
    })
}

/// One button of the quality menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityButton {
    pub label: &'static str,
    pub quality: Quality,
    pub data: String,
}

/// Builds the per-platform menu, one button per row.
pub fn quality_menu(url: &str, platform: Platform) -> Vec<QualityButton> {
    let entries: &[(&'static str, Quality)] = match platform {
        Platform::YouTube => &[
            ("🎬 Best Video (HD)", Quality::Best),
            ("📱 480p (SD)", Quality::P480),
            ("📱 720p (HD)", Quality::P720),
            ("🖥️ 1080p (Full HD)", Quality::P1080),
            ("🎵 MP3 Audio Only", Quality::Audio),
        ],
        Platform::Generic => &[
            ("🎬 Best Quality", Quality::Best),
            ("📱 Medium Quality", Quality::P720),
            ("📱 Lower Quality", Quality::P480),
            ("🎵 Audio Only", Quality::Audio),
        ],
    };

    entries
        .iter()
        .map(|&(label, quality)| QualityButton {
            label,
            quality,
            data: encode_callback(url, quality),
        })
        .collect()
}

pub fn to_markup(buttons: &[QualityButton]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|button| vec![InlineKeyboardButton::callback(button.label, button.data.clone())]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_url_is_embedded() {
        let data = encode_callback("https://youtu.be/abc", Quality::P720);
        assert_eq!(data, "quality:https://youtu.be/abc:720");
        let decoded = decode_callback(&data).unwrap();
        assert_eq!(decoded.url_ref, UrlRef::Exact("https://youtu.be/abc".to_string()));
        assert_eq!(decoded.quality(), Quality::P720);
    }

    #[test]
    fn test_long_url_uses_digest_and_fits_limit() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabcdefghijklmnop&index=12";
        for quality in [Quality::Best, Quality::P1080, Quality::Audio] {
            let data = encode_callback(url, quality);
            assert!(data.len() <= config::validation::MAX_CALLBACK_DATA_BYTES, "{}", data);
            let decoded = decode_callback(&data).unwrap();
            assert!(decoded.url_ref.matches(url));
            assert!(!decoded.url_ref.matches("https://www.youtube.com/watch?v=other"));
            assert_eq!(decoded.quality(), quality);
        }
    }

    #[test]
    fn test_url_with_port_decodes() {
        let decoded = decode_callback("quality:http://a.io:8080/v:best").unwrap();
        assert_eq!(decoded.url_ref, UrlRef::Exact("http://a.io:8080/v".to_string()));
        assert_eq!(decoded.tier, "best");
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(decode_callback("menu:main"), None);
        assert_eq!(decode_callback("quality:"), None);
        assert_eq!(decode_callback("quality:best"), None);
        assert_eq!(decode_callback("quality::best"), None);
    }

    #[test]
    fn test_unknown_tier_decodes_to_best() {
        let decoded = decode_callback("quality:https://youtu.be/abc:8k").unwrap();
        assert_eq!(decoded.quality(), Quality::Best);
    }

    #[test]
    fn test_menu_per_platform() {
        let youtube = quality_menu("https://youtu.be/abc", Platform::YouTube);
        assert_eq!(
            youtube.iter().map(|b| b.quality).collect::<Vec<_>>(),
            vec![Quality::Best, Quality::P480, Quality::P720, Quality::P1080, Quality::Audio]
        );
        let generic = quality_menu("https://vimeo.com/1", Platform::Generic);
        assert_eq!(generic.len(), 4);
        assert!(generic.iter().all(|b| b.data.starts_with(CALLBACK_PREFIX)));
        assert_eq!(to_markup(&generic).inline_keyboard.len(), 4);
    }
}
