//! Translation of yt-dlp output into [`ToolErrorKind`] and user-facing text.
//!
//! yt-dlp has no structured error codes, so classification is keyword based.
//! All of that lives here; the rest of the crate only sees the closed enum.

use crate::download::error::ToolErrorKind;

/// Analyzes yt-dlp stderr (or an error description) and determines the error kind.
///
/// Checks run from most to least specific. A geo block phrased as
/// "blocked it in your country on copyright grounds" is a region problem for
/// the user, so region markers win over copyright markers.
pub fn classify(text: &str) -> ToolErrorKind {
    let lower = text.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["timed out", "timeout"]) {
        return ToolErrorKind::Timeout;
    }

    if has(&["permission denied", "operation not permitted", "read-only file system"]) {
        return ToolErrorKind::Permission;
    }

    if has(&[
        "not available in your country",
        "in your country",
        "geo restrict",
        "geo-restrict",
        "georestrict",
        "region",
    ]) {
        return ToolErrorKind::GeoRestricted;
    }

    if has(&["copyright"]) {
        return ToolErrorKind::Copyright;
    }

    if has(&["private video", "video is private", "this video is private", "private"]) {
        return ToolErrorKind::Private;
    }

    if has(&["sign in", "confirm your age", "age-restricted", "login required", "log in"]) {
        return ToolErrorKind::SignInRequired;
    }

    if has(&["too large", "larger than max-filesize", "file is larger than"]) {
        return ToolErrorKind::TooLarge;
    }

    if has(&["http error 404", "not found", "no such file", "unsupported url", "does not exist"]) {
        return ToolErrorKind::NotFound;
    }

    if has(&["unavailable", "not available", "has been removed"]) {
        return ToolErrorKind::Unavailable;
    }

    ToolErrorKind::Unknown
}

/// Message shown when listing formats fails.
pub fn probe_message(kind: ToolErrorKind) -> String {
    let reason = match kind {
        ToolErrorKind::NoFormats => "No format information returned. The URL might be invalid or content might be restricted.",
        ToolErrorKind::NotFound | ToolErrorKind::FileMissing => "The URL might be invalid or the video has been removed.",
        ToolErrorKind::Timeout => "The request timed out. The server might be slow or the video is too large.",
        ToolErrorKind::Permission => "Permission denied accessing system resources.",
        ToolErrorKind::Spawn => "The downloader could not be started. Please try again later.",
        ToolErrorKind::GeoRestricted => "This content might be region-restricted. Try again with a different video.",
        ToolErrorKind::Copyright => "This content might have been removed due to copyright issues.",
        ToolErrorKind::Private => "This appears to be a private video that requires authentication.",
        ToolErrorKind::SignInRequired => "This video requires you to sign in (age-restricted or private content).",
        ToolErrorKind::Unavailable => "This video is currently unavailable.",
        ToolErrorKind::TooLarge | ToolErrorKind::Unknown => "Please check if the URL is valid and try again.",
    };
    format!("Error fetching video information. {}", reason)
}

/// Message shown when the download step fails.
pub fn download_message(kind: ToolErrorKind) -> String {
    match kind {
        ToolErrorKind::GeoRestricted | ToolErrorKind::Unavailable => {
            "The video is unavailable or restricted in your region".to_string()
        }
        ToolErrorKind::Copyright => "The video was removed due to copyright issues".to_string(),
        ToolErrorKind::Private => "This is a private video that requires authentication".to_string(),
        ToolErrorKind::SignInRequired => {
            "This video requires you to sign in (age-restricted or private content)".to_string()
        }
        ToolErrorKind::TooLarge => "Video is too large to process. Try a lower quality option.".to_string(),
        ToolErrorKind::Timeout => "The download timed out. Try a lower quality option or a shorter video.".to_string(),
        ToolErrorKind::FileMissing => "Error downloading video: downloaded file not found".to_string(),
        ToolErrorKind::NotFound => "Error downloading video: the URL might be invalid or the video was removed".to_string(),
        ToolErrorKind::Permission | ToolErrorKind::Spawn => {
            "Error downloading video: the downloader could not be started".to_string()
        }
        ToolErrorKind::NoFormats | ToolErrorKind::Unknown => {
            "Error downloading video. Please check the URL and try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_geo_block() {
        assert_eq!(
            classify("ERROR: [youtube] abc: The uploader has not made this video available in your country"),
            ToolErrorKind::GeoRestricted
        );
        assert_eq!(
            classify("ERROR: Video unavailable. X has blocked it in your country on copyright grounds"),
            ToolErrorKind::GeoRestricted
        );
    }

    #[test]
    fn test_classify_copyright() {
        assert_eq!(
            classify("ERROR: This video is no longer available due to a copyright claim by Someone"),
            ToolErrorKind::Copyright
        );
    }

    #[test]
    fn test_classify_private_before_sign_in() {
        assert_eq!(
            classify("ERROR: [youtube] abc: Private video. Sign in if you've been granted access to this video"),
            ToolErrorKind::Private
        );
        assert_eq!(
            classify("ERROR: Sign in to confirm your age. This video may be inappropriate for some users."),
            ToolErrorKind::SignInRequired
        );
    }

    #[test]
    fn test_classify_not_found_and_unavailable() {
        assert_eq!(classify("ERROR: Unsupported URL: https://example.com/"), ToolErrorKind::NotFound);
        assert_eq!(classify("ERROR: unable to download webpage: HTTP Error 404: Not Found"), ToolErrorKind::NotFound);
        assert_eq!(classify("ERROR: [youtube] abc: Video unavailable"), ToolErrorKind::Unavailable);
    }

    #[test]
    fn test_classify_misc() {
        assert_eq!(classify("Process timed out after 90s"), ToolErrorKind::Timeout);
        assert_eq!(classify("mkdir: Permission denied"), ToolErrorKind::Permission);
        assert_eq!(classify("File is larger than max-filesize"), ToolErrorKind::TooLarge);
        assert_eq!(classify("something odd happened"), ToolErrorKind::Unknown);
        assert_eq!(classify(""), ToolErrorKind::Unknown);
    }

    #[test]
    fn test_messages_are_distinct_per_phase() {
        assert!(probe_message(ToolErrorKind::Timeout).starts_with("Error fetching video information."));
        assert!(probe_message(ToolErrorKind::NoFormats).contains("No format information returned"));
        assert_eq!(
            download_message(ToolErrorKind::Private),
            "This is a private video that requires authentication"
        );
        assert!(download_message(ToolErrorKind::FileMissing).contains("not found"));
    }

    #[test]
    fn test_missing_binary_is_not_reported_as_permission_problem() {
        let spawn = probe_message(ToolErrorKind::Spawn);
        assert!(spawn.contains("could not be started"), "{}", spawn);
        assert!(!spawn.contains("Permission denied"));
        assert_ne!(spawn, probe_message(ToolErrorKind::Permission));
    }
}
