use std::fmt;

/// Closed set of failure categories for yt-dlp invocations.
///
/// Produced only by [`crate::download::ytdlp_errors::classify`] and the
/// process runner, so handlers never look at raw tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorKind {
    /// Format listing produced no output
    NoFormats,
    /// Wall-clock timeout exceeded
    Timeout,
    /// URL points to nothing (404, removed page, unsupported URL)
    NotFound,
    /// Filesystem or process permission problem
    Permission,
    /// Region / country block
    GeoRestricted,
    /// Copyright takedown
    Copyright,
    /// Private content
    Private,
    /// Sign-in or age verification required
    SignInRequired,
    /// Temporarily or permanently unavailable
    Unavailable,
    /// Source refused because the media is too large
    TooLarge,
    /// Tool exited cleanly but left no recognizable output file
    FileMissing,
    /// Tool binary could not be started
    Spawn,
    /// Anything else
    Unknown,
}

/// Structured error for a single yt-dlp invocation.
#[derive(Debug, Clone)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    /// Raw detail (stderr tail, IO error text) kept for logs only
    pub detail: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns subcategory for metrics
    pub fn subcategory(&self) -> &'static str {
        self.kind.into()
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::new(ToolErrorKind::Unknown, "yt-dlp failed");
        assert_eq!(err.to_string(), "yt-dlp failed");
    }

    #[test]
    fn test_tool_error_subcategory() {
        assert_eq!(ToolError::new(ToolErrorKind::NoFormats, "").subcategory(), "no_formats");
        assert_eq!(ToolError::new(ToolErrorKind::GeoRestricted, "").subcategory(), "geo_restricted");
        assert_eq!(ToolError::new(ToolErrorKind::FileMissing, "").subcategory(), "file_missing");
        assert_eq!(ToolError::new(ToolErrorKind::Timeout, "").subcategory(), "timeout");
    }
}
