use thiserror::Error;

use crate::download::error::ToolError;

/// Centralized error type for the request flows
///
/// Subprocess and file failures arrive already classified as [`ToolError`];
/// the flows turn those into user messages. Whatever is left to propagate is
/// a Bot API failure, which the dispatcher logs.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// yt-dlp or output-file failures, classified at the process boundary
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::error::ToolErrorKind;

    #[test]
    fn test_tool_error_is_transparent() {
        let err: AppError = ToolError::new(ToolErrorKind::Timeout, "Process timed out after 90s").into();
        assert_eq!(err.to_string(), "Process timed out after 90s");
    }

    #[test]
    fn test_telegram_error_display() {
        let err: AppError = teloxide::RequestError::Api(teloxide::ApiError::MessageNotModified).into();
        assert!(err.to_string().starts_with("Telegram error: "), "{}", err);
    }
}
