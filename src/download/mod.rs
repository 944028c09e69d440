//! Download management and processing

pub mod error;
pub mod formats;
pub mod pipeline;
pub mod send;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::{ToolError, ToolErrorKind};
pub use formats::Quality;
pub use pipeline::{handle_cancel, handle_quality_callback, handle_url_message, FlowDeps};
pub use ytdlp::{MediaTool, YtDlp};
