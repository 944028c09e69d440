//! ytgrab - Telegram bot that downloads media with yt-dlp
//!
//! A user sends a link, picks a quality from an inline keyboard and gets the
//! file back in the chat.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, sessions, scratch directories, HTTP server
//! - `download`: yt-dlp invocation, format selection, request flows, delivery
//! - `telegram`: bot construction, handlers, keyboards, transport

#![allow(clippy::too_many_arguments)]

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use download::{FlowDeps, MediaTool, YtDlp};
pub use telegram::{ChatClient, HandlerDeps};
