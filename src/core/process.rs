//! Process execution utilities with timeout support
//!
//! Provides helpers for running yt-dlp with configurable timeouts so a hung
//! extractor never pins a handler forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::download::error::{ToolError, ToolErrorKind};

/// Run an async Command with a timeout.
///
/// The command should be built with `kill_on_drop(true)`: when the timeout
/// fires the pending `output()` future is dropped and the child is killed.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ToolError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            let kind = match e.kind() {
                std::io::ErrorKind::PermissionDenied => ToolErrorKind::Permission,
                _ => ToolErrorKind::Spawn,
            };
            Err(ToolError::new(kind, format!("Failed to start process: {}", e)))
        }
        Err(_) => Err(ToolError::new(
            ToolErrorKind::Timeout,
            format!("Process timed out after {}s", timeout.as_secs()),
        )),
    }
}
