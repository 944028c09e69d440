//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fake_tool;
pub mod recorder;

#[allow(unused_imports)]
pub use fake_tool::{DownloadBehavior, FakeTool};
#[allow(unused_imports)]
pub use recorder::{ChatEvent, RecordingChat};

use std::path::Path;
use std::sync::Arc;

use ytgrab::core::session::SessionManager;
use ytgrab::download::FlowDeps;

/// Flow dependencies over a fresh session store and the given tool.
#[allow(dead_code)]
pub fn flow_deps(tool: Arc<FakeTool>, temp_root: &Path) -> FlowDeps {
    FlowDeps::new(Arc::new(SessionManager::new()), tool, temp_root.to_path_buf())
}

/// Names of the scratch directories currently under `root`.
#[allow(dead_code)]
pub fn scratch_dirs(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("ytdlp-"))
        .collect();
    names.sort();
    names
}
