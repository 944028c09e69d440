//! Scripted stand-in for yt-dlp

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use ytgrab::core::validation::Platform;
use ytgrab::download::ytdlp::{DownloadRequest, MediaTool};
use ytgrab::download::{ToolError, ToolErrorKind};

pub const YOUTUBE_LISTING: &str = "\
[youtube] abc: Downloading webpage
ID  EXT   RESOLUTION FPS |   FILESIZE
140 m4a   audio only     |    3.2MiB
18  mp4   640x360     25 |   10.1MiB
137 mp4   1920x1080   25 |  101.3MiB
248 webm  1920x1080   25 |   80.0MiB
";

#[derive(Debug, Clone)]
pub enum DownloadBehavior {
    /// Write `<stem>.<ext>` with the given length
    WriteFile { ext: &'static str, size: u64 },
    /// Exit cleanly without producing a file
    NoFile,
    /// Leave `<stem>.<ext>` as a symlink to a file that does not exist
    DanglingLink { ext: &'static str },
    Fail(ToolError),
}

pub struct FakeTool {
    listing: Result<String, ToolError>,
    download: DownloadBehavior,
    /// When set, `list_formats` waits for a permit before returning
    probe_gate: Option<Arc<Notify>>,
    /// When set, `download` waits for a permit before producing output
    download_gate: Option<Arc<Notify>>,
    downloads: Mutex<Vec<DownloadRequest>>,
    probes: Mutex<Vec<(String, Platform)>>,
}

impl FakeTool {
    pub fn new(listing: Result<String, ToolError>, download: DownloadBehavior) -> Self {
        Self {
            listing,
            download,
            probe_gate: None,
            download_gate: None,
            downloads: Mutex::new(Vec::new()),
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Lists YouTube-like formats and downloads a small mp4
    pub fn working() -> Self {
        Self::new(
            Ok(YOUTUBE_LISTING.to_string()),
            DownloadBehavior::WriteFile { ext: "mp4", size: 2048 },
        )
    }

    pub fn failing_probe(kind: ToolErrorKind, detail: &str) -> Self {
        Self::new(Err(ToolError::new(kind, detail)), DownloadBehavior::NoFile)
    }

    pub fn with_download(mut self, download: DownloadBehavior) -> Self {
        self.download = download;
        self
    }

    pub fn with_probe_gate(mut self, gate: Arc<Notify>) -> Self {
        self.probe_gate = Some(gate);
        self
    }

    pub fn with_download_gate(mut self, gate: Arc<Notify>) -> Self {
        self.download_gate = Some(gate);
        self
    }

    pub fn downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn probes(&self) -> Vec<(String, Platform)> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for FakeTool {
    async fn list_formats(&self, url: &str, platform: Platform, workdir: &Path) -> Result<String, ToolError> {
        assert!(workdir.is_dir(), "probe must run inside an existing scratch dir");
        self.probes.lock().unwrap().push((url.to_string(), platform));
        if let Some(gate) = &self.probe_gate {
            gate.notified().await;
        }
        self.listing.clone()
    }

    async fn download(&self, request: &DownloadRequest) -> Result<(), ToolError> {
        self.downloads.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.download_gate {
            gate.notified().await;
        }
        match &self.download {
            DownloadBehavior::WriteFile { ext, size } => {
                let path = request.workdir.join(format!("{}.{}", request.stem, ext));
                let file = std::fs::File::create(&path)
                    .map_err(|e| ToolError::new(ToolErrorKind::Permission, e.to_string()))?;
                file.set_len(*size)
                    .map_err(|e| ToolError::new(ToolErrorKind::Permission, e.to_string()))?;
                Ok(())
            }
            DownloadBehavior::NoFile => Ok(()),
            DownloadBehavior::DanglingLink { ext } => {
                let path = request.workdir.join(format!("{}.{}", request.stem, ext));
                #[cfg(unix)]
                std::os::unix::fs::symlink(request.workdir.join("vanished.bin"), &path)
                    .map_err(|e| ToolError::new(ToolErrorKind::Permission, e.to_string()))?;
                #[cfg(not(unix))]
                let _ = path;
                Ok(())
            }
            DownloadBehavior::Fail(e) => Err(e.clone()),
        }
    }
}
