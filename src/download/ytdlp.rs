use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::run_with_timeout;
use crate::core::validation::Platform;
use crate::download::error::{ToolError, ToolErrorKind};
use crate::download::formats::FormatSelection;
use crate::download::ytdlp_errors::classify;

/// Everything needed for one download invocation.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub platform: Platform,
    pub format: FormatSelection,
    /// Scratch directory; also the process working directory
    pub workdir: PathBuf,
    /// File name stem; yt-dlp appends the extension it picks
    pub stem: String,
}

impl DownloadRequest {
    /// `<workdir>/<stem>.%(ext)s`
    pub fn output_template(&self) -> String {
        self.workdir
            .join(format!("{}.%(ext)s", self.stem))
            .to_string_lossy()
            .into_owned()
    }
}

/// The external media extractor.
///
/// Implementations must not interpret URLs through a shell.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Runs the format listing and returns its standard output.
    async fn list_formats(&self, url: &str, platform: Platform, workdir: &Path) -> Result<String, ToolError>;

    /// Downloads into `request.workdir`. Success means the process exited cleanly;
    /// the caller still has to find the file.
    async fn download(&self, request: &DownloadRequest) -> Result<(), ToolError>;
}

fn common_args(platform: Platform) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--user-agent".into(),
        config::ytdlp::USER_AGENT.into(),
        "--no-warnings".into(),
        "--no-check-certificate".into(),
    ];
    if platform.is_youtube() {
        args.push("--geo-bypass".into());
        args.push("--extractor-args".into());
        args.push(config::ytdlp::YOUTUBE_EXTRACTOR_ARGS.into());
    }
    args
}

/// Arguments for `yt-dlp -F`.
pub fn build_probe_args(url: &str, platform: Platform) -> Vec<String> {
    let mut args = common_args(platform);
    args.push("-F".into());
    args.push("--".into());
    args.push(url.into());
    args
}

/// Arguments for the actual download.
pub fn build_download_args(request: &DownloadRequest) -> Vec<String> {
    let mut args = common_args(request.platform);
    args.extend(request.format.to_args());
    args.push("--prefer-ffmpeg".into());
    args.push("--no-playlist".into());
    args.push("-o".into());
    args.push(request.output_template());
    args.push("--".into());
    args.push(request.url.clone());
    args
}

/// Arguments for the startup check: resolve `url` without downloading and print its title.
pub fn build_smoke_test_args(url: &str) -> Vec<String> {
    vec![
        "--no-warnings".into(),
        "--simulate".into(),
        "--print".into(),
        "title".into(),
        "--".into(),
        url.into(),
    ]
}

/// Runs a simulated extraction of `url` and returns the title yt-dlp printed.
pub async fn smoke_test(bin: &str, url: &str, timeout: Duration) -> Result<String, ToolError> {
    let mut cmd = Command::new(bin);
    cmd.args(build_smoke_test_args(url)).kill_on_drop(true);

    let output = run_with_timeout(&mut cmd, timeout).await?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(ToolError::new(classify(&stderr), stderr.trim().to_string()));
    }

    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if title.is_empty() {
        return Err(ToolError::new(ToolErrorKind::NoFormats, "simulated extraction printed no title"));
    }
    Ok(title)
}

/// Finds the first file in `dir` whose name starts with `stem`.
///
/// Entries are sorted so the pick is deterministic when yt-dlp leaves
/// intermediate files next to the merged output.
pub async fn locate_output(dir: &Path, stem: &str) -> Result<PathBuf, ToolError> {
    let mut entries = fs_err::tokio::read_dir(dir)
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::FileMissing, e.to_string()))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ToolError::new(ToolErrorKind::FileMissing, e.to_string()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_partial = name.ends_with(".part") || name.ends_with(".ytdl");
        if name.starts_with(stem) && !is_partial {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::new(ToolErrorKind::FileMissing, format!("Downloaded file not found in {}", dir.display())))
}

/// yt-dlp driven through `tokio::process`.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: String,
    probe_timeout: Duration,
    download_timeout: Duration,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            bin: config::YTDL_BIN.clone(),
            probe_timeout: config::timeouts::probe(),
            download_timeout: config::timeouts::download(),
        }
    }
}

impl YtDlp {
    pub fn new(bin: impl Into<String>, probe_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            probe_timeout,
            download_timeout,
        }
    }

    async fn run(&self, args: &[String], workdir: &Path, timeout: Duration) -> Result<String, ToolError> {
        log::info!("Executing {} {}", self.bin, args.join(" "));

        let mut cmd = Command::new(&self.bin);
        cmd.args(args).current_dir(workdir).kill_on_drop(true);

        let output = run_with_timeout(&mut cmd, timeout).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let kind = classify(&stderr);
            log::error!(
                "{} exited with {:?} ({}): {}",
                self.bin,
                output.status.code(),
                kind,
                stderr.trim()
            );
            let detail = if stderr.trim().is_empty() {
                format!("{} exited with status {:?}", self.bin, output.status.code())
            } else {
                stderr.trim().to_string()
            };
            return Err(ToolError::new(kind, detail));
        }

        if !stderr.trim().is_empty() {
            log::warn!("{} stderr: {}", self.bin, stderr.trim());
        }

        Ok(stdout)
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn list_formats(&self, url: &str, platform: Platform, workdir: &Path) -> Result<String, ToolError> {
        let stdout = self
            .run(&build_probe_args(url, platform), workdir, self.probe_timeout)
            .await?;
        if stdout.trim().is_empty() {
            log::error!("No format information returned by {} for {}", self.bin, url);
            return Err(ToolError::new(ToolErrorKind::NoFormats, "empty format listing"));
        }
        log::info!("Format data retrieved, length: {} characters", stdout.len());
        Ok(stdout)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<(), ToolError> {
        self.run(&build_download_args(request), &request.workdir, self.download_timeout)
            .await
            .map(|_| ())
    }
}

/// Logs the installed yt-dlp version, asks it to self-update and checks that
/// a sample video still resolves.
///
/// Extractors break whenever sites change, so this runs on every start.
/// Nothing here is fatal: pip-managed installs refuse `-U` (exit code 100),
/// and a missing binary is reported loudly but the bot still starts.
pub async fn check_and_update_ytdlp(bin: &str) {
    let version = |label: &'static str| async move {
        let mut cmd = Command::new(bin);
        cmd.arg("--version").kill_on_drop(true);
        match run_with_timeout(&mut cmd, Duration::from_secs(15)).await {
            Ok(output) if output.status.success() => {
                log::info!("{} yt-dlp version: {}", label, String::from_utf8_lossy(&output.stdout).trim());
            }
            Ok(output) => log::warn!("{} --version exited with {:?}", bin, output.status.code()),
            Err(e) => log::error!("yt-dlp is not usable ({}): {}", bin, e),
        }
    };

    version("Current").await;

    log::info!("Updating yt-dlp...");
    let mut cmd = Command::new(bin);
    cmd.arg("-U").kill_on_drop(true);
    match run_with_timeout(&mut cmd, config::timeouts::tool_update()).await {
        Ok(output) if output.status.success() => {
            log::info!("yt-dlp update: {}", String::from_utf8_lossy(&output.stdout).trim());
        }
        Ok(output) if output.status.code() == Some(100) => {
            log::info!("yt-dlp is managed by a package manager, skipping self-update");
        }
        Ok(output) => log::warn!(
            "yt-dlp update failed (exit code: {:?}): {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => log::warn!("yt-dlp update skipped: {}", e),
    }

    log::info!("Testing yt-dlp with a sample YouTube URL...");
    match smoke_test(bin, config::ytdlp::SMOKE_TEST_URL, config::timeouts::smoke_test()).await {
        Ok(title) => log::info!("Test successful, found video: {}", title),
        Err(e) => {
            log::warn!("yt-dlp test extraction failed ({}): {}", e.kind, e.detail);
            log::warn!("yt-dlp might not be working correctly. Please check installation.");
        }
    }

    version("Post-update").await;
}
