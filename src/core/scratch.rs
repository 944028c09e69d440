//! Per-request scratch directories and their housekeeping
//!
//! Every request gets `<temp root>/ytdlp-<user>-<millis>` as yt-dlp's working
//! directory. It is removed when the request ends; whatever escapes that
//! (crashes, cancelled downloads that finish later) is caught by the hourly
//! sweep. Removal is idempotent because the sweep and request cleanup can
//! race for the same directory.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

use crate::core::config;
use crate::core::metrics;

/// Creates a fresh scratch directory readable and writable only by the owner.
pub async fn create_scratch_dir(root: &Path, user: u64) -> io::Result<PathBuf> {
    let base = format!(
        "{}{}-{}",
        config::scratch::DIR_PREFIX,
        user,
        chrono::Utc::now().timestamp_millis()
    );

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, attempt)
        };
        let path = root.join(name);

        let mut builder = tokio::fs::DirBuilder::new();
        #[cfg(unix)]
        builder.mode(0o700);

        match builder.create(&path).await {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < 16 => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Removes a scratch directory. `Ok(false)` means it was already gone.
pub async fn remove_scratch_dir(path: &Path) -> io::Result<bool> {
    match fs_err::tokio::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Best-effort removal used on every request exit path. Failures are logged only.
pub async fn discard_scratch_dir(path: &Path) {
    match remove_scratch_dir(path).await {
        Ok(true) => {
            metrics::record_scratch_removed("request", 1);
            log::info!("Cleaned up temp directory: {}", path.display());
        }
        Ok(false) => log::debug!("Temp directory already gone: {}", path.display()),
        Err(e) => log::error!("Cleanup error for {}: {}", path.display(), e),
    }
}

fn is_scratch_name(name: &str) -> bool {
    name.starts_with(config::scratch::DIR_PREFIX)
}

/// Lists prefixed directories directly under `root`.
async fn scratch_dirs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs_err::tokio::read_dir(root).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !is_scratch_name(&name.to_string_lossy()) {
            continue;
        }
        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            Err(e) => log::warn!("Cannot stat {}: {}", entry.path().display(), e),
        }
    }
    Ok(dirs)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Removes prefixed directories whose modification time is older than `max_age` at `now`.
pub async fn sweep_stale(root: &Path, max_age: Duration, now: SystemTime) -> io::Result<SweepReport> {
    let dirs = scratch_dirs(root).await?;
    let mut report = SweepReport {
        checked: dirs.len(),
        ..SweepReport::default()
    };

    for dir in dirs {
        let modified = match fs_err::tokio::metadata(&dir).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                log::error!("Error processing directory {}: {}", dir.display(), e);
                report.failed += 1;
                continue;
            }
        };

        // Clock skew puts `modified` in the future; such a directory is not stale
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match remove_scratch_dir(&dir).await {
            Ok(true) => {
                log::info!("Cleaned up old directory: {}", dir.display());
                report.removed += 1;
            }
            Ok(false) => {}
            Err(e) => {
                log::error!("Error removing directory {}: {}", dir.display(), e);
                report.failed += 1;
            }
        }
    }

    metrics::record_scratch_removed("sweep", report.removed as u64);
    Ok(report)
}

/// Removes every prefixed directory regardless of age. Returns how many were removed.
pub async fn purge_all(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for dir in scratch_dirs(root).await? {
        match remove_scratch_dir(&dir).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => log::error!("Error cleaning directory {}: {}", dir.display(), e),
        }
    }
    metrics::record_scratch_removed("maintenance", removed as u64);
    Ok(removed)
}

/// Starts the hourly sweep of `root`. The first run happens one interval after start.
pub fn spawn_periodic_sweep(root: PathBuf) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config::scratch::sweep_interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            match sweep_stale(&root, config::scratch::max_age(), SystemTime::now()).await {
                Ok(report) => log::info!(
                    "Scheduled cleanup: checked {} directories, removed {}, failed {}",
                    report.checked,
                    report.removed,
                    report.failed
                ),
                Err(e) => log::error!("Error in scheduled cleanup task: {}", e),
            }
        }
    })
}
