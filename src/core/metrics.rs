//! Prometheus metrics for the bot
//!
//! Counters are registered in the default registry and served by the
//! `/metrics` route of the web server.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, Encoder, IntGauge, TextEncoder};

/// Format listings by outcome (ok/error/stale)
#[allow(clippy::expect_used)]
pub static PROBE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("ytgrab_probe_total", "Format listings by outcome", &["outcome"])
        .expect("metric can be registered")
});

/// Downloads by quality tier and outcome
#[allow(clippy::expect_used)]
pub static DOWNLOAD_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ytgrab_download_total",
        "Downloads by quality tier and outcome",
        &["quality", "outcome"]
    )
    .expect("metric can be registered")
});

/// yt-dlp failures by phase (probe/download) and error kind
#[allow(clippy::expect_used)]
pub static TOOL_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ytgrab_tool_errors_total",
        "yt-dlp failures by phase and kind",
        &["phase", "kind"]
    )
    .expect("metric can be registered")
});

/// Uploads by attachment kind (audio/video) and outcome
#[allow(clippy::expect_used)]
pub static UPLOADS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ytgrab_uploads_total",
        "Uploads by attachment kind and outcome",
        &["kind", "outcome"]
    )
    .expect("metric can be registered")
});

/// Scratch directories removed, by reason (request/sweep/maintenance)
#[allow(clippy::expect_used)]
pub static SCRATCH_DIRS_REMOVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ytgrab_scratch_dirs_removed_total",
        "Scratch directories removed by reason",
        &["reason"]
    )
    .expect("metric can be registered")
});

#[allow(clippy::expect_used)]
pub static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("ytgrab_active_sessions", "Sessions currently in the store").expect("metric can be registered")
});

pub fn record_probe(outcome: &str) {
    PROBE_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_download(quality: &str, outcome: &str) {
    DOWNLOAD_TOTAL.with_label_values(&[quality, outcome]).inc();
}

pub fn record_tool_error(phase: &str, kind: &str) {
    TOOL_ERRORS_TOTAL.with_label_values(&[phase, kind]).inc();
}

pub fn record_upload(kind: &str, outcome: &str) {
    UPLOADS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn record_scratch_removed(reason: &str, count: u64) {
    SCRATCH_DIRS_REMOVED_TOTAL.with_label_values(&[reason]).inc_by(count as f64);
}

/// Renders the default registry in text exposition format.
pub fn render() -> Result<(String, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok((encoder.format_type().to_string(), String::from_utf8_lossy(&buffer).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metric() {
        record_tool_error("probe", "timeout");
        let (content_type, body) = render().unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(body.contains("ytgrab_tool_errors_total"));
    }
}
