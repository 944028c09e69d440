//! Quality tiers and their yt-dlp format selectors
//!
//! The menu offered to the user is a fixed set of tiers. Each tier maps to a
//! selector expression that depends on whether the source is YouTube, where
//! video and audio come as separate streams that have to be merged.

use std::str::FromStr;

use crate::core::validation::Platform;

/// User-facing quality tier carried in the callback token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr, strum::Display)]
pub enum Quality {
    #[strum(serialize = "best")]
    Best,
    #[strum(serialize = "480")]
    P480,
    #[strum(serialize = "720")]
    P720,
    #[strum(serialize = "1080")]
    P1080,
    #[strum(serialize = "audio")]
    Audio,
}

impl Quality {
    /// Parses a tier tag. Unknown tags silently fall back to [`Quality::Best`].
    pub fn from_tag(tag: &str) -> Self {
        Quality::from_str(tag.trim()).unwrap_or(Quality::Best)
    }

    pub fn tag(self) -> &'static str {
        self.into()
    }

    /// Vertical resolution cap, if the tier has one.
    pub fn height(self) -> Option<u32> {
        match self {
            Quality::P480 => Some(480),
            Quality::P720 => Some(720),
            Quality::P1080 => Some(1080),
            Quality::Best | Quality::Audio => None,
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, Quality::Audio)
    }
}

/// A resolved format choice, ready to be turned into yt-dlp arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    /// Value for `-f`
    pub selector: String,
    /// Value for `--merge-output-format`
    pub merge_container: Option<&'static str>,
    /// Value for `--audio-format` (implies `-x`)
    pub audio_format: Option<&'static str>,
}

impl FormatSelection {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.selector.clone()];
        if let Some(container) = self.merge_container {
            args.push("--merge-output-format".to_string());
            args.push(container.to_string());
        }
        if let Some(audio_format) = self.audio_format {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(audio_format.to_string());
        }
        args
    }
}

/// Maps a tier to its selector for the given platform. Pure, no I/O.
pub fn select_format(quality: Quality, platform: Platform) -> FormatSelection {
    if quality.is_audio() {
        return FormatSelection {
            selector: "bestaudio".to_string(),
            merge_container: None,
            audio_format: Some("mp3"),
        };
    }

    let selector = match quality.height() {
        Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
        None if platform.is_youtube() => "bestvideo+bestaudio/best".to_string(),
        None => "best".to_string(),
    };

    FormatSelection {
        selector,
        merge_container: platform.is_youtube().then_some("mp4"),
        audio_format: None,
    }
}

/// Keeps the lines of `yt-dlp -F` output that describe a usable format.
///
/// Best effort: the table layout changes between yt-dlp versions, so lines
/// are matched by container/codec tokens rather than parsed by column.
pub fn filter_format_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            ["mp4", "webm", "m4a", "audio", "video"]
                .iter()
                .any(|token| lower.contains(token))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quality_tags_round_trip() {
        for quality in [Quality::Best, Quality::P480, Quality::P720, Quality::P1080, Quality::Audio] {
            assert_eq!(Quality::from_tag(quality.tag()), quality);
        }
    }

    #[test]
    fn test_unknown_tier_falls_back_to_best() {
        for platform in [Platform::YouTube, Platform::Generic] {
            let best = select_format(Quality::Best, platform);
            for tag in ["4k", "", "BEST", "360", "audio2"] {
                assert_eq!(select_format(Quality::from_tag(tag), platform), best, "tag {:?}", tag);
            }
        }
    }

    #[test]
    fn test_youtube_selectors_merge_to_mp4() {
        assert_eq!(
            select_format(Quality::Best, Platform::YouTube).to_args(),
            vec!["-f", "bestvideo+bestaudio/best", "--merge-output-format", "mp4"]
        );
        assert_eq!(
            select_format(Quality::P720, Platform::YouTube).to_args(),
            vec![
                "-f",
                "bestvideo[height<=720]+bestaudio/best[height<=720]",
                "--merge-output-format",
                "mp4"
            ]
        );
    }

    #[test]
    fn test_generic_selectors_have_no_container() {
        assert_eq!(select_format(Quality::Best, Platform::Generic).to_args(), vec!["-f", "best"]);
        assert_eq!(
            select_format(Quality::P1080, Platform::Generic).to_args(),
            vec!["-f", "bestvideo[height<=1080]+bestaudio/best[height<=1080]"]
        );
    }

    #[test]
    fn test_audio_is_platform_independent() {
        let expected = vec!["-f", "bestaudio", "-x", "--audio-format", "mp3"];
        assert_eq!(select_format(Quality::Audio, Platform::YouTube).to_args(), expected);
        assert_eq!(select_format(Quality::Audio, Platform::Generic).to_args(), expected);
    }

    #[test]
    fn test_filter_format_lines() {
        let stdout = "\
[youtube] Extracting URL: https://youtu.be/x
[info] Available formats for x:
ID  EXT   RESOLUTION FPS │   FILESIZE
──────────────────────────────────────
139 m4a   audio only     │    1.2MiB
18  mp4   640x360     30 │   10.1MiB
248 webm  1920x1080   30 │   80.0MiB

sb0 mhtml 48x27          │ storyboard
";
        let lines = filter_format_lines(stdout);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("139 m4a"));
        assert!(lines.iter().all(|l| !l.contains("mhtml")));
    }
}
