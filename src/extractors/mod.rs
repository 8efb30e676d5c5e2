use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

pub mod youtube;

pub use youtube::YtDlp;

/// Known YouTube URL shapes, each capturing the 11-character video id
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
        r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Diagnostics yt-dlp prints when a video has no captions to offer
const NO_CAPTIONS_MARKERS: &[&str] = &["Unable to download video subtitles", "No subtitles available"];

/// One caption download request
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Source URL passed through to the tool
    pub url: String,

    /// Language tag, possibly a comma-separated list
    pub language: String,

    /// Output path template with `%(id)s` / `%(ext)s` placeholders
    pub output_template: PathBuf,

    /// Hard limit on the run
    pub timeout: Duration,
}

/// What a finished tool run reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the diagnostics say the video simply has no captions
    pub fn reports_no_captions(&self) -> bool {
        NO_CAPTIONS_MARKERS
            .iter()
            .any(|marker| self.stderr.contains(marker))
    }
}

/// The tool could not be run to completion
#[derive(thiserror::Error, Debug)]
pub enum ToolFailure {
    #[error("{program} is not installed. Please install it: https://github.com/yt-dlp/yt-dlp")]
    NotInstalled { program: String },

    #[error("{program} timed out after {} seconds", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// External caption download tool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionTool: Send + Sync {
    /// Run the tool once and report its exit status and output streams
    async fn invoke(&self, request: &ToolRequest) -> Result<ToolOutput, ToolFailure>;
}

/// Extract the YouTube video id from a URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|caps| caps[1].to_string())
}
