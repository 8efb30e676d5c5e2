use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "yt-captions",
    about = "Extract YouTube auto-generated captions as JSON, SRT or plain text",
    version,
    long_about = "Downloads the auto-generated captions of a YouTube video with yt-dlp and converts them to JSON segments, SRT subtitles or plain text.\n\nExit codes: 0 on success, 2 when the video has no captions, 1 on any other failure."
)]
pub struct Cli {
    /// YouTube URL (youtube.com/watch, youtu.be, embed or /v/ links)
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Caption language, or a comma-separated list such as `ko,en` [default: en]
    #[arg(short, long = "lang", value_name = "LANG")]
    pub language: Option<String>,

    /// Output format [default: json]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the result to `<DIR>/<id>.<lang>.<format>` and print the path
    #[arg(short, long = "outdir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long, value_name = "FILE", env = "YT_CAPTIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// yt-dlp executable to run
    #[arg(long, value_name = "PROGRAM", env = "YT_CAPTIONS_TOOL")]
    pub tool: Option<String>,

    /// Seconds to wait for yt-dlp before giving up
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SRT subtitle format
    Srt,
    /// JSON segments with timestamps
    Json,
    /// Plain text, one caption per line
    Txt,
}

impl OutputFormat {
    /// File extension, also the value accepted on the command line
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
