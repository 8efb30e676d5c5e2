//! yt-captions - extract YouTube auto-generated captions
//!
//! This library downloads the auto-generated caption track of a video with
//! yt-dlp, parses the WebVTT container into timed segments and converts them to
//! JSON, SRT or plain text.

pub mod captions;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod extractors;
pub mod output;
pub mod utils;

pub use captions::{CaptionParser, ContainerParseError, Segment};
pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use extraction::{Extraction, ExtractionPipeline, ExtractionRequest};
pub use extractors::{CaptionTool, ToolOutput, ToolRequest, YtDlp};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Ways an extraction can end without a result
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidReference(String),

    #[error("No captions available")]
    NoCaptions,

    #[error("{0}")]
    Tool(String),

    #[error("Caption file not found after download")]
    FileNotFound,

    #[error(transparent)]
    ContainerParse(#[from] ContainerParseError),

    #[error("Caption file contained no segments")]
    EmptyResult,

    #[error("Failed to write output: {0}")]
    Output(#[from] output::OutputError),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Stable outcome token
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::InvalidReference(_) => "INVALID_REFERENCE",
            ExtractionError::NoCaptions => "NO_CAPTIONS",
            ExtractionError::Tool(_) => "TOOL_ERROR",
            ExtractionError::FileNotFound => "FILE_NOT_FOUND",
            ExtractionError::ContainerParse(_) => "CONTAINER_PARSE_ERROR",
            ExtractionError::EmptyResult => "EMPTY_RESULT",
            ExtractionError::Output(_) | ExtractionError::Io(_) => "IO_ERROR",
        }
    }

    /// Process exit code: 2 when there is nothing to extract, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractionError::NoCaptions => 2,
            _ => 1,
        }
    }
}
