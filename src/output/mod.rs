use std::path::Path;

use crate::captions::Segment;
use crate::cli::OutputFormat;

pub mod formatters;

pub use formatters::*;

/// Failure while rendering or writing converted captions
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("failed to serialize segments: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Render segments in the requested format
pub fn render(segments: &[Segment], format: OutputFormat) -> Result<String, OutputError> {
    let content = match format {
        OutputFormat::Txt => format_as_text(segments),
        OutputFormat::Json => format_as_json(segments)?,
        OutputFormat::Srt => format_as_srt(segments),
    };
    Ok(content)
}

/// Save segments to file
pub fn save_to_file(
    segments: &[Segment],
    path: &Path,
    format: OutputFormat,
) -> Result<(), OutputError> {
    let content = render(segments, format)?;
    fs_err::write(path, content)?;
    Ok(())
}
