//! Line-oriented fallback scan for containers the cue reader rejects.

use once_cell::sync::Lazy;
use regex::Regex;

use super::timecode::parse_timestamp;
use super::{clean_cue_text, CueError, ParseStrategy, Segment};

static CUE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}\.\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2}\.\d{3})").unwrap()
});

/// Manual scan for `HH:MM:SS.mmm --> HH:MM:SS.mmm` headers.
///
/// Header lines that do not match are skipped. The text of a cue is every
/// following non-blank line up to the next blank or whitespace-only line; a
/// line made only of digits is taken for a cue index and ends the text early.
/// Markup is removed the same way the cue reader removes it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineScanner;

impl ParseStrategy for LineScanner {
    fn name(&self) -> &'static str {
        "line scan"
    }

    fn parse(&self, content: &[u8]) -> Result<Vec<Segment>, CueError> {
        let content = std::str::from_utf8(content)?;
        Ok(scan(content))
    }
}

/// Scan `content` line by line.
pub fn scan(content: &str) -> Vec<Segment> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if !line.contains("-->") {
            continue;
        }
        let Some(caps) = CUE_HEADER.captures(line) else {
            tracing::debug!("skipping unrecognized cue header: {}", line);
            continue;
        };

        let start = parse_timestamp(&caps[1]);
        let end = parse_timestamp(&caps[2]);

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].is_empty() && !is_index_line(lines[i]) {
            text_lines.push(lines[i]);
            i += 1;
        }

        let text = clean_cue_text(&text_lines.join("\n"));
        if let Some(segment) = Segment::new(start, end, &text) {
            segments.push(segment);
        }
    }

    segments
}

// ASCII digits only; a line of other Unicode digits such as `٤٢` stays cue text.
fn is_index_line(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit())
}
