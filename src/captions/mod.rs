use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod discovery;
pub mod scanner;
pub mod timecode;
pub mod webvtt;

pub use discovery::find_caption_file;
pub use scanner::LineScanner;
pub use webvtt::CueReader;

/// Inline cue markup: `<c>`, `</c>`, `<v Speaker>`, `<00:00:01.000>` and friends
static CUE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One timed caption line after trimming and filtering.
///
/// Deserialization goes through [`Segment::new`], so decoded segments hold
/// the same guarantees as parsed ones and blank text is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    /// Start time in seconds, millisecond precision
    pub start: f64,

    /// End time in seconds, never before `start`
    pub end: f64,

    /// Single-line, trimmed, non-empty text
    pub text: String,
}

impl Segment {
    /// Build a segment from raw cue values.
    ///
    /// Returns `None` when the text is blank after trimming. Times are rounded
    /// to milliseconds, negative starts clamp to zero and an end before the
    /// start clamps to the start.
    pub fn new(start: f64, end: f64, text: &str) -> Option<Self> {
        let text = collapse_lines(text);
        if text.is_empty() {
            return None;
        }

        let start = timecode::round_millis(start.max(0.0));
        let end = timecode::round_millis(end).max(start);

        Some(Self { start, end, text })
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    text: String,
}

impl TryFrom<RawSegment> for Segment {
    type Error = String;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        if !raw.start.is_finite() || !raw.end.is_finite() {
            return Err(format!("segment times must be finite: {} --> {}", raw.start, raw.end));
        }
        Segment::new(raw.start, raw.end, &raw.text)
            .ok_or_else(|| "segment text is blank".to_string())
    }
}

/// Strip inline cue markup and decode common character references.
///
/// Both parse strategies run cue text through this before building segments.
pub fn clean_cue_text(text: &str) -> String {
    let stripped = CUE_TAG.replace_all(text, "");
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&lrm;", "\u{200e}")
        .replace("&rlm;", "\u{200f}")
        .replace("&amp;", "&")
}

/// Join the trimmed, non-blank lines of `text` with single spaces.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Failure of a single parse strategy
#[derive(thiserror::Error, Debug)]
pub enum CueError {
    #[error("container is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("missing WEBVTT signature on the first line")]
    MissingHeader,

    #[error("line {line}: block has no cue timing")]
    MissingTiming { line: usize },

    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: cue ends before it starts")]
    InvertedTiming { line: usize },
}

/// Both parse strategies rejected the container
#[derive(thiserror::Error, Debug)]
#[error("caption container could not be parsed (cue reader: {primary}; line scan: {fallback})")]
pub struct ContainerParseError {
    pub primary: CueError,
    pub fallback: CueError,
}

/// A way of turning container bytes into segments
pub trait ParseStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parse the whole container
    fn parse(&self, content: &[u8]) -> Result<Vec<Segment>, CueError>;
}

/// Structured cue reader with a permissive line-scan fallback
pub struct CaptionParser {
    primary: Box<dyn ParseStrategy>,
    fallback: Box<dyn ParseStrategy>,
}

impl CaptionParser {
    pub fn new(primary: Box<dyn ParseStrategy>, fallback: Box<dyn ParseStrategy>) -> Self {
        Self { primary, fallback }
    }

    /// Parse container bytes into segments in source order
    pub fn parse(&self, content: &[u8]) -> Result<Vec<Segment>, ContainerParseError> {
        let primary = match self.primary.parse(content) {
            Ok(segments) => return Ok(segments),
            Err(e) => e,
        };

        tracing::warn!(
            "{} failed ({}), retrying with {}",
            self.primary.name(),
            primary,
            self.fallback.name()
        );

        self.fallback
            .parse(content)
            .map_err(|fallback| ContainerParseError { primary, fallback })
    }
}

impl Default for CaptionParser {
    fn default() -> Self {
        Self::new(Box::new(CueReader), Box::new(LineScanner))
    }
}
