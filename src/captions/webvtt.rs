//! Structured WebVTT cue reader.
//!
//! Strict about the container shape: the `WEBVTT` signature, cue timing lines
//! and timestamps must all be valid, otherwise the whole read fails and the
//! caller is expected to fall back to [`LineScanner`](super::LineScanner).

use super::timecode::parse_vtt_timestamp;
use super::{clean_cue_text, CueError, ParseStrategy, Segment};

/// Blocks that carry no cue: comments, style sheets and region definitions
const NON_CUE_BLOCKS: &[&str] = &["NOTE", "STYLE", "REGION"];

/// A cue as it appears in the container, before filtering
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Optional cue identifier line
    pub identifier: Option<String>,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Cue settings following the end timestamp (`align:start position:0%`)
    pub settings: Option<String>,

    /// Raw payload lines
    pub lines: Vec<String>,
}

impl Cue {
    /// Payload with markup removed and common entities decoded, lines kept
    pub fn text(&self) -> String {
        clean_cue_text(&self.lines.join("\n"))
    }
}

/// [`ParseStrategy`] backed by [`read_cues`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CueReader;

impl ParseStrategy for CueReader {
    fn name(&self) -> &'static str {
        "cue reader"
    }

    fn parse(&self, content: &[u8]) -> Result<Vec<Segment>, CueError> {
        let content = std::str::from_utf8(content)?;
        let segments = read_cues(content)?
            .iter()
            .filter_map(|cue| Segment::new(cue.start, cue.end, &cue.text()))
            .collect();
        Ok(segments)
    }
}

/// Read every cue of a WebVTT document in file order.
pub fn read_cues(content: &str) -> Result<Vec<Cue>, CueError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().enumerate().map(|(i, line)| (i + 1, line));

    match lines.next() {
        Some((_, first)) if is_signature(first) => {}
        _ => return Err(CueError::MissingHeader),
    }

    let mut cues = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();
    let mut in_header = true;

    for (number, line) in lines {
        // Only an empty line ends a block; YouTube writes single-space lines inside cues.
        if line.is_empty() {
            in_header = false;
            if !block.is_empty() {
                if let Some(cue) = read_block(&block)? {
                    cues.push(cue);
                }
                block.clear();
            }
        } else if !in_header {
            block.push((number, line));
        }
    }

    if !block.is_empty() {
        if let Some(cue) = read_block(&block)? {
            cues.push(cue);
        }
    }

    Ok(cues)
}

fn is_signature(line: &str) -> bool {
    starts_with_keyword(line, "WEBVTT")
}

/// `line` is `keyword` alone or followed by a space or tab
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t'),
        None => false,
    }
}

/// Read one blank-line delimited block. Comment, style and region blocks yield `None`.
fn read_block(block: &[(usize, &str)]) -> Result<Option<Cue>, CueError> {
    let (first_number, first) = block[0];
    let has_timing = |index: usize| block.get(index).is_some_and(|(_, line)| line.contains("-->"));

    // A timing line on either of the first two lines makes this a cue, whatever its identifier
    if !has_timing(0)
        && !has_timing(1)
        && NON_CUE_BLOCKS
            .iter()
            .any(|keyword| starts_with_keyword(first, keyword))
    {
        return Ok(None);
    }

    let (identifier, timing_index) = if has_timing(0) {
        (None, 0)
    } else if has_timing(1) {
        (Some(first.trim().to_string()), 1)
    } else {
        return Err(CueError::MissingTiming { line: first_number });
    };

    let (line, timing) = block[timing_index];
    let (start_text, rest) = timing
        .split_once("-->")
        .ok_or(CueError::MissingTiming { line })?;
    let rest = rest.trim_start();
    let end_text = rest.split_whitespace().next().unwrap_or("");
    let settings = rest[end_text.len()..].trim();

    let start = parse_timestamp_at(start_text.trim(), line)?;
    let end = parse_timestamp_at(end_text, line)?;
    if end < start {
        return Err(CueError::InvertedTiming { line });
    }

    Ok(Some(Cue {
        identifier,
        start,
        end,
        settings: (!settings.is_empty()).then(|| settings.to_string()),
        lines: block[timing_index + 1..]
            .iter()
            .map(|(_, line)| line.to_string())
            .collect(),
    }))
}

fn parse_timestamp_at(value: &str, line: usize) -> Result<f64, CueError> {
    parse_vtt_timestamp(value).ok_or_else(|| CueError::InvalidTimestamp {
        line,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_cues_in_order() {
        let content = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                       00:00:01.000 --> 00:00:02.500\nHello world\n\n\
                       intro\n00:00:03.000 --> 00:00:04.000 align:start position:0%\nSecond\nline\n";
        let cues = read_cues(content).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].end, 2.5);
        assert_eq!(cues[0].identifier, None);
        assert_eq!(cues[1].identifier.as_deref(), Some("intro"));
        assert_eq!(cues[1].settings.as_deref(), Some("align:start position:0%"));
        assert_eq!(cues[1].lines, vec!["Second", "line"]);
    }

    #[test]
    fn test_skips_note_and_style_blocks() {
        let content = "WEBVTT\n\nNOTE generated\n\nSTYLE\n::cue { color: red }\n\n\
                       00:01.000 --> 00:02.000\nHi\n";
        let cues = read_cues(content).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].lines, vec!["Hi"]);
    }

    #[test]
    fn test_keyword_like_identifiers_are_cues() {
        let content = "WEBVTT\n\nNOTES-1\n00:00:01.000 --> 00:00:02.000\nkept\n\n\
                       STYLEguide\n00:00:02.000 --> 00:00:03.000\nalso kept\n\n\
                       NOTE 3\n00:00:03.000 --> 00:00:04.000\nthird\n\n\
                       NOTE\tjust a comment\n\n\
                       REGION\nid:fred\n\n\
                       NOTEWORTHY\n";
        let err = read_cues(content).unwrap_err();
        assert!(matches!(err, CueError::MissingTiming { line: 20 }));

        let cues = read_cues(&content.replace("NOTEWORTHY\n", "")).unwrap();
        let identifiers: Vec<_> = cues.iter().map(|cue| cue.identifier.as_deref()).collect();
        assert_eq!(identifiers, vec![Some("NOTES-1"), Some("STYLEguide"), Some("NOTE 3")]);
        assert_eq!(cues[0].lines, vec!["kept"]);
    }

    #[test]
    fn test_accepts_bom_and_crlf() {
        let content = "\u{feff}WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nHi\r\n";
        let cues = read_cues(content).unwrap();
        assert_eq!(cues[0].lines, vec!["Hi"]);
    }

    #[test]
    fn test_rejects_missing_signature() {
        let err = read_cues("00:00:01.000 --> 00:00:02.000\nHi\n").unwrap_err();
        assert!(matches!(err, CueError::MissingHeader));
        assert!(matches!(read_cues("WEBVTTX\n").unwrap_err(), CueError::MissingHeader));
    }

    #[test]
    fn test_rejects_malformed_blocks() {
        let err = read_cues("WEBVTT\n\njust some text\n").unwrap_err();
        assert!(matches!(err, CueError::MissingTiming { line: 3 }));

        let err = read_cues("WEBVTT\n\n00:00:01,000 --> 00:00:02.000\nHi\n").unwrap_err();
        assert!(matches!(err, CueError::InvalidTimestamp { line: 3, .. }));

        let err = read_cues("WEBVTT\n\n00:00:03.000 --> 00:00:02.000\nHi\n").unwrap_err();
        assert!(matches!(err, CueError::InvertedTiming { line: 3 }));
    }

    #[test]
    fn test_cue_text_strips_markup() {
        let cue = Cue {
            identifier: None,
            start: 0.0,
            end: 1.0,
            settings: None,
            lines: vec![
                "<v Roger>we're</v> going".to_string(),
                "now<00:00:01.319><c> to</c><00:00:01.520><c> talk</c> &amp; &gt;&gt;".to_string(),
            ],
        };
        assert_eq!(cue.text(), "we're going\nnow to talk & >>");
    }

    #[test]
    fn test_whitespace_line_stays_inside_cue() {
        let content = "WEBVTT\n\n00:00:00.160 --> 00:00:02.230 align:start position:0%\n \n\
                       hey<00:00:00.480><c> everyone</c>\n";
        let cues = read_cues(content).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), " \nhey everyone");
    }

    #[test]
    fn test_strategy_collapses_and_filters() {
        let content = b"WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n  two\n  lines \n\n\
                        00:00:02.000 --> 00:00:03.000\n<c> </c>\n";
        let segments = CueReader.parse(content).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "two lines");
    }
}
