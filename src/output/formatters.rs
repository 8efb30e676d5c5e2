use crate::captions::timecode::format_srt_timestamp;
use crate::captions::Segment;

/// Format segments as plain text, one segment per line
pub fn format_as_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format segments as pretty-printed JSON (`[{"start", "end", "text"}, ...]`)
pub fn format_as_json(segments: &[Segment]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(segments)
}

/// Read segments back from [`format_as_json`] output
pub fn segments_from_json(json: &str) -> serde_json::Result<Vec<Segment>> {
    serde_json::from_str(json)
}

/// Format segments as SRT subtitles
pub fn format_as_srt(segments: &[Segment]) -> String {
    let mut lines = Vec::with_capacity(segments.len() * 4);

    for (i, segment) in segments.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end)
        ));
        lines.push(segment.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}
