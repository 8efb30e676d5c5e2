use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::captions::{find_caption_file, CaptionParser, Segment};
use crate::cli::OutputFormat;
use crate::extractors::{extract_video_id, CaptionTool, ToolOutput, ToolRequest};
use crate::output;
use crate::utils::sanitize_filename;
use crate::ExtractionError;

/// Output path template handed to the tool, relative to the work directory
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// What to extract and how to deliver it
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Video URL
    pub url: String,

    /// Caption language tag, passed through to the tool
    pub language: String,

    /// Output format
    pub format: OutputFormat,

    /// Directory to persist the result in; inline content when `None`
    pub output_dir: Option<PathBuf>,
}

/// Successful extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Converted content, ready to print
    Inline(String),

    /// Path of the file the content was written to
    Saved(PathBuf),
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Inline(content) => f.write_str(content),
            Extraction::Saved(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InvokingTool,
    LocatingFile,
    Parsing,
    Converting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::InvokingTool => "INVOKING_TOOL",
            Stage::LocatingFile => "LOCATING_FILE",
            Stage::Parsing => "PARSING",
            Stage::Converting => "CONVERTING",
            Stage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Caption extraction: run the tool, find its container, parse, convert
pub struct ExtractionPipeline {
    tool: Box<dyn CaptionTool>,
    parser: CaptionParser,
    tool_timeout: Duration,
    show_progress: bool,
}

impl ExtractionPipeline {
    /// Create a new extraction pipeline
    pub fn new(tool: Box<dyn CaptionTool>, tool_timeout: Duration) -> Self {
        Self {
            tool,
            parser: CaptionParser::default(),
            tool_timeout,
            show_progress: false,
        }
    }

    /// Show a spinner on stderr while the tool runs
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Extract captions for `request`.
    ///
    /// All intermediate files live in a temporary directory that is removed
    /// before this returns, whatever the outcome.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, ExtractionError> {
        let video_id = extract_video_id(&request.url)
            .ok_or_else(|| ExtractionError::InvalidReference(request.url.clone()))?;

        tracing::info!("Extracting {} captions for video {}", request.language, video_id);

        let work_dir = tempfile::Builder::new().prefix("yt-captions-").tempdir()?;
        let result = self.run(request, &video_id, work_dir.path()).await;

        if let Err(e) = work_dir.close() {
            tracing::warn!("Failed to remove temporary directory: {}", e);
        }

        result
    }

    async fn run(
        &self,
        request: &ExtractionRequest,
        video_id: &str,
        work_dir: &Path,
    ) -> Result<Extraction, ExtractionError> {
        enter(Stage::InvokingTool);
        let tool_output = self.invoke_tool(request, work_dir).await?;

        enter(Stage::LocatingFile);
        let caption_file = match find_caption_file(work_dir, video_id, &request.language) {
            Some(path) => path,
            // yt-dlp may exit cleanly after only warning that there is nothing to fetch
            None if tool_output.reports_no_captions() => return Err(ExtractionError::NoCaptions),
            None => return Err(ExtractionError::FileNotFound),
        };

        enter(Stage::Parsing);
        let content = fs_err::read(&caption_file)?;
        let segments = self.parser.parse(&content)?;
        if segments.is_empty() {
            return Err(ExtractionError::EmptyResult);
        }
        tracing::info!("Parsed {} caption segments", segments.len());

        enter(Stage::Converting);
        let extraction = convert(&segments, request, video_id, work_dir)?;

        enter(Stage::Done);
        Ok(extraction)
    }

    async fn invoke_tool(
        &self,
        request: &ExtractionRequest,
        work_dir: &Path,
    ) -> Result<ToolOutput, ExtractionError> {
        let tool_request = ToolRequest {
            url: request.url.clone(),
            language: request.language.clone(),
            output_template: work_dir.join(OUTPUT_TEMPLATE),
            timeout: self.tool_timeout,
        };

        let progress = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress.set_style(style);
        }
        progress.set_message("Downloading captions with yt-dlp...");
        progress.enable_steady_tick(Duration::from_millis(120));

        let result = self.tool.invoke(&tool_request).await;
        progress.finish_and_clear();

        let output = result.map_err(|e| ExtractionError::Tool(e.to_string()))?;
        if !output.stdout.trim().is_empty() {
            tracing::debug!("tool stdout: {}", output.stdout.trim());
        }

        if output.success {
            return Ok(output);
        }
        if output.reports_no_captions() {
            return Err(ExtractionError::NoCaptions);
        }
        Err(ExtractionError::Tool(format!("yt-dlp failed: {}", output.stderr.trim())))
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = %stage, "extraction stage");
}

/// Deliver segments as inline content or a file in the output directory
fn convert(
    segments: &[Segment],
    request: &ExtractionRequest,
    video_id: &str,
    work_dir: &Path,
) -> Result<Extraction, ExtractionError> {
    let format = request.format;

    if let Some(dir) = &request.output_dir {
        fs_err::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}.{}.{}",
            video_id,
            sanitize_filename(&request.language),
            format.extension()
        ));
        output::save_to_file(segments, &path, format)?;
        tracing::info!("Captions saved to {}", path.display());
        return Ok(Extraction::Saved(path));
    }

    match format {
        OutputFormat::Json => Ok(Extraction::Inline(output::render(segments, format)?)),
        OutputFormat::Srt | OutputFormat::Txt => {
            let scratch = work_dir.join(format!("output.{}", format.extension()));
            output::save_to_file(segments, &scratch, format)?;
            Ok(Extraction::Inline(fs_err::read_to_string(&scratch)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{MockCaptionTool, ToolFailure};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    const HELLO: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello world\n\n";

    fn request(format: OutputFormat, output_dir: Option<PathBuf>) -> ExtractionRequest {
        ExtractionRequest {
            url: URL.to_string(),
            language: "en".to_string(),
            format,
            output_dir,
        }
    }

    fn pipeline(tool: MockCaptionTool) -> ExtractionPipeline {
        ExtractionPipeline::new(Box::new(tool), Duration::from_secs(300))
    }

    /// Tool that writes `content` where yt-dlp would put the English track
    fn writes_caption(
        content: &'static [u8],
    ) -> impl Fn(&ToolRequest) -> Result<ToolOutput, ToolFailure> + Send + 'static {
        move |request| {
            let dir = request.output_template.parent().unwrap();
            fs_err::write(dir.join("dQw4w9WgXcQ.en.vtt"), content).unwrap();
            Ok(ToolOutput {
                success: true,
                ..Default::default()
            })
        }
    }

    fn fails_with(
        stderr: &'static str,
    ) -> impl Fn(&ToolRequest) -> Result<ToolOutput, ToolFailure> + Send + 'static {
        move |_| {
            Ok(ToolOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_json_inline() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().times(1).returning(writes_caption(HELLO.as_bytes()));

        let result = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap();

        let Extraction::Inline(json) = result else {
            panic!("expected inline content");
        };
        let segments = output::segments_from_json(&json).unwrap();
        assert_eq!(segments, vec![Segment::new(1.0, 2.5, "Hello world").unwrap()]);
    }

    #[tokio::test]
    async fn test_request_passed_to_tool() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke()
            .withf(|request| {
                request.url == URL
                    && request.language == "ko,en"
                    && request.timeout == Duration::from_secs(300)
                    && request.output_template.ends_with("%(id)s.%(ext)s")
            })
            .times(1)
            .returning(writes_caption(HELLO.as_bytes()));

        let mut request = request(OutputFormat::Txt, None);
        request.language = "ko,en".to_string();

        let result = pipeline(tool).extract(&request).await.unwrap();
        assert_eq!(result, Extraction::Inline("Hello world".to_string()));
    }

    #[tokio::test]
    async fn test_srt_inline_via_scratch_file() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(writes_caption(HELLO.as_bytes()));

        let result = pipeline(tool).extract(&request(OutputFormat::Srt, None)).await.unwrap();
        assert_eq!(
            result,
            Extraction::Inline("1\n00:00:01,000 --> 00:00:02,500\nHello world\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_saves_into_output_dir() {
        let out = TempDir::new().unwrap();
        let dir = out.path().join("nested").join("subs");
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(writes_caption(HELLO.as_bytes()));

        let result = pipeline(tool)
            .extract(&request(OutputFormat::Txt, Some(dir.clone())))
            .await
            .unwrap();

        let expected = dir.join("dQw4w9WgXcQ.en.txt");
        assert_eq!(result, Extraction::Saved(expected.clone()));
        assert_eq!(fs_err::read_to_string(expected).unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_invalid_reference_skips_tool() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().times(0);

        let mut request = request(OutputFormat::Json, None);
        request.url = "https://example.com/video".to_string();

        let err = pipeline(tool).extract(&request).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidReference(_)));
        assert_eq!(err.code(), "INVALID_REFERENCE");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_no_captions() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke()
            .returning(fails_with("ERROR: [youtube] dQw4w9WgXcQ: No subtitles available"));

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoCaptions));
        assert_eq!(err.code(), "NO_CAPTIONS");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_no_captions_after_clean_exit() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(|_| {
            Ok(ToolOutput {
                success: true,
                stdout: String::new(),
                stderr: "WARNING: Unable to download video subtitles for 'en'".to_string(),
            })
        });

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoCaptions));
    }

    #[tokio::test]
    async fn test_tool_error_carries_diagnostics() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(fails_with("ERROR: Video unavailable\n"));

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert_eq!(err.code(), "TOOL_ERROR");
        assert_eq!(err.to_string(), "yt-dlp failed: ERROR: Video unavailable");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_tool_error() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(|request| {
            Err(ToolFailure::TimedOut {
                program: "yt-dlp".to_string(),
                timeout: request.timeout,
            })
        });

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert_eq!(err.code(), "TOOL_ERROR");
        assert!(err.to_string().contains("timed out after 300 seconds"));
    }

    #[tokio::test]
    async fn test_file_not_found_and_work_dir_removed() {
        let seen = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen);

        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(move |request| {
            *recorder.lock().unwrap() = request.output_template.parent().map(Path::to_path_buf);
            Ok(ToolOutput {
                success: true,
                ..Default::default()
            })
        });

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::FileNotFound));
        assert_eq!(err.exit_code(), 1);

        let work_dir = seen.lock().unwrap().clone().unwrap();
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn test_work_dir_removed_after_success() {
        let seen = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen);
        let write = writes_caption(HELLO.as_bytes());

        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(move |request| {
            *recorder.lock().unwrap() = request.output_template.parent().map(Path::to_path_buf);
            write(request)
        });

        pipeline(tool).extract(&request(OutputFormat::Srt, None)).await.unwrap();

        let work_dir = seen.lock().unwrap().clone().unwrap();
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn test_whitespace_only_cue_is_empty_result() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke()
            .returning(writes_caption(b"WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n   \t \n"));

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyResult));
        assert_eq!(err.code(), "EMPTY_RESULT");
    }

    #[tokio::test]
    async fn test_unparseable_container() {
        let mut tool = MockCaptionTool::new();
        tool.expect_invoke().returning(writes_caption(b"WEBVTT\n\n\xff\xfe --> \xff\n"));

        let err = pipeline(tool).extract(&request(OutputFormat::Json, None)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::ContainerParse(_)));
        assert_eq!(err.code(), "CONTAINER_PARSE_ERROR");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::InvokingTool.to_string(), "INVOKING_TOOL");
        assert_eq!(Stage::Done.to_string(), "DONE");
    }
}
