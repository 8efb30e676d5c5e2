use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{CaptionTool, ToolFailure, ToolOutput, ToolRequest};

/// Caption downloader backed by yt-dlp
pub struct YtDlp {
    yt_dlp_path: String,
}

impl YtDlp {
    pub fn new() -> Self {
        Self::with_program("yt-dlp")
    }

    /// Use a specific executable instead of `yt-dlp` from PATH
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: program.into(),
        }
    }

    fn build_command(&self, request: &ToolRequest) -> Command {
        let mut command = Command::new(&self.yt_dlp_path);
        command
            // Only the auto-generated track, no media
            .arg("--write-auto-subs")
            .arg(format!("--sub-lang={}", request.language))
            .arg("--skip-download")
            .arg("-o")
            .arg(&request.output_template)
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl CaptionTool for YtDlp {
    async fn invoke(&self, request: &ToolRequest) -> Result<ToolOutput, ToolFailure> {
        tracing::debug!(
            "Running {} for {} (lang {}, timeout {:?})",
            self.yt_dlp_path,
            request.url,
            request.language,
            request.timeout
        );

        let child = self.build_command(request).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolFailure::NotInstalled {
                    program: self.yt_dlp_path.clone(),
                }
            } else {
                ToolFailure::Io {
                    program: self.yt_dlp_path.clone(),
                    source: e,
                }
            }
        })?;

        // Dropping the pending future on timeout kills the child.
        let output = tokio::time::timeout(request.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolFailure::TimedOut {
                program: self.yt_dlp_path.clone(),
                timeout: request.timeout,
            })?
            .map_err(|e| ToolFailure::Io {
                program: self.yt_dlp_path.clone(),
                source: e,
            })?;

        tracing::debug!("{} exited with {}", self.yt_dlp_path, output.status);

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}
