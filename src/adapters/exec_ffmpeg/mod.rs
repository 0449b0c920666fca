//! FFmpeg execution adapter
//!
//! Spawns the configured `ffmpeg` binary for each cut. Seeking is done on
//! the input side (`-ss` before `-i`) with an explicit duration (`-t`), so
//! the tool never needs an absolute end time. Stderr is captured so failed
//! invocations surface the tool's own diagnostic text.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{SlicerError, SlicerResult};
use crate::ports::{CutRequest, EngineEvents, MediaToolPort};

/// Media tool adapter backed by an external ffmpeg binary
pub struct FfmpegTool {
    binary: PathBuf,
    events: Option<Arc<dyn EngineEvents>>,
}

impl FfmpegTool {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            events: None,
        }
    }

    /// Parse ffmpeg's `-progress` output and feed it to `events` as
    /// incremental percentages. Best effort only; correctness never depends
    /// on it.
    pub fn with_progress_reporting(mut self, events: Arc<dyn EngineEvents>) -> Self {
        self.events = Some(events);
        self
    }

    fn build_command(&self, request: &CutRequest) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-hide_banner")
            .arg("-nostdin")
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(format!("{:.3}", request.start_seconds))
            .arg("-i")
            .arg(&request.input)
            .arg("-t")
            .arg(format!("{:.3}", request.duration_seconds))
            .args(&request.output_args);

        if self.events.is_some() {
            command.arg("-progress").arg("pipe:1");
        }

        command.arg("-y").arg(&request.destination);
        command.stdin(Stdio::null());
        command.stdout(if self.events.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.stderr(Stdio::piped());
        command
    }
}

#[async_trait]
impl MediaToolPort for FfmpegTool {
    async fn cut(&self, request: &CutRequest) -> SlicerResult<()> {
        tracing::debug!(
            input = %request.input.display(),
            destination = %request.destination.display(),
            start = request.start_seconds,
            duration = request.duration_seconds,
            args = ?request.output_args,
            "invoking ffmpeg"
        );

        let mut command = self.build_command(request);
        let mut child = command.spawn().map_err(|e| SlicerError::ToolNotFound {
            tool: self.binary.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(events) = &self.events {
            if let Some(stdout) = child.stdout.take() {
                let events = Arc::clone(events);
                let index = request.segment_index;
                let total = request.duration_seconds;
                tokio::spawn(relay_progress(stdout, events, index, total));
            }
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = extract_diagnostic(&stderr);
        Err(SlicerError::ToolInvocation {
            message: format!(
                "ffmpeg exited with {}: {}",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                diagnostic
            ),
        })
    }
}

/// Keep the tail of stderr; ffmpeg prints the fatal line last (e.g.
/// "moov atom not found", "Invalid data found when processing input",
/// non-monotonic DTS warnings escalated to errors).
fn extract_diagnostic(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "no diagnostic output".to_string();
    }
    let tail = lines.len().saturating_sub(3);
    lines[tail..].join(" | ")
}

/// Feed ffmpeg `-progress pipe:1` key/value output to the event sink.
async fn relay_progress(
    stdout: tokio::process::ChildStdout,
    events: Arc<dyn EngineEvents>,
    index: usize,
    total_seconds: f64,
) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(percent) = progress_percent(&line, total_seconds) {
            events.tool_progress(index, percent);
        }
    }
}

/// Parse one `-progress` line into a clamped completion percentage
fn progress_percent(line: &str, total_seconds: f64) -> Option<f32> {
    let value = line.strip_prefix("out_time_us=")?;
    let us: i64 = value.trim().parse().ok()?;
    if total_seconds <= 0.0 {
        return None;
    }
    let done = us as f64 / 1_000_000.0;
    Some(((done / total_seconds) * 100.0).clamp(0.0, 100.0) as f32)
}
