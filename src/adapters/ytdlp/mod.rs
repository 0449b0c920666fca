//! yt-dlp adapter
//!
//! Implements the downloader and chapter-detection ports over the external
//! `yt-dlp` binary. Downloads print the final file path on stdout via
//! `--print after_move:filepath`; chapter detection uses `--dump-json`
//! without downloading.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{SlicerError, SlicerResult};
use crate::ports::{Chapter, ChapterPort, DownloaderPort, VideoOutline};

/// Downloader + chapter detector backed by the yt-dlp binary
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    async fn run(&self, args: &[&str], url: &str) -> SlicerResult<String> {
        let output = Command::new(&self.binary)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SlicerError::ToolNotFound {
                tool: self.binary.display().to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlicerError::Download {
                url: url.to_string(),
                message: stderr.lines().last().unwrap_or("unknown error").to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DownloaderPort for YtDlp {
    async fn download(&self, url: &str, dest_dir: &Path) -> SlicerResult<PathBuf> {
        tracing::info!(url, dest = %dest_dir.display(), "downloading video");
        tokio::fs::create_dir_all(dest_dir).await?;

        let template = dest_dir.join("%(title)s.%(ext)s");
        let template = template.to_string_lossy().into_owned();
        let stdout = self
            .run(
                &[
                    "--no-playlist",
                    "--no-simulate",
                    "--print",
                    "after_move:filepath",
                    "-o",
                    &template,
                ],
                url,
            )
            .await?;

        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| SlicerError::Download {
                url: url.to_string(),
                message: "downloader did not report a file path".to_string(),
            })?;

        tracing::info!(path = %path.display(), "download complete");
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct VideoMetadata {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    chapters: Option<Vec<Chapter>>,
}

#[async_trait]
impl ChapterPort for YtDlp {
    async fn outline(&self, url: &str) -> SlicerResult<VideoOutline> {
        let stdout = self
            .run(&["--no-playlist", "--skip-download", "--dump-json"], url)
            .await
            .map_err(|e| SlicerError::Probe {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let metadata: VideoMetadata =
            serde_json::from_str(stdout.trim()).map_err(|e| SlicerError::Probe {
                url: url.to_string(),
                message: format!("unparseable metadata JSON: {e}"),
            })?;

        let duration = metadata.duration.unwrap_or(0.0);
        let chapters = metadata.chapters.unwrap_or_default();
        tracing::info!(url, duration, chapters = chapters.len(), "probed video outline");

        Ok(VideoOutline { duration, chapters })
    }
}
