//! Batch orchestration
//!
//! Processes a list of video jobs: download, resolve the segment list
//! (explicit or chapter-derived), run the segmentation engine, and record
//! the outcome in the progress tracker. Videos run in fixed-size concurrent
//! groups; segments within one video stay sequential inside the engine.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::engine::SegmentationEngine;
use crate::error::{SlicerError, SlicerResult};
use crate::ports::{ChapterPort, DownloaderPort, EngineEvents, MediaToolPort, VideoOutline};
use crate::progress::ProgressTracker;
use crate::segment::{sanitize_name, Segment};
use crate::utils::time::seconds_to_timestamp;

/// One entry of a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct VideoJob {
    /// Stable identifier for progress tracking; derived from the URL when
    /// absent
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    /// Explicit cut list; empty means derive segments from chapters
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl VideoJob {
    pub fn id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => {
                let tail = self
                    .url
                    .rsplit('/')
                    .find(|part| !part.is_empty())
                    .unwrap_or(&self.url);
                let sanitized = sanitize_name(tail);
                if sanitized.is_empty() {
                    sanitize_name(&self.url)
                } else {
                    sanitized
                }
            }
        }
    }
}

/// Parsed batch description file
#[derive(Debug, Deserialize)]
pub struct BatchFile {
    pub videos: Vec<VideoJob>,
}

impl BatchFile {
    pub fn load(path: &Path) -> SlicerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SlicerError::InvalidBatchFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SlicerError::InvalidBatchFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Final tally of one batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Resolve chapter-detection output into a concrete segment list.
///
/// A chapter without an end time gets the next chapter's start, or the full
/// video duration for the last one. Zero chapters become a single segment
/// spanning the whole video.
pub fn segments_from_outline(outline: &VideoOutline) -> Vec<Segment> {
    if outline.chapters.is_empty() {
        return vec![Segment {
            name: None,
            start: Some("00:00:00".to_string()),
            end: if outline.duration > 0.0 {
                Some(seconds_to_timestamp(outline.duration))
            } else {
                None
            },
        }];
    }

    outline
        .chapters
        .iter()
        .enumerate()
        .map(|(i, chapter)| {
            let end = chapter
                .end_time
                .or_else(|| outline.chapters.get(i + 1).map(|next| next.start_time))
                .or(if outline.duration > 0.0 {
                    Some(outline.duration)
                } else {
                    None
                });
            Segment {
                name: chapter.title.clone(),
                start: Some(seconds_to_timestamp(chapter.start_time)),
                end: end.map(seconds_to_timestamp),
            }
        })
        .collect()
}

/// Batch runner wiring the collaborators together
pub struct BatchRunner {
    config: AppConfig,
    tool: Arc<dyn MediaToolPort>,
    downloader: Arc<dyn DownloaderPort>,
    chapters: Arc<dyn ChapterPort>,
    events: Arc<dyn EngineEvents>,
}

impl BatchRunner {
    pub fn new(
        config: AppConfig,
        tool: Arc<dyn MediaToolPort>,
        downloader: Arc<dyn DownloaderPort>,
        chapters: Arc<dyn ChapterPort>,
        events: Arc<dyn EngineEvents>,
    ) -> Self {
        Self {
            config,
            tool,
            downloader,
            chapters,
            events,
        }
    }

    /// Process every job, updating `tracker` exactly once per video after
    /// its segmentation call returns or errors.
    pub async fn run(
        &self,
        jobs: &[VideoJob],
        tracker: &mut ProgressTracker,
    ) -> SlicerResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        let concurrency = self.config.concurrency.max(1);

        for group in jobs.chunks(concurrency) {
            let mut set: JoinSet<(String, SlicerResult<usize>)> = JoinSet::new();

            for job in group {
                let id = job.id();
                if !self.config.force && tracker.is_completed(&id) {
                    tracing::info!(%id, "already completed, skipping");
                    summary.skipped.push(id);
                    continue;
                }

                let job = job.clone();
                let config = self.config.clone();
                let tool = Arc::clone(&self.tool);
                let downloader = Arc::clone(&self.downloader);
                let chapters = Arc::clone(&self.chapters);
                let events = Arc::clone(&self.events);
                set.spawn(async move {
                    let result =
                        process_video(&job, &config, &*tool, &*downloader, &*chapters, &*events)
                            .await;
                    (id, result)
                });
            }

            // The whole group finishes before the next one starts. One
            // video's failure never cancels its siblings.
            while let Some(joined) = set.join_next().await {
                let (id, result) = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(error = %e, "video task panicked");
                        continue;
                    }
                };
                match result {
                    Ok(count) => {
                        tracing::info!(%id, segments = count, "video completed");
                        tracker.mark_completed(&id)?;
                        summary.completed.push(id);
                    }
                    Err(error) => {
                        let message = error.to_string();
                        tracing::error!(%id, error = %message, "video failed");
                        tracker.mark_failed(&id, &message)?;
                        summary.failed.push((id, message));
                    }
                }
            }
        }

        Ok(summary)
    }
}

async fn process_video(
    job: &VideoJob,
    config: &AppConfig,
    tool: &dyn MediaToolPort,
    downloader: &dyn DownloaderPort,
    chapters: &dyn ChapterPort,
    events: &dyn EngineEvents,
) -> SlicerResult<usize> {
    let work_dir = config.out_dir.join(job.id());
    let input = downloader.download(&job.url, &work_dir).await?;

    let segments = if job.segments.is_empty() {
        let outline = chapters.outline(&job.url).await?;
        segments_from_outline(&outline)
    } else {
        job.segments.clone()
    };

    let engine = SegmentationEngine::new(tool, events);
    let paths = engine
        .segment_all(&input, &work_dir, &segments, &config.options)
        .await?;
    Ok(paths.len())
}
