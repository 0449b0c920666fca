//! Command execution: resolve arguments into an immutable configuration and
//! drive the engine or the batch runner.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::exec_ffmpeg::FfmpegTool;
use crate::adapters::ytdlp::YtDlp;
use crate::batch::{BatchFile, BatchRunner};
use crate::cli::args::{BatchArgs, CutOptions, SegmentArgs};
use crate::config::{AppConfig, ConfigFile};
use crate::engine::SegmentationEngine;
use crate::error::{SlicerError, SlicerResult};
use crate::planner::{OutputFormat, Quality, SegmentOptions};
use crate::ports::{EngineEvents, TracingEvents};
use crate::progress::ProgressTracker;
use crate::segment::Segment;

/// Resolve segmentation options. Precedence: CLI flag, then config file,
/// then built-in default.
fn resolve_options(cut: &CutOptions, file: &ConfigFile) -> SlicerResult<SegmentOptions> {
    let format = match cut.format.as_deref() {
        Some(value) => OutputFormat::from_str(value)?,
        None => file.format()?.unwrap_or_default(),
    };
    let quality = match cut.quality.as_deref() {
        Some(value) => Quality::from_str(value)?,
        None => file.quality()?.unwrap_or_default(),
    };

    Ok(SegmentOptions {
        format,
        quality,
        force_encode: cut.force_encode,
        audio_only: cut.audio_only,
    })
}

/// Resolve a tool binary path with the same precedence as the options:
/// CLI flag (or its env fallback), then config file, then the bare tool
/// name looked up on PATH.
fn resolve_tool_path(
    flag: Option<&PathBuf>,
    file_default: Option<&PathBuf>,
    fallback: &str,
) -> PathBuf {
    flag.or(file_default)
        .cloned()
        .unwrap_or_else(|| PathBuf::from(fallback))
}

fn load_config_file(path: Option<&PathBuf>) -> SlicerResult<ConfigFile> {
    match path {
        Some(path) => ConfigFile::load(path),
        None => Ok(ConfigFile::default()),
    }
}

fn load_segments(path: &PathBuf) -> SlicerResult<Vec<Segment>> {
    let content = std::fs::read_to_string(path)?;
    let segments: Vec<Segment> = serde_json::from_str(&content)?;
    Ok(segments)
}

/// Execute the segment command against an already-local file
pub async fn execute_segment(args: SegmentArgs) -> SlicerResult<()> {
    let file = load_config_file(args.cut.config.as_ref())?;
    let options = resolve_options(&args.cut, &file)?;
    let segments = load_segments(&args.segments)?;

    let ffmpeg = resolve_tool_path(args.cut.ffmpeg.as_ref(), file.ffmpeg.as_ref(), "ffmpeg");
    let events: Arc<dyn EngineEvents> = Arc::new(TracingEvents);
    let tool = FfmpegTool::new(ffmpeg).with_progress_reporting(Arc::clone(&events));
    let engine = SegmentationEngine::new(&tool, &*events);

    let paths = engine
        .segment_all(&args.input, &args.out_dir, &segments, &options)
        .await?;

    tracing::info!(count = paths.len(), "all segments produced");
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Execute the batch command: download, segment, and track every job
pub async fn execute_batch(args: BatchArgs) -> SlicerResult<()> {
    let file = load_config_file(args.cut.config.as_ref())?;
    let options = resolve_options(&args.cut, &file)?;
    let batch = BatchFile::load(&args.file)?;

    let config = AppConfig {
        ffmpeg: resolve_tool_path(args.cut.ffmpeg.as_ref(), file.ffmpeg.as_ref(), "ffmpeg"),
        ytdlp: resolve_tool_path(args.ytdlp.as_ref(), file.ytdlp.as_ref(), "yt-dlp"),
        out_dir: args.out_dir.clone(),
        concurrency: args
            .concurrency
            .or(file.concurrency)
            .unwrap_or_else(AppConfig::default_concurrency),
        force: args.force,
        options,
    };

    let mut tracker = ProgressTracker::load_or_default(&config.progress_file())?;

    let events: Arc<dyn EngineEvents> = Arc::new(TracingEvents);
    let tool = Arc::new(
        FfmpegTool::new(config.ffmpeg.clone()).with_progress_reporting(Arc::clone(&events)),
    );
    let ytdlp = Arc::new(YtDlp::new(config.ytdlp.clone()));
    let runner = BatchRunner::new(config, tool, ytdlp.clone(), ytdlp, events);

    let summary = runner.run(&batch.videos, &mut tracker).await?;
    tracing::info!(
        completed = summary.completed.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "batch finished"
    );

    if summary.failed.is_empty() {
        Ok(())
    } else {
        let detail: Vec<String> = summary
            .failed
            .iter()
            .map(|(id, error)| format!("{id}: {error}"))
            .collect();
        Err(SlicerError::BatchFailed {
            failed: summary.failed.len(),
            detail: detail.join("; "),
        })
    }
}
