//! Ports - interface contracts for external collaborators
//!
//! The segmentation core talks to the outside world (the media tool, the
//! downloader, chapter detection, observability) only through these traits,
//! so tests can substitute recording fakes without touching process state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SlicerResult;
use crate::planner::StrategyKind;

/// One external media tool invocation: cut a time window out of the input
/// and write it to the destination with the given output-side arguments.
#[derive(Debug, Clone)]
pub struct CutRequest {
    /// Position of the segment in the input order, for progress reporting
    pub segment_index: usize,
    pub input: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub output_args: Vec<String>,
    pub destination: PathBuf,
}

/// Port for the external media-processing tool
#[async_trait]
pub trait MediaToolPort: Send + Sync {
    /// Run one cut. Must only return `Ok` on a clean tool exit; any non-zero
    /// exit or fatal diagnostic is an error carrying the tool's message.
    async fn cut(&self, request: &CutRequest) -> SlicerResult<()>;
}

/// Port for fetching a remote video to local storage
#[async_trait]
pub trait DownloaderPort: Send + Sync {
    /// Download `url` into `dest_dir`, returning the local file path
    async fn download(&self, url: &str, dest_dir: &Path) -> SlicerResult<PathBuf>;
}

/// A named time range from source metadata
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Chapter {
    pub title: Option<String>,
    pub start_time: f64,
    pub end_time: Option<f64>,
}

/// Duration and chapter list for a remote video
#[derive(Debug, Clone)]
pub struct VideoOutline {
    pub duration: f64,
    pub chapters: Vec<Chapter>,
}

/// Port for chapter/metadata detection
#[async_trait]
pub trait ChapterPort: Send + Sync {
    /// Probe `url` for its duration and embedded chapters without downloading
    async fn outline(&self, url: &str) -> SlicerResult<VideoOutline>;
}

/// Observability capability injected into the segmentation engine.
///
/// Default methods are no-ops so fakes only implement what they assert on.
pub trait EngineEvents: Send + Sync {
    fn attempt_started(&self, _index: usize, _name: &str, _strategy: StrategyKind) {}

    fn attempt_failed(&self, _index: usize, _name: &str, _strategy: StrategyKind, _error: &str) {}

    fn segment_completed(&self, _index: usize, _name: &str, _path: &Path) {}

    /// Destination already existed; no work was done
    fn segment_skipped(&self, _index: usize, _name: &str, _path: &Path) {}

    fn segment_failed(&self, _index: usize, _name: &str, _error: &str) {}

    /// Incremental tool progress, best effort only
    fn tool_progress(&self, _index: usize, _percent: f32) {}
}

/// Production event sink backed by the `tracing` macros
pub struct TracingEvents;

impl EngineEvents for TracingEvents {
    fn attempt_started(&self, index: usize, name: &str, strategy: StrategyKind) {
        tracing::info!(index, name, %strategy, "starting segment attempt");
    }

    fn attempt_failed(&self, index: usize, name: &str, strategy: StrategyKind, error: &str) {
        tracing::warn!(index, name, %strategy, error, "segment attempt failed");
    }

    fn segment_completed(&self, index: usize, name: &str, path: &Path) {
        tracing::info!(index, name, path = %path.display(), "segment completed");
    }

    fn segment_skipped(&self, index: usize, name: &str, path: &Path) {
        tracing::info!(index, name, path = %path.display(), "destination exists, skipping");
    }

    fn segment_failed(&self, index: usize, name: &str, error: &str) {
        tracing::error!(index, name, error, "segment failed after all strategies");
    }

    fn tool_progress(&self, index: usize, percent: f32) {
        tracing::debug!(index, percent, "tool progress");
    }
}
