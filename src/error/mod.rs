//! Error handling module for SlicerX

use thiserror::Error;

use crate::engine::SegmentFailure;

/// Main error type for SlicerX operations
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS, MM:SS, or seconds")]
    InvalidTimeFormat { time: String },

    /// A single segment with a non-positive computed duration
    #[error("Invalid segment {name} (index {index}): {reason}")]
    InvalidSegment {
        index: usize,
        name: String,
        reason: String,
    },

    /// Output container format outside the closed set
    #[error("Unsupported output format: {value}. Valid formats: mp4, mkv, webm, ts")]
    UnsupportedFormat { value: String },

    /// Quality preset outside the closed set
    #[error("Unsupported quality preset: {value}. Valid presets: high, medium, low")]
    UnsupportedQuality { value: String },

    /// External media tool exited non-zero or emitted a fatal diagnostic
    #[error("Media tool invocation failed: {message}")]
    ToolInvocation { message: String },

    /// External tool binary could not be spawned at all
    #[error("Failed to launch {tool}: {message}")]
    ToolNotFound { tool: String, message: String },

    /// Download failure
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Chapter/metadata probing failure
    #[error("Failed to probe {url}: {message}")]
    Probe { url: String, message: String },

    /// Progress file could not be read or persisted
    #[error("Progress file error: {message}")]
    Progress { message: String },

    /// Batch description file is malformed
    #[error("Invalid batch file {path}: {message}")]
    InvalidBatchFile { path: String, message: String },

    /// Configuration file error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// One or more videos of a batch run failed
    #[error("{failed} video(s) failed: {detail}")]
    BatchFailed { failed: usize, detail: String },

    /// One or more segments of a video failed after all strategies
    #[error("{}", format_segment_failures(failures))]
    SegmentationFailed { failures: Vec<SegmentFailure> },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for SlicerX operations
pub type SlicerResult<T> = std::result::Result<T, SlicerError>;

fn format_segment_failures(failures: &[SegmentFailure]) -> String {
    let details: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    format!(
        "{} segment(s) failed: {}",
        failures.len(),
        details.join("; ")
    )
}
