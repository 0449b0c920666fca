//! SlicerX video segmenter library
//!
//! Downloads remote videos and cuts them into timestamped sub-clips using an
//! external ffmpeg binary. Cutting attempts stream copy first and falls back
//! to re-encoding when the copy fails at non-keyframe boundaries; batch runs
//! persist per-video progress so interrupted runs resume without redoing
//! completed work.

pub mod adapters;
pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod progress;
pub mod segment;
pub mod utils;

// Re-export commonly used types
pub use engine::{SegmentFailure, SegmentOutcome, SegmentationEngine, SegmentationRun};
pub use error::{SlicerError, SlicerResult};
pub use planner::{OutputFormat, Quality, SegmentOptions};
pub use segment::{NormalizedSegment, Segment};
