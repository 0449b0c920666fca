//! Application configuration
//!
//! Configuration is resolved once in the CLI layer into an immutable
//! [`AppConfig`] and passed explicitly to the components that need it. The
//! engine itself never reads ambient state. An optional TOML file supplies
//! defaults that CLI flags override.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{SlicerError, SlicerResult};
use crate::planner::{OutputFormat, Quality, SegmentOptions};

/// Immutable run configuration, constructed once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the ffmpeg binary
    pub ffmpeg: PathBuf,
    /// Path to the yt-dlp binary (batch mode only)
    pub ytdlp: PathBuf,
    /// Root directory for downloads, sub-clips, and the progress file
    pub out_dir: PathBuf,
    /// Number of videos processed concurrently in one batch group
    pub concurrency: usize,
    /// Reprocess videos the progress file already marks completed
    pub force: bool,
    /// Segmentation options applied to every video in the run
    pub options: SegmentOptions,
}

impl AppConfig {
    pub fn progress_file(&self) -> PathBuf {
        self.out_dir.join("progress.json")
    }

    /// Default batch concurrency: bounded so concurrent ffmpeg processes do
    /// not oversubscribe the machine.
    pub fn default_concurrency() -> usize {
        num_cpus::get().clamp(1, 4)
    }
}

/// Optional on-disk defaults, TOML
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
    #[serde(default)]
    pub ytdlp: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> SlicerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SlicerError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| SlicerError::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
        })
    }

    /// Parse the file's format default, if present
    pub fn format(&self) -> SlicerResult<Option<OutputFormat>> {
        self.format
            .as_deref()
            .map(OutputFormat::from_str)
            .transpose()
    }

    /// Parse the file's quality default, if present
    pub fn quality(&self) -> SlicerResult<Option<Quality>> {
        self.quality.as_deref().map(Quality::from_str).transpose()
    }
}
