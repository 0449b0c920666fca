//! Output planning: container formats, quality presets, and the ordered
//! fallback chain of cutting strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SlicerError;

pub mod strategy;

pub use strategy::output_args;

/// Output container format. Closed set; anything else is rejected at the
/// parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Mkv,
    Webm,
    Ts,
}

impl OutputFormat {
    /// File extension for destination paths
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Webm => "webm",
            OutputFormat::Ts => "ts",
        }
    }

    /// WebM sources typically carry codecs that are not legal in the
    /// container without transcoding, so stream copy is never attempted.
    pub fn supports_stream_copy(&self) -> bool {
        !matches!(self, OutputFormat::Webm)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Mp4
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SlicerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4),
            "mkv" => Ok(OutputFormat::Mkv),
            "webm" => Ok(OutputFormat::Webm),
            "ts" => Ok(OutputFormat::Ts),
            _ => Err(SlicerError::UnsupportedFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Encoding quality preset. Only meaningful on the re-encode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Medium
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        };
        f.write_str(label)
    }
}

impl FromStr for Quality {
    type Err = SlicerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            _ => Err(SlicerError::UnsupportedQuality {
                value: value.to_string(),
            }),
        }
    }
}

/// Request-scoped segmentation options. Immutable for one segmentation call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SegmentOptions {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub force_encode: bool,
    #[serde(default)]
    pub audio_only: bool,
}

/// Strategy kind for one attempt on one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Re-mux source packets without re-encoding
    StreamCopy,
    /// Decode and re-compress, allowing arbitrary cut points
    Reencode,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::StreamCopy => f.write_str("stream-copy"),
            StrategyKind::Reencode => f.write_str("re-encode"),
        }
    }
}

/// One entry of the fallback chain: a strategy and the concrete tool
/// arguments it uses.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub args: Vec<String>,
}

/// Build the ordered attempt chain for one segment.
///
/// The chain is the fallback order as a data structure: `[copy, re-encode]`
/// normally, re-encode alone for webm, forced encoding, or audio-only output
/// (stream copy would keep the video track).
pub fn attempt_chain(options: &SegmentOptions) -> Vec<Strategy> {
    let mut chain = Vec::with_capacity(2);

    if !options.force_encode && !options.audio_only && options.format.supports_stream_copy() {
        chain.push(Strategy {
            kind: StrategyKind::StreamCopy,
            args: output_args(options.format, options.quality, true, options.audio_only),
        });
    }

    chain.push(Strategy {
        kind: StrategyKind::Reencode,
        args: output_args(options.format, options.quality, false, options.audio_only),
    });

    chain
}
