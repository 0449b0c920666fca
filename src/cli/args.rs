//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments shared by both commands that feed the segmentation engine.
///
/// Flags the user leaves unset stay `None` here so the command layer can
/// fall back to the config file, then to the built-in default.
#[derive(Args, Debug)]
pub struct CutOptions {
    /// Output container format (mp4, mkv, webm, ts) [default: mp4]
    #[arg(long)]
    pub format: Option<String>,

    /// Encoding quality preset (high, medium, low) [default: medium]
    #[arg(long)]
    pub quality: Option<String>,

    /// Always re-encode, never attempt stream copy
    #[arg(long)]
    pub force_encode: bool,

    /// Drop video and produce audio-only clips
    #[arg(long)]
    pub audio_only: bool,

    /// Path to the ffmpeg binary [default: ffmpeg]
    #[arg(long, env = "SLICERX_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Optional TOML defaults file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the segment command
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON file containing the segment list
    #[arg(short, long)]
    pub segments: PathBuf,

    /// Output directory for the sub-clips
    #[arg(short, long, default_value = "clips")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub cut: CutOptions,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON batch file listing videos and their segments
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output root for downloads, sub-clips, and the progress file
    #[arg(short, long, default_value = "clips")]
    pub out_dir: PathBuf,

    /// Number of videos processed concurrently per group
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Reprocess videos already marked completed
    #[arg(long)]
    pub force: bool,

    /// Path to the yt-dlp binary [default: yt-dlp]
    #[arg(long, env = "SLICERX_YTDLP")]
    pub ytdlp: Option<PathBuf>,

    #[command(flatten)]
    pub cut: CutOptions,
}
