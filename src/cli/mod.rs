//! CLI module for SlicerX
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// SlicerX video segmenter
///
/// Downloads remote videos and cuts them into timestamped sub-clips with
/// stream-copy-first cutting, re-encode fallback, and resumable batch runs.
#[derive(Parser)]
#[command(name = "slicerx")]
#[command(about = "SlicerX - cut videos into timestamped sub-clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Cut an already-downloaded video file into sub-clips
    Segment(args::SegmentArgs),
    /// Download and segment every video in a batch file, with resume
    Batch(args::BatchArgs),
}
