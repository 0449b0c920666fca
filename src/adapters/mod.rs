//! Adapters - concrete implementations of the port contracts

pub mod exec_ffmpeg;
pub mod ytdlp;
