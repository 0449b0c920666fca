//! Output-side tool argument selection
//!
//! Pure lookup over the closed format/quality enums. The stream-copy path
//! re-muxes packets verbatim with per-container fixups; the re-encode path
//! selects codec, constant-quality factor, preset, and audio settings from a
//! quality x format matrix.

use crate::planner::{OutputFormat, Quality};

/// Encoder settings for one cell of the re-encode matrix
struct EncodeSettings {
    video_codec: &'static str,
    crf: u32,
    preset: &'static str,
    audio_codec: &'static str,
    audio_bitrate: &'static str,
}

/// Select the ordered output-side tool arguments for one attempt.
///
/// `use_stream_copy` must not be requested for webm; the attempt chain never
/// does, and this function asserts the invariant in debug builds.
pub fn output_args(
    format: OutputFormat,
    quality: Quality,
    use_stream_copy: bool,
    audio_only: bool,
) -> Vec<String> {
    if use_stream_copy {
        debug_assert!(
            format.supports_stream_copy(),
            "stream copy requested for {format}"
        );
        return copy_args(format);
    }

    if audio_only {
        return audio_only_args(format);
    }

    encode_args(format, quality)
}

fn copy_args(format: OutputFormat) -> Vec<String> {
    let mut args = to_args(&["-c", "copy"]);
    match format {
        OutputFormat::Mp4 => {
            // Front-load the moov atom and clamp negative timestamps so the
            // copied clip starts clean and plays before fully downloaded.
            args.extend(to_args(&[
                "-movflags",
                "+faststart",
                "-avoid_negative_ts",
                "make_zero",
            ]));
        }
        OutputFormat::Ts => {
            // Re-send PAT/PMT at boundaries for players joining mid-stream.
            args.extend(to_args(&["-mpegts_flags", "+resend_headers"]));
        }
        OutputFormat::Mkv => {}
        OutputFormat::Webm => unreachable!("webm is exempt from stream copy"),
    }
    args
}

fn audio_only_args(format: OutputFormat) -> Vec<String> {
    let codec = match format {
        OutputFormat::Mp4 | OutputFormat::Ts => "aac",
        OutputFormat::Mkv | OutputFormat::Webm => "libopus",
    };
    let mut args = to_args(&["-vn", "-c:a", codec, "-b:a", "128k"]);
    if format == OutputFormat::Mp4 {
        args.extend(to_args(&["-movflags", "+faststart"]));
    }
    args
}

fn encode_args(format: OutputFormat, quality: Quality) -> Vec<String> {
    if format == OutputFormat::Webm {
        // Pure-CRF VP9 is impractically slow for this tool's use; use a
        // fixed target bitrate per quality tier instead.
        let (bitrate, cpu_used) = match quality {
            Quality::High => ("2M", "1"),
            Quality::Medium => ("1M", "2"),
            Quality::Low => ("500k", "4"),
        };
        return to_args(&[
            "-c:v",
            "libvpx-vp9",
            "-b:v",
            bitrate,
            "-deadline",
            "good",
            "-cpu-used",
            cpu_used,
            "-c:a",
            "libopus",
            "-b:a",
            "128k",
        ]);
    }

    let settings = encode_matrix(format, quality);
    let mut args = to_args(&[
        "-c:v",
        settings.video_codec,
        "-crf",
        &settings.crf.to_string(),
        "-preset",
        settings.preset,
        "-c:a",
        settings.audio_codec,
        "-b:a",
        settings.audio_bitrate,
    ]);

    match format {
        OutputFormat::Mp4 => args.extend(to_args(&["-movflags", "+faststart"])),
        OutputFormat::Ts => args.extend(to_args(&["-mpegts_flags", "+resend_headers"])),
        _ => {}
    }

    args
}

fn encode_matrix(format: OutputFormat, quality: Quality) -> EncodeSettings {
    let (crf, preset, audio_bitrate) = match quality {
        Quality::High => (18, "slow", "192k"),
        Quality::Medium => (23, "medium", "128k"),
        Quality::Low => (28, "fast", "96k"),
    };

    let audio_codec = match format {
        OutputFormat::Mp4 | OutputFormat::Ts => "aac",
        OutputFormat::Mkv => "libopus",
        OutputFormat::Webm => unreachable!("webm handled separately"),
    };

    EncodeSettings {
        video_codec: "libx264",
        crf,
        preset,
        audio_codec,
        audio_bitrate,
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn copy_args_for_mp4_fix_container_and_timestamps() {
        let args = output_args(OutputFormat::Mp4, Quality::Medium, true, false);
        assert!(has_pair(&args, "-c", "copy"));
        assert!(has_pair(&args, "-movflags", "+faststart"));
        assert!(has_pair(&args, "-avoid_negative_ts", "make_zero"));
    }

    #[test]
    fn copy_args_for_ts_resend_headers() {
        let args = output_args(OutputFormat::Ts, Quality::Medium, true, false);
        assert!(has_pair(&args, "-c", "copy"));
        assert!(has_pair(&args, "-mpegts_flags", "+resend_headers"));
    }

    #[test]
    fn copy_args_for_mkv_are_bare_copy() {
        let args = output_args(OutputFormat::Mkv, Quality::Medium, true, false);
        assert_eq!(args, vec!["-c", "copy"]);
    }

    #[test]
    fn audio_only_uses_format_specific_codec() {
        let mp4 = output_args(OutputFormat::Mp4, Quality::Medium, false, true);
        assert!(mp4.contains(&"-vn".to_string()));
        assert!(has_pair(&mp4, "-c:a", "aac"));
        assert!(has_pair(&mp4, "-b:a", "128k"));

        let mkv = output_args(OutputFormat::Mkv, Quality::Medium, false, true);
        assert!(has_pair(&mkv, "-c:a", "libopus"));

        let webm = output_args(OutputFormat::Webm, Quality::Low, false, true);
        assert!(has_pair(&webm, "-c:a", "libopus"));
    }

    #[test]
    fn encode_matrix_varies_with_quality() {
        let high = output_args(OutputFormat::Mp4, Quality::High, false, false);
        assert!(has_pair(&high, "-c:v", "libx264"));
        assert!(has_pair(&high, "-crf", "18"));
        assert!(has_pair(&high, "-preset", "slow"));
        assert!(has_pair(&high, "-b:a", "192k"));

        let low = output_args(OutputFormat::Mp4, Quality::Low, false, false);
        assert!(has_pair(&low, "-crf", "28"));
        assert!(has_pair(&low, "-preset", "fast"));
        assert!(has_pair(&low, "-b:a", "96k"));
    }

    #[test]
    fn webm_encode_is_vp9_opus_with_target_bitrate() {
        let args = output_args(OutputFormat::Webm, Quality::Medium, false, false);
        assert!(has_pair(&args, "-c:v", "libvpx-vp9"));
        assert!(has_pair(&args, "-b:v", "1M"));
        assert!(has_pair(&args, "-c:a", "libopus"));
        assert!(!args.iter().any(|a| a == "-crf"));
    }

    #[test]
    fn ts_encode_keeps_header_retransmission() {
        let args = output_args(OutputFormat::Ts, Quality::Medium, false, false);
        assert!(has_pair(&args, "-mpegts_flags", "+resend_headers"));
        assert!(has_pair(&args, "-c:a", "aac"));
    }
}
