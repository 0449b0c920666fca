//! Time parsing and formatting utilities

use crate::error::{SlicerError, SlicerResult};

/// Parse a timestamp string to seconds.
///
/// Accepted formats: `HH:MM:SS`, `MM:SS`, or bare seconds (float). Fractional
/// seconds are allowed in the last component.
pub fn timestamp_to_seconds(time_str: &str) -> SlicerResult<f64> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(SlicerError::InvalidTimeFormat {
            time: time_str.to_string(),
        });
    }

    let parts: Vec<&str> = time_str.split(':').collect();
    let parse_part = |part: &str| -> SlicerResult<f64> {
        part.trim()
            .parse::<f64>()
            .map_err(|_| SlicerError::InvalidTimeFormat {
                time: time_str.to_string(),
            })
    };

    match parts.len() {
        1 => parse_part(parts[0]),
        2 => {
            let minutes = parse_part(parts[0])?;
            let seconds = parse_part(parts[1])?;
            Ok(minutes * 60.0 + seconds)
        }
        3 => {
            let hours = parse_part(parts[0])?;
            let minutes = parse_part(parts[1])?;
            let seconds = parse_part(parts[2])?;
            Ok(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => Err(SlicerError::InvalidTimeFormat {
            time: time_str.to_string(),
        }),
    }
}

/// Format seconds as a zero-padded `HH:MM:SS` string.
///
/// Sub-second remainders are floored.
pub fn seconds_to_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Compute the duration in seconds between two timestamp strings.
///
/// The result may be zero or negative; callers decide whether that is an
/// error (the segmentation engine treats it as one).
pub fn calculate_duration(start: &str, end: &str) -> SlicerResult<f64> {
    let start_secs = timestamp_to_seconds(start)?;
    let end_secs = timestamp_to_seconds(end)?;
    Ok(end_secs - start_secs)
}
