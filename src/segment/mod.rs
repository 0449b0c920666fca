//! Segment specifications and normalization
//!
//! Segments arrive from configuration (JSON segment lists, batch files, or
//! chapter detection) and may be arbitrarily incomplete. Normalization runs
//! exactly once at the top of the pipeline so everything downstream can
//! assume fully-populated values.

use serde::{Deserialize, Serialize};

/// Sentinel end timestamp applied when a segment omits its end.
///
/// Policy: an overlong segment is preferred over aborting the whole batch
/// for one malformed entry.
pub const FALLBACK_END: &str = "23:59:59";

/// A requested cut as read from configuration. Immutable once read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    /// Display label; empty or missing names get a generated placeholder
    #[serde(default)]
    pub name: Option<String>,
    /// Start timestamp (`HH:MM:SS`, `MM:SS`, or seconds)
    #[serde(default)]
    pub start: Option<String>,
    /// End timestamp; missing ends fall back to a far-future sentinel
    #[serde(default)]
    pub end: Option<String>,
}

impl Segment {
    pub fn new(name: &str, start: &str, end: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }
}

/// A segment with every field populated and the name filesystem-safe.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSegment {
    pub name: String,
    pub start: String,
    pub end: String,
    /// True when the sentinel end was substituted for a missing end time
    pub end_defaulted: bool,
}

impl NormalizedSegment {
    /// Normalize a raw segment. Never fails: missing fields get defaults and
    /// the name is reduced to a filesystem-safe token.
    pub fn from_spec(segment: &Segment, index: usize) -> Self {
        let raw_name = segment
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let name = match raw_name.map(sanitize_name) {
            Some(sanitized) if !sanitized.is_empty() => sanitized,
            _ => format!("segment_{}", index + 1),
        };

        let start = segment
            .start
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("00:00:00")
            .to_string();

        let (end, end_defaulted) = match segment
            .end
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            Some(end) => (end.to_string(), false),
            None => (FALLBACK_END.to_string(), true),
        };

        Self {
            name,
            start,
            end,
            end_defaulted,
        }
    }
}

/// Reduce a display name to a filesystem-safe token: keep word characters,
/// whitespace, and hyphens, then collapse whitespace runs to single
/// underscores.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("_")
}
