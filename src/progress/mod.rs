//! Persisted batch progress
//!
//! One JSON file records which videos finished and which failed, so an
//! interrupted batch run can resume without redoing completed videos. Every
//! mark is written durably before returning: the new state goes to a
//! temporary file in the same directory and is renamed over the old one.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SlicerError, SlicerResult};

/// A video that failed processing, with its last error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedVideo {
    pub id: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressState {
    completed: BTreeSet<String>,
    failed: Vec<FailedVideo>,
}

/// Durable, resumable progress tracker for batch runs
pub struct ProgressTracker {
    path: PathBuf,
    state: ProgressState,
}

impl ProgressTracker {
    /// Load existing progress from `path`, or start empty if the file does
    /// not exist yet.
    pub fn load_or_default(path: &Path) -> SlicerResult<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| SlicerError::Progress {
                message: format!("corrupt progress file {}: {}", path.display(), e),
            })?
        } else {
            ProgressState::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.state.completed.contains(id)
    }

    pub fn completed_count(&self) -> usize {
        self.state.completed.len()
    }

    pub fn failed(&self) -> &[FailedVideo] {
        &self.state.failed
    }

    /// Record a video as completed. Idempotent; clears any stale failure
    /// entry for the same id. Persisted durably before returning.
    pub fn mark_completed(&mut self, id: &str) -> SlicerResult<()> {
        self.state.completed.insert(id.to_string());
        self.state.failed.retain(|f| f.id != id);
        self.persist()
    }

    /// Record a video as failed. Idempotent per id; a repeat failure
    /// replaces the previous error text. Persisted durably before returning.
    pub fn mark_failed(&mut self, id: &str, error: &str) -> SlicerResult<()> {
        self.state.failed.retain(|f| f.id != id);
        self.state.failed.push(FailedVideo {
            id: id.to_string(),
            error: error.to_string(),
            failed_at: Utc::now(),
        });
        self.persist()
    }

    fn persist(&self) -> SlicerResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(&self.state)?;
        let temp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(temp.path(), content)?;
        temp.persist(&self.path).map_err(|e| SlicerError::Progress {
            message: format!("failed to persist {}: {}", self.path.display(), e),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tracker_in(dir: &TempDir) -> ProgressTracker {
        ProgressTracker::load_or_default(&dir.path().join("progress.json")).unwrap()
    }

    #[test]
    fn starts_empty_without_file() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker_in(&dir);
        assert_eq!(tracker.completed_count(), 0);
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn marks_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        let mut tracker = ProgressTracker::load_or_default(&path).unwrap();
        tracker.mark_completed("video-a").unwrap();
        tracker.mark_failed("video-b", "boom").unwrap();

        let reloaded = ProgressTracker::load_or_default(&path).unwrap();
        assert!(reloaded.is_completed("video-a"));
        assert!(!reloaded.is_completed("video-b"));
        assert_eq!(reloaded.failed().len(), 1);
        assert_eq!(reloaded.failed()[0].error, "boom");
    }

    #[test]
    fn mark_completed_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker_in(&dir);
        tracker.mark_completed("v").unwrap();
        tracker.mark_completed("v").unwrap();
        assert_eq!(tracker.completed_count(), 1);
    }

    #[test]
    fn completion_clears_previous_failure() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker_in(&dir);
        tracker.mark_failed("v", "first try").unwrap();
        tracker.mark_completed("v").unwrap();
        assert!(tracker.is_completed("v"));
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn repeat_failure_replaces_error() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker_in(&dir);
        tracker.mark_failed("v", "first").unwrap();
        tracker.mark_failed("v", "second").unwrap();
        assert_eq!(tracker.failed().len(), 1);
        assert_eq!(tracker.failed()[0].error, "second");
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ProgressTracker::load_or_default(&path).is_err());
    }
}
