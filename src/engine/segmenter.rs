//! Per-segment fallback state machine
//!
//! Segments are processed strictly in input order, one at a time. Each
//! segment walks an ordered attempt chain (stream copy, then re-encode)
//! until one attempt succeeds or the chain is exhausted. Each attempt is a
//! single external tool invocation; a failed attempt's partial output is
//! removed before the next attempt so it can never satisfy a later
//! idempotence check.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::engine::{
    AttemptRecord, CompletionKind, SegmentFailure, SegmentOutcome, SegmentationRun,
};
use crate::error::{SlicerError, SlicerResult};
use crate::planner::{attempt_chain, SegmentOptions, Strategy, StrategyKind};
use crate::ports::{CutRequest, EngineEvents, MediaToolPort};
use crate::segment::{NormalizedSegment, Segment};
use crate::utils::time::timestamp_to_seconds;

/// Segmentation engine: orchestrates the attempt sequence for every segment
/// of one video.
pub struct SegmentationEngine<'a> {
    tool: &'a dyn MediaToolPort,
    events: &'a dyn EngineEvents,
}

impl<'a> SegmentationEngine<'a> {
    pub fn new(tool: &'a dyn MediaToolPort, events: &'a dyn EngineEvents) -> Self {
        Self { tool, events }
    }

    /// Cut every segment out of `input`, writing to `out_dir`.
    ///
    /// Returns the output path list (one per segment, input order) when all
    /// segments succeed. If any segment fails the whole call fails with an
    /// aggregate error naming every failed segment, after all segments have
    /// been attempted.
    pub async fn segment_all(
        &self,
        input: &Path,
        out_dir: &Path,
        segments: &[Segment],
        options: &SegmentOptions,
    ) -> SlicerResult<Vec<PathBuf>> {
        let run = self.run(input, out_dir, segments, options).await?;
        if run.all_succeeded() {
            Ok(run.completed_paths())
        } else {
            Err(SlicerError::SegmentationFailed {
                failures: run.failures(),
            })
        }
    }

    /// Like [`segment_all`](Self::segment_all) but exposes the per-index
    /// outcome report, letting callers recover partial results.
    pub async fn run(
        &self,
        input: &Path,
        out_dir: &Path,
        segments: &[Segment],
        options: &SegmentOptions,
    ) -> SlicerResult<SegmentationRun> {
        if !input.exists() {
            return Err(SlicerError::InputFileNotFound {
                path: input.display().to_string(),
            });
        }
        std::fs::create_dir_all(out_dir)?;

        let mut outcomes = Vec::with_capacity(segments.len());
        let mut taken_names = HashSet::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let mut normalized = NormalizedSegment::from_spec(segment, index);
            normalized.name = deduplicate_name(normalized.name, &mut taken_names);
            let outcome = self
                .process_segment(input, out_dir, normalized, index, options)
                .await;
            outcomes.push(outcome);
        }

        Ok(SegmentationRun { outcomes })
    }

    async fn process_segment(
        &self,
        input: &Path,
        out_dir: &Path,
        normalized: NormalizedSegment,
        index: usize,
        options: &SegmentOptions,
    ) -> SegmentOutcome {
        if normalized.end_defaulted {
            tracing::warn!(
                index,
                name = %normalized.name,
                "segment end missing, using far-future sentinel"
            );
        }

        let (start_seconds, duration_seconds) = match segment_window(&normalized, index) {
            Ok(window) => window,
            Err(error) => {
                let failure = SegmentFailure {
                    index,
                    name: normalized.name.clone(),
                    attempts: Vec::new(),
                    last_error: error.to_string(),
                };
                self.events
                    .segment_failed(index, &normalized.name, &failure.last_error);
                return SegmentOutcome::Failed(failure);
            }
        };

        let destination = out_dir.join(format!(
            "{}.{}",
            normalized.name,
            options.format.extension()
        ));

        // Resumability contract: an existing destination is accepted as-is
        // and the tool is never re-invoked for it.
        if destination.exists() {
            self.events
                .segment_skipped(index, &normalized.name, &destination);
            return SegmentOutcome::Completed {
                index,
                name: normalized.name,
                path: destination,
                via: CompletionKind::AlreadyPresent,
            };
        }

        let chain = attempt_chain(options);
        let mut attempts = Vec::with_capacity(chain.len());

        for strategy in &chain {
            self.events
                .attempt_started(index, &normalized.name, strategy.kind);

            match self
                .invoke_tool(index, input, start_seconds, duration_seconds, strategy, &destination)
                .await
            {
                Ok(()) => {
                    self.events
                        .segment_completed(index, &normalized.name, &destination);
                    return SegmentOutcome::Completed {
                        index,
                        name: normalized.name,
                        path: destination,
                        via: completion_kind(strategy.kind),
                    };
                }
                Err(error) => {
                    let message = error.to_string();
                    self.events
                        .attempt_failed(index, &normalized.name, strategy.kind, &message);
                    discard_partial_output(&destination);
                    attempts.push(AttemptRecord {
                        strategy: strategy.kind,
                        error: message,
                    });
                }
            }
        }

        let last_error = attempts
            .last()
            .map(|a| a.error.clone())
            .unwrap_or_else(|| "no strategies attempted".to_string());
        let failure = SegmentFailure {
            index,
            name: normalized.name.clone(),
            attempts,
            last_error,
        };
        self.events
            .segment_failed(index, &normalized.name, &failure.last_error);
        SegmentOutcome::Failed(failure)
    }

    async fn invoke_tool(
        &self,
        index: usize,
        input: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        strategy: &Strategy,
        destination: &Path,
    ) -> SlicerResult<()> {
        let request = CutRequest {
            segment_index: index,
            input: input.to_path_buf(),
            start_seconds,
            duration_seconds,
            output_args: strategy.args.clone(),
            destination: destination.to_path_buf(),
        };
        self.tool.cut(&request).await
    }
}

/// Keep sanitized names unique within one run so two segments never write
/// the same destination. Suffixing is deterministic in input order, which
/// keeps re-runs of the same segment list resumable.
fn deduplicate_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{name}_{counter}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Parse the normalized window into (start, duration) seconds, rejecting
/// non-positive durations before any tool invocation.
fn segment_window(normalized: &NormalizedSegment, index: usize) -> SlicerResult<(f64, f64)> {
    let start = timestamp_to_seconds(&normalized.start)?;
    let end = timestamp_to_seconds(&normalized.end)?;
    let duration = end - start;
    if duration <= 0.0 {
        return Err(SlicerError::InvalidSegment {
            index,
            name: normalized.name.clone(),
            reason: format!(
                "non-positive duration ({:.3}s): start {} is not before end {}",
                duration, normalized.start, normalized.end
            ),
        });
    }
    Ok((start, duration))
}

fn completion_kind(strategy: StrategyKind) -> CompletionKind {
    match strategy {
        StrategyKind::StreamCopy => CompletionKind::StreamCopied,
        StrategyKind::Reencode => CompletionKind::Reencoded,
    }
}

/// A failed attempt must not leave a partial file behind as a false success
/// marker for the idempotence check.
fn discard_partial_output(destination: &Path) {
    if destination.exists() {
        if let Err(error) = std::fs::remove_file(destination) {
            tracing::warn!(
                path = %destination.display(),
                %error,
                "failed to remove partial output"
            );
        }
    }
}
