//! Integration tests for the segmentation engine's fallback state machine

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use slicerx_cli::engine::{CompletionKind, SegmentOutcome, SegmentationEngine};
use slicerx_cli::error::{SlicerError, SlicerResult};
use slicerx_cli::planner::{OutputFormat, Quality, SegmentOptions, StrategyKind};
use slicerx_cli::ports::{CutRequest, EngineEvents, MediaToolPort};
use slicerx_cli::segment::Segment;

// Test utilities

/// Scripted media tool double: records every invocation and follows a fixed
/// behavior instead of spawning a process.
struct MockTool {
    calls: Mutex<Vec<CutRequest>>,
    behavior: Behavior,
}

enum Behavior {
    /// Every attempt succeeds and writes the destination file
    Succeed,
    /// Stream-copy attempts fail (leaving a partial file); re-encode succeeds
    FailCopy,
    /// Every attempt fails with the given diagnostic
    FailAll(&'static str),
}

impl MockTool {
    fn new(behavior: Behavior) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            behavior,
        }
    }

    fn calls(&self) -> Vec<CutRequest> {
        self.calls.lock().unwrap().clone()
    }
}

fn is_copy(request: &CutRequest) -> bool {
    request
        .output_args
        .windows(2)
        .any(|w| w[0] == "-c" && w[1] == "copy")
}

#[async_trait]
impl MediaToolPort for MockTool {
    async fn cut(&self, request: &CutRequest) -> SlicerResult<()> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.behavior {
            Behavior::Succeed => {
                std::fs::write(&request.destination, b"clip")?;
                Ok(())
            }
            Behavior::FailCopy if is_copy(request) => {
                // Simulate the tool dying mid-write
                std::fs::write(&request.destination, b"partial")?;
                Err(SlicerError::ToolInvocation {
                    message: "moov atom not found".to_string(),
                })
            }
            Behavior::FailCopy => {
                std::fs::write(&request.destination, b"clip")?;
                Ok(())
            }
            Behavior::FailAll(message) => Err(SlicerError::ToolInvocation {
                message: message.to_string(),
            }),
        }
    }
}

/// Event sink that records what the engine reports
#[derive(Default)]
struct RecordingEvents {
    events: Mutex<Vec<String>>,
}

impl RecordingEvents {
    fn recorded(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl EngineEvents for RecordingEvents {
    fn attempt_started(&self, index: usize, _name: &str, strategy: StrategyKind) {
        self.events
            .lock()
            .unwrap()
            .push(format!("attempt:{index}:{strategy}"));
    }

    fn segment_completed(&self, index: usize, _name: &str, _path: &Path) {
        self.events.lock().unwrap().push(format!("done:{index}"));
    }

    fn segment_skipped(&self, index: usize, _name: &str, _path: &Path) {
        self.events.lock().unwrap().push(format!("skipped:{index}"));
    }

    fn segment_failed(&self, index: usize, _name: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("failed:{index}"));
    }
}

struct Fixture {
    dir: TempDir,
    input: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("video.mp4");
        std::fs::write(&input, b"fake video data").unwrap();
        Self { dir, input }
    }

    fn out_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("clips")
    }
}

fn two_segments() -> Vec<Segment> {
    vec![
        Segment::new("Intro", "00:00:00", "00:01:30"),
        Segment::new("Main", "00:01:30", "00:10:00"),
    ]
}

// Scenario tests

#[tokio::test]
async fn scenario_a_default_options_stream_copies_both_segments() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &two_segments(),
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], fixture.out_dir().join("Intro.mp4"));
    assert_eq!(paths[1], fixture.out_dir().join("Main.mp4"));
    assert!(paths.iter().all(|p| p.exists()));

    let calls = tool.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(is_copy));
    // Start offset and duration, never an absolute end
    assert_eq!(calls[0].start_seconds, 0.0);
    assert_eq!(calls[0].duration_seconds, 90.0);
    assert_eq!(calls[1].start_seconds, 90.0);
    assert_eq!(calls[1].duration_seconds, 510.0);
}

#[tokio::test]
async fn scenario_b_webm_reencodes_without_any_copy_attempt() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let options = SegmentOptions {
        format: OutputFormat::Webm,
        ..Default::default()
    };
    let paths = engine
        .segment_all(&fixture.input, &fixture.out_dir(), &two_segments(), &options)
        .await
        .unwrap();

    assert!(paths.iter().all(|p| p.extension().unwrap() == "webm"));
    let calls = tool.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| !is_copy(c)));
    assert!(calls.iter().all(|c| c
        .output_args
        .windows(2)
        .any(|w| w[0] == "-c:v" && w[1] == "libvpx-vp9")));
}

#[tokio::test]
async fn scenario_c_force_encode_uses_low_quality_settings_only() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let options = SegmentOptions {
        quality: Quality::Low,
        force_encode: true,
        ..Default::default()
    };
    engine
        .segment_all(&fixture.input, &fixture.out_dir(), &two_segments(), &options)
        .await
        .unwrap();

    let calls = tool.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| !is_copy(c)));
    assert!(calls.iter().all(|c| c
        .output_args
        .windows(2)
        .any(|w| w[0] == "-crf" && w[1] == "28")));
}

// Fallback determinism

#[tokio::test]
async fn copy_failure_triggers_exactly_one_reencode() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::FailCopy);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![Segment::new("Clip", "00:00:10", "00:00:20")];
    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    let calls = tool.calls();
    assert_eq!(calls.len(), 2);
    assert!(is_copy(&calls[0]));
    assert!(!is_copy(&calls[1]));
    assert!(paths[0].exists());
}

#[tokio::test]
async fn exhausted_attempts_report_strategies_and_last_error() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::FailAll("Invalid data found when processing input"));
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![Segment::new("Broken", "00:00:00", "00:00:10")];
    let error = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(tool.calls().len(), 2); // never more than two attempts
    let message = error.to_string();
    assert!(message.contains("stream-copy"));
    assert!(message.contains("re-encode"));
    assert!(message.contains("Invalid data found"));
}

#[tokio::test]
async fn failed_attempt_never_leaves_partial_output() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::FailAll("boom"));
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![Segment::new("Clip", "00:00:00", "00:00:10")];
    let run = engine
        .run(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert!(run.outcomes[0].is_failed());
    assert!(!fixture.out_dir().join("Clip.mp4").exists());
}

// Idempotence and resumability

#[tokio::test]
async fn existing_destinations_are_accepted_without_tool_calls() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let options = SegmentOptions::default();
    let segments = two_segments();

    let first = engine
        .segment_all(&fixture.input, &fixture.out_dir(), &segments, &options)
        .await
        .unwrap();
    assert_eq!(tool.calls().len(), 2);

    let second = engine
        .segment_all(&fixture.input, &fixture.out_dir(), &segments, &options)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(tool.calls().len(), 2); // no new invocations
    assert!(events
        .recorded()
        .iter()
        .filter(|e| e.starts_with("skipped:"))
        .count()
        .eq(&2));
}

#[tokio::test]
async fn resumed_run_reports_already_present_completion() {
    let fixture = Fixture::new();
    let out_dir = fixture.out_dir();
    std::fs::create_dir_all(&out_dir).unwrap();
    std::fs::write(out_dir.join("Intro.mp4"), b"previous run").unwrap();

    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let run = engine
        .run(
            &fixture.input,
            &out_dir,
            &two_segments(),
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    match &run.outcomes[0] {
        SegmentOutcome::Completed { via, .. } => {
            assert_eq!(*via, CompletionKind::AlreadyPresent)
        }
        other => panic!("expected completed outcome, got {other:?}"),
    }
    // Only the second segment needed the tool
    assert_eq!(tool.calls().len(), 1);
}

// Order preservation and per-segment isolation

#[tokio::test]
async fn failures_do_not_abort_sibling_segments() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    // Middle segment has a non-positive duration
    let segments = vec![
        Segment::new("First", "00:00:00", "00:01:00"),
        Segment::new("Backwards", "00:02:00", "00:01:30"),
        Segment::new("Last", "00:03:00", "00:04:00"),
    ];

    let run = engine
        .run(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.outcomes.len(), 3);
    assert!(!run.outcomes[0].is_failed());
    assert!(run.outcomes[1].is_failed());
    assert!(!run.outcomes[2].is_failed());

    // The invalid segment never reached the tool
    assert_eq!(tool.calls().len(), 2);

    // The aggregate call still fails overall
    let error = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(error.to_string().contains("Backwards"));
    assert!(fixture.out_dir().join("Last.mp4").exists());
}

#[tokio::test]
async fn nonpositive_duration_fails_before_any_tool_invocation() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![Segment::new("Zero", "00:02:00", "00:02:00")];
    let run = engine
        .run(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert!(run.outcomes[0].is_failed());
    assert!(tool.calls().is_empty());
}

#[tokio::test]
async fn segments_are_processed_in_input_order() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![
        Segment::new("Zeta", "00:05:00", "00:06:00"),
        Segment::new("Alpha", "00:00:00", "00:01:00"),
        Segment::new("Mid", "00:02:00", "00:03:00"),
    ];
    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_stem().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);

    let call_starts: Vec<f64> = tool.calls().iter().map(|c| c.start_seconds).collect();
    assert_eq!(call_starts, vec![300.0, 0.0, 120.0]);

    let call_indexes: Vec<usize> = tool.calls().iter().map(|c| c.segment_index).collect();
    assert_eq!(call_indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn audio_only_reencodes_with_video_dropped() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let options = SegmentOptions {
        audio_only: true,
        ..Default::default()
    };
    let segments = vec![Segment::new("Talk", "00:00:00", "00:01:00")];
    engine
        .segment_all(&fixture.input, &fixture.out_dir(), &segments, &options)
        .await
        .unwrap();

    // A copy attempt would keep the video track, so there is exactly one
    // invocation and it strips video.
    let calls = tool.calls();
    assert_eq!(calls.len(), 1);
    assert!(!is_copy(&calls[0]));
    assert!(calls[0].output_args.iter().any(|a| a == "-vn"));
}

// Normalization at the engine boundary

#[tokio::test]
async fn unnamed_segment_gets_placeholder_destination() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![
        Segment::new("First", "00:00:00", "00:00:10"),
        Segment::new("Second", "00:00:10", "00:00:20"),
        Segment {
            name: None,
            start: Some("00:00:20".to_string()),
            end: Some("00:00:30".to_string()),
        },
    ];
    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(paths[2], fixture.out_dir().join("segment_3.mp4"));
}

#[tokio::test]
async fn punctuated_names_are_sanitized_in_destinations() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let segments = vec![Segment::new("Intro: Part 1!", "00:00:00", "00:00:10")];
    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(paths[0], fixture.out_dir().join("Intro_Part_1.mp4"));
}

#[tokio::test]
async fn colliding_sanitized_names_get_distinct_destinations() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    // Both names sanitize to "Intro"
    let segments = vec![
        Segment::new("Intro:", "00:00:00", "00:00:10"),
        Segment::new("Intro!", "00:00:10", "00:00:20"),
    ];
    let paths = engine
        .segment_all(
            &fixture.input,
            &fixture.out_dir(),
            &segments,
            &SegmentOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(paths[0], fixture.out_dir().join("Intro.mp4"));
    assert_eq!(paths[1], fixture.out_dir().join("Intro_2.mp4"));
    // The second segment was actually cut, not skipped as already present
    assert_eq!(tool.calls().len(), 2);
}

#[tokio::test]
async fn ts_format_uses_literal_ts_extension() {
    let fixture = Fixture::new();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let options = SegmentOptions {
        format: OutputFormat::Ts,
        ..Default::default()
    };
    let segments = vec![Segment::new("Clip", "00:00:00", "00:00:10")];
    let paths = engine
        .segment_all(&fixture.input, &fixture.out_dir(), &segments, &options)
        .await
        .unwrap();

    assert_eq!(paths[0], fixture.out_dir().join("Clip.ts"));
}

#[tokio::test]
async fn missing_input_file_is_rejected_up_front() {
    let dir = TempDir::new().unwrap();
    let tool = MockTool::new(Behavior::Succeed);
    let events = RecordingEvents::default();
    let engine = SegmentationEngine::new(&tool, &events);

    let error = engine
        .segment_all(
            &dir.path().join("missing.mp4"),
            &dir.path().join("clips"),
            &two_segments(),
            &SegmentOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, SlicerError::InputFileNotFound { .. }));
    assert!(tool.calls().is_empty());
}
