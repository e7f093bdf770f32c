// Session lifecycle tests: the Idle -> Recording -> Stopped state machine,
// the 1-second chunk cadence, the elapsed timer with its hard cap, and the
// teardown guarantees around stop(). All tests run on paused virtual time.

mod common;

use std::time::Duration;
use tokio::time::sleep;

use common::{
    audio_ready, drain_events, face_frames, recording_changes, synthetic_session, test_config,
};
use studymate_capture::{BehaviorSignal, CaptureEvent, FacialSignal, SessionState};

#[tokio::test(start_paused = true)]
async fn recording_auto_stops_at_max_duration() {
    let (session, mut events) = synthetic_session(test_config());

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);

    sleep(Duration::from_secs(181)).await;

    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.elapsed_seconds(), 180);

    let collected = drain_events(&mut events);
    assert_eq!(recording_changes(&collected), vec![true, false]);

    let blobs = audio_ready(&collected);
    assert_eq!(blobs.len(), 1);
    let duration = blobs[0].duration_seconds();
    assert!(
        (179.5..=180.5).contains(&duration),
        "blob covers the full recording, got {duration}s"
    );

    // A stop after the cap already fired changes nothing
    session.stop().await.unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.elapsed_seconds(), 180);
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_without_recording_is_a_no_op() {
    let (session, mut events) = synthetic_session(test_config());

    session.stop().await.unwrap();
    session.stop().await.unwrap();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.elapsed_seconds(), 0);
    assert!(drain_events(&mut events).is_empty());
    assert!(session.audio_chunks().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_is_not_reentrant() {
    let (session, mut events) = synthetic_session(test_config());

    session.start().await.unwrap();
    sleep(Duration::from_millis(2200)).await;

    // Second start while recording: no reset, no duplicate events
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(session.elapsed_seconds(), 2);
    assert_eq!(session.audio_chunks().await.len(), 2);

    session.stop().await.unwrap();

    let collected = drain_events(&mut events);
    assert_eq!(recording_changes(&collected), vec![true, false]);
    assert_eq!(audio_ready(&collected).len(), 1);
    assert_eq!(session.audio_chunks().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn blob_is_the_ordered_concatenation_of_chunks() {
    let config = test_config();
    let samples_per_frame =
        (config.constraints.sample_rate as u64 * config.constraints.frame_duration_ms / 1000)
            as usize;
    let (session, mut events) = synthetic_session(config);

    session.start().await.unwrap();
    // 3456ms: three whole-second slices plus an in-flight fragment, with no
    // frame landing exactly on the stop instant
    sleep(Duration::from_millis(3456)).await;
    session.stop().await.unwrap();

    let chunks = session.audio_chunks().await;
    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|c| !c.is_empty()));

    let collected = drain_events(&mut events);
    let blobs = audio_ready(&collected);
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].data, chunks.concat());

    // The sample stream is gapless: it matches the source ramp exactly
    let frames_delivered = 3456 / 90;
    let expected: Vec<i16> = (0..frames_delivered)
        .flat_map(|seq| {
            let base = (seq % 251) as i16;
            (0..samples_per_frame).map(move |i| base.wrapping_add((i % 97) as i16))
        })
        .collect();
    assert_eq!(blobs[0].samples(), expected);
}

#[tokio::test(start_paused = true)]
async fn stopped_session_records_again_with_fresh_chunks() {
    let (session, mut events) = synthetic_session(test_config());

    session.start().await.unwrap();
    sleep(Duration::from_millis(1500)).await;
    session.stop().await.unwrap();

    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.audio_chunks().await.len(), 2);
    let first = drain_events(&mut events);
    assert_eq!(recording_changes(&first), vec![true, false]);

    // Stopped is re-armable; the new recording starts from empty chunks and
    // a reset timer
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(session.elapsed_seconds(), 0);

    sleep(Duration::from_millis(1234)).await;
    session.stop().await.unwrap();

    assert_eq!(session.audio_chunks().await.len(), 2);
    let second = drain_events(&mut events);
    assert_eq!(recording_changes(&second), vec![true, false]);
    let blobs = audio_ready(&second);
    assert_eq!(blobs.len(), 1);
    let duration = blobs[0].duration_seconds();
    assert!(
        (1.0..=1.3).contains(&duration),
        "second blob holds only the second recording, got {duration}s"
    );
}

#[tokio::test(start_paused = true)]
async fn full_capture_run_emits_the_expected_event_stream() {
    let (session, mut events) = synthetic_session(test_config());

    // Camera warm-up before the recording begins
    session.ensure_streams().await;
    sleep(Duration::from_millis(200)).await;

    session.start().await.unwrap();
    sleep(Duration::from_millis(4950)).await;

    assert_eq!(session.elapsed_seconds(), 4);
    assert_eq!(session.elapsed_display(), "00:04 / 03:00");

    session.stop().await.unwrap();
    assert_eq!(session.state(), SessionState::Stopped);

    let collected = drain_events(&mut events);

    // Face sampling at 0s, 2s and 4s
    let frames = face_frames(&collected);
    assert_eq!(frames.len(), 3);
    assert!(frames
        .iter()
        .all(|uri| uri.starts_with("data:image/jpeg;base64,")));

    // Four whole-second slices plus the final flush
    assert_eq!(session.audio_chunks().await.len(), 5);

    // The level meter ran alongside the recording
    let levels: Vec<u8> = collected
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::AudioLevel(level) => Some(*level),
            _ => None,
        })
        .collect();
    assert!(!levels.is_empty());

    assert_eq!(recording_changes(&collected), vec![true, false]);
    assert!(matches!(collected.first(), Some(CaptureEvent::RecordingChange(true))));
    assert!(matches!(collected.last(), Some(CaptureEvent::AudioReady(_))));
    assert!(matches!(
        collected[collected.len() - 2],
        CaptureEvent::RecordingChange(false)
    ));

    // The display freezes at the stop point
    assert_eq!(session.elapsed_display(), "00:04 / 03:00");
}

#[tokio::test(start_paused = true)]
async fn stats_reflect_the_session() {
    let (session, mut events) = synthetic_session(test_config());

    let idle = session.stats().await;
    assert_eq!(idle.state, SessionState::Idle);
    assert_eq!(idle.elapsed_seconds, 0);
    assert_eq!(idle.chunks_count, 0);

    session.start().await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    let recording = session.stats().await;
    assert_eq!(recording.state, SessionState::Recording);
    assert_eq!(recording.elapsed_seconds, 2);
    assert_eq!(recording.chunks_count, 2);

    session.stop().await.unwrap();
    drain_events(&mut events);

    let stopped = session.stats().await;
    assert_eq!(stopped.state, SessionState::Stopped);
    assert_eq!(stopped.chunks_count, 3);
}

#[tokio::test(start_paused = true)]
async fn live_metrics_reset_with_each_recording() {
    let (session, mut events) = synthetic_session(test_config());

    session.start().await.unwrap();
    session
        .ingest_face_analysis(
            FacialSignal {
                confident: 0.9,
                stressed: 0.1,
                nervous: 0.3,
            },
            BehaviorSignal {
                blink_count: 2,
                looking_at_camera: true,
                ..BehaviorSignal::default()
            },
        )
        .await;

    let snapshot = session.metrics_snapshot().await;
    assert!((snapshot.facial.confident - 0.9).abs() < 1e-6);
    let summary = session.face_summary().await;
    assert!((summary.avg_confident - 90.0).abs() < 1e-4);
    assert_eq!(summary.blink_count, 2);

    sleep(Duration::from_millis(1100)).await;
    session.stop().await.unwrap();

    // The summary survives the stop for submission alongside the blob
    assert!((session.face_summary().await.avg_confident - 90.0).abs() < 1e-4);

    // A fresh recording starts from neutral priors
    session.start().await.unwrap();
    let summary = session.face_summary().await;
    assert_eq!(summary.avg_confident, 50.0);
    assert_eq!(summary.blink_count, 0);

    session.stop().await.unwrap();
    drain_events(&mut events);
}

#[tokio::test(start_paused = true)]
async fn close_releases_streams_after_stopping() {
    let (session, mut events) = synthetic_session(test_config());

    session.ensure_streams().await;
    session.start().await.unwrap();
    sleep(Duration::from_millis(1100)).await;

    session.close().await.unwrap();

    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.mic_stream_id().await.is_none());
    assert!(session.cam_stream_id().await.is_none());

    let collected = drain_events(&mut events);
    assert_eq!(recording_changes(&collected), vec![true, false]);
    assert_eq!(audio_ready(&collected).len(), 1);
}
